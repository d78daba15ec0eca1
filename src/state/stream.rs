// Camera request bookkeeping. Each getUserMedia call takes a ticket; a stream
// that resolves with a stale ticket belongs to nobody and must be stopped.

#[derive(Clone, Copy, Debug, Default)]
pub struct StreamRequests {
    generation: u64,
}

impl StreamRequests {
    /// Start a new request, superseding any in flight.
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Invalidate whatever is in flight (facing change or unmount).
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.generation
    }
}
