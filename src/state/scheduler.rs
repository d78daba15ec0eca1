// Refresh-synchronised render loop state. The host owns the actual
// requestAnimationFrame handle; this only decides when to ask for one.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
    Suspended,
}

#[derive(Clone, Debug, Default)]
pub struct RenderScheduler {
    state: SchedulerState,
    /// A frame callback has been requested and has not run yet.
    pending: bool,
    /// Set once the loop has been torn down or failed; never restarts.
    halted: bool,
    visible: bool,
}

impl RenderScheduler {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Video reported "playing". Returns true when a frame should be requested.
    pub fn on_playing(&mut self) -> bool {
        if self.halted || self.state != SchedulerState::Stopped {
            return false;
        }
        if self.visible {
            self.state = SchedulerState::Running;
            log::info!("render loop running");
            self.request()
        } else {
            self.state = SchedulerState::Suspended;
            false
        }
    }

    /// Returns true when a frame should be requested.
    pub fn on_visibility(&mut self, visible: bool) -> bool {
        self.visible = visible;
        match (self.state, visible) {
            (SchedulerState::Running, false) => {
                self.state = SchedulerState::Suspended;
                log::info!("render loop suspended");
                false
            }
            (SchedulerState::Suspended, true) => {
                self.state = SchedulerState::Running;
                log::info!("render loop resumed");
                self.request()
            }
            _ => false,
        }
    }

    /// Called at the start of a frame callback. Returns whether to draw.
    /// A tick already in flight when the page was hidden still draws once.
    pub fn begin_tick(&mut self) -> bool {
        let was_pending = std::mem::replace(&mut self.pending, false);
        was_pending && self.state != SchedulerState::Stopped
    }

    /// Called after drawing. Returns true when the next frame should be requested.
    pub fn end_tick(&mut self) -> bool {
        if self.state == SchedulerState::Running {
            self.request()
        } else {
            false
        }
    }

    /// Unrecoverable failure or teardown. Returns true on the transition into
    /// `Stopped`, so the caller releases the camera exactly once.
    pub fn stop(&mut self) -> bool {
        let was_live = self.state != SchedulerState::Stopped;
        self.state = SchedulerState::Stopped;
        self.pending = false;
        self.halted = true;
        if was_live {
            log::info!("render loop stopped");
        }
        was_live
    }

    fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }
}
