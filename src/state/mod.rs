pub mod controller;
pub mod gesture;
pub mod scheduler;
pub mod stream;
pub mod viewport;

pub use controller::{OverlayController, TickOutcome};
pub use stream::StreamRequests;
pub use viewport::ResizeDebouncer;
