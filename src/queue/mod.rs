pub mod bounded;
pub mod error;
pub mod types;

pub use bounded::BoundedQueue;
pub use error::{QueueError, QueueResult};
pub use types::StopReport;
