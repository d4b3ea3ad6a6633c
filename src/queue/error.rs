use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is full (capacity: {0})")]
    QueueFull(usize),

    #[error("Queue is stopped")]
    Stopped,

    #[error("Consumers already started")]
    AlreadyStarted,
}

pub type QueueResult<T> = Result<T, QueueError>;
