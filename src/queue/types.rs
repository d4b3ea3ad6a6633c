/// What happened to a queue's consumers on stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Consumers that finished draining on their own.
    pub drained_consumers: usize,
    /// Consumers aborted because the grace period ran out.
    pub aborted_consumers: usize,
    /// Consumers whose task panicked.
    pub panicked_consumers: usize,
}
