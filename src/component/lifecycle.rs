use crate::component::error::{ComponentError, ComponentResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl LifecycleState {
    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Stopped)
    }

    /// Whether data may still be handed to the component.
    pub fn accepts_data(&self) -> bool {
        matches!(
            self,
            LifecycleState::Created | LifecycleState::Starting | LifecycleState::Running
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Started,
    StartFailed,
    Shutdown,
    Stopped,
}

/// Tracks where a component is in its start/shutdown lifecycle.
pub struct LifecycleStateMachine {
    state: Arc<RwLock<LifecycleState>>,
}

impl Default for LifecycleStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleStateMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LifecycleState::Created)),
        }
    }

    pub fn current_state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Transition state based on event
    pub fn transition(&self, event: LifecycleEvent) -> ComponentResult<LifecycleState> {
        let mut state = self.state.write();

        let new_state = match (*state, event) {
            (LifecycleState::Created, LifecycleEvent::Start) => LifecycleState::Starting,
            (LifecycleState::Starting, LifecycleEvent::Started) => LifecycleState::Running,

            // A component that failed to start may still be shut down
            (LifecycleState::Starting, LifecycleEvent::StartFailed) => LifecycleState::Created,

            (
                LifecycleState::Created | LifecycleState::Starting | LifecycleState::Running,
                LifecycleEvent::Shutdown,
            ) => LifecycleState::Stopping,
            (LifecycleState::Stopping, LifecycleEvent::Stopped) => LifecycleState::Stopped,

            (from, event) => {
                return Err(ComponentError::InvalidStateTransition(format!(
                    "Cannot handle {event:?} in state {from:?}"
                )));
            }
        };

        *state = new_state;
        Ok(new_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let sm = LifecycleStateMachine::new();
        assert_eq!(sm.current_state(), LifecycleState::Created);

        sm.transition(LifecycleEvent::Start).unwrap();
        assert_eq!(
            sm.transition(LifecycleEvent::Started).unwrap(),
            LifecycleState::Running
        );
        assert!(sm.current_state().is_running());

        sm.transition(LifecycleEvent::Shutdown).unwrap();
        assert!(!sm.current_state().accepts_data());
        assert_eq!(
            sm.transition(LifecycleEvent::Stopped).unwrap(),
            LifecycleState::Stopped
        );
        assert!(sm.current_state().is_terminal());
    }

    #[test]
    fn test_cannot_start_twice() {
        let sm = LifecycleStateMachine::new();
        sm.transition(LifecycleEvent::Start).unwrap();
        sm.transition(LifecycleEvent::Started).unwrap();

        let result = sm.transition(LifecycleEvent::Start);
        assert!(matches!(
            result,
            Err(ComponentError::InvalidStateTransition(_))
        ));
        assert_eq!(sm.current_state(), LifecycleState::Running);
    }

    #[test]
    fn test_failed_start_returns_to_created() {
        let sm = LifecycleStateMachine::new();
        sm.transition(LifecycleEvent::Start).unwrap();
        sm.transition(LifecycleEvent::StartFailed).unwrap();
        assert_eq!(sm.current_state(), LifecycleState::Created);

        // Shutdown without ever running is allowed
        sm.transition(LifecycleEvent::Shutdown).unwrap();
        sm.transition(LifecycleEvent::Stopped).unwrap();
    }

    #[test]
    fn test_stopped_is_final() {
        let sm = LifecycleStateMachine::new();
        sm.transition(LifecycleEvent::Shutdown).unwrap();
        sm.transition(LifecycleEvent::Stopped).unwrap();

        assert!(sm.transition(LifecycleEvent::Start).is_err());
        assert!(sm.transition(LifecycleEvent::Shutdown).is_err());
    }
}
