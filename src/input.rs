use crate::error::SessionError;
use crate::selection::Direction;

/// The four things a user can do to a launcher session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Full search text after the edit.
    TextChanged(String),
    Move(Direction),
    Cancel,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Terminated,
}

/// One-shot state machine: `Idle` until cancel or confirm, then
/// `Terminated` for good.
#[derive(Debug)]
pub struct InputResolver {
    phase: Phase,
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl InputResolver {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Accepts an event while idle. Cancel and confirm terminate before the
    /// caller acts on them, so a failed launch cannot leave the session open.
    pub fn accept(&mut self, event: InputEvent) -> Result<InputEvent, SessionError> {
        if self.phase == Phase::Terminated {
            return Err(SessionError::Terminated);
        }
        if matches!(event, InputEvent::Cancel | InputEvent::Confirm) {
            self.phase = Phase::Terminated;
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_and_moving_stay_idle() {
        let mut resolver = InputResolver::new();
        resolver.accept(InputEvent::TextChanged("fi".to_string())).unwrap();
        resolver.accept(InputEvent::Move(Direction::Next)).unwrap();
        assert_eq!(resolver.phase(), Phase::Idle);
    }

    #[test]
    fn cancel_and_confirm_terminate() {
        for event in [InputEvent::Cancel, InputEvent::Confirm] {
            let mut resolver = InputResolver::new();
            assert_eq!(resolver.accept(event.clone()), Ok(event));
            assert_eq!(resolver.phase(), Phase::Terminated);
        }
    }

    #[test]
    fn nothing_is_accepted_after_termination() {
        let mut resolver = InputResolver::new();
        resolver.accept(InputEvent::Cancel).unwrap();
        assert_eq!(resolver.accept(InputEvent::TextChanged(String::new())), Err(SessionError::Terminated));
        assert_eq!(resolver.accept(InputEvent::Confirm), Err(SessionError::Terminated));
        assert_eq!(resolver.phase(), Phase::Terminated);
    }
}
