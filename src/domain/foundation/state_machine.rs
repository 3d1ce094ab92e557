//! State machine trait for status enums.
//!
//! Gives lifecycle statuses a single validated transition path, so no code
//! path can move a record between states the transition table does not
//! allow.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum InvoiceStatus {
        Draft,
        Open,
        Paid,
        Void,
    }

    impl StateMachine for InvoiceStatus {
        fn can_transition_to(&self, target: &Self) -> bool {
            use InvoiceStatus::*;
            matches!(
                (self, target),
                (Draft, Open) | (Open, Paid) | (Open, Void) | (Draft, Void)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use InvoiceStatus::*;
            match self {
                Draft => vec![Open, Void],
                Open => vec![Paid, Void],
                Paid => vec![],
                Void => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        let result = InvoiceStatus::Draft.transition_to(InvoiceStatus::Open);
        assert_eq!(result, Ok(InvoiceStatus::Open));
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        let result = InvoiceStatus::Draft.transition_to(InvoiceStatus::Paid);
        assert!(result.is_err());
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(InvoiceStatus::Void.is_terminal());
        assert!(!InvoiceStatus::Open.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Open,
            InvoiceStatus::Paid,
            InvoiceStatus::Void,
        ] {
            for valid_target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&valid_target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    valid_target
                );
            }
        }
    }
}
