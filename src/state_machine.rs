// Copyright 2025 Cowboy AI, LLC.

//! Enum-based state machines for record lifecycles
//!
//! Irrigation schedules and fertilization records move through a small,
//! forward-only set of statuses. Each status enum implements [`State`]
//! and [`StateTransitions`]; the lifecycle services derive the allowed
//! source set for a conditional store update from the same table, so the
//! transition rules live in exactly one place.

use crate::errors::{DomainError, DomainResult};
use std::fmt::Debug;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Copy + PartialEq + Eq + Send + Sync + 'static {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Transition table for a state enum
///
/// # Examples
///
/// ```rust
/// use smart_agri_core::{State, StateTransitions};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Valve {
///     Closed,
///     Open,
///     Jammed,
/// }
///
/// impl State for Valve {
///     fn name(&self) -> &'static str {
///         match self {
///             Valve::Closed => "closed",
///             Valve::Open => "open",
///             Valve::Jammed => "jammed",
///         }
///     }
///
///     fn is_terminal(&self) -> bool {
///         matches!(self, Valve::Jammed)
///     }
/// }
///
/// impl StateTransitions for Valve {
///     const ALL: &'static [Self] = &[Valve::Closed, Valve::Open, Valve::Jammed];
///
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Valve::Closed, Valve::Open) | (Valve::Open, Valve::Closed) | (_, Valve::Jammed)
///         ) && !self.is_terminal()
///     }
/// }
///
/// assert!(Valve::Closed.can_transition_to(&Valve::Open));
/// assert_eq!(Valve::sources_for(&Valve::Open), vec![Valve::Closed]);
/// assert!(Valve::Jammed.ensure_transition(&Valve::Open).is_err());
/// ```
pub trait StateTransitions: State + Sized {
    /// Every state of the machine, in declaration order
    const ALL: &'static [Self];

    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .filter(|target| self.can_transition_to(target))
            .copied()
            .collect()
    }

    /// States from which `target` may be entered
    fn sources_for(target: &Self) -> Vec<Self> {
        Self::ALL
            .iter()
            .filter(|source| source.can_transition_to(target))
            .copied()
            .collect()
    }

    /// Reject the transition with an explicit conflict error
    fn ensure_transition(&self, target: &Self) -> DomainResult<()> {
        if self.is_terminal() || !self.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.name().to_string(),
                to: target.name().to_string(),
            });
        }
        Ok(())
    }
}

/// Build the conflict error for a rejected conditional update
pub fn rejected_transition<S: State>(current: S, target: S) -> DomainError {
    DomainError::InvalidStateTransition {
        from: current.name().to_string(),
        to: target.name().to_string(),
    }
}
