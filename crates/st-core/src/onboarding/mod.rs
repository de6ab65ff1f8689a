//! Onboarding wizard state machine.
//!
//! Defines a pure state transition function for the onboarding flow. The
//! application layer executes the returned actions (debounced persistence,
//! completion marking); the machine itself has no side effects.

mod completion;

pub use completion::{
    fact_index_at, progress_percent_at, COMPLETION_DURATION_MS, COMPLETION_HOLD_MS, CYCLE_FACTS,
    FACT_ROTATE_INTERVAL_MS,
};

/// Number of data-collection steps. The intro step sits below them at `-1`.
pub const TOTAL_STEPS: i8 = 5;

/// Cursor value of the introductory step.
pub const INTRO_STEP: i8 = -1;

/// Cursor value of the last data-collection step.
pub const LAST_STEP: i8 = TOTAL_STEPS - 1;

/// Wizard flow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WizardState {
    /// Showing the step at the given cursor, `-1..=4`.
    AtStep(i8),
    /// Terminal progress animation, non-interruptible.
    Completing,
    /// Onboarding finished.
    Complete,
}

impl WizardState {
    pub fn cursor(&self) -> Option<i8> {
        match self {
            WizardState::AtStep(cursor) => Some(*cursor),
            _ => None,
        }
    }
}

/// Events that drive the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    Next,
    Back,
    Skip,
    /// The fixed-duration completion animation ran to its end.
    AnimationFinished,
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    /// Schedule a debounced write of the cursor to the profile store.
    PersistStep(i8),
    /// Set `completed_onboarding` and clear the stored step, exactly once.
    MarkComplete,
}

/// Pure wizard state machine.
pub struct WizardStateMachine;

impl WizardStateMachine {
    pub fn transition(state: WizardState, event: WizardEvent) -> (WizardState, Vec<WizardAction>) {
        match (state, event) {
            (WizardState::AtStep(cursor), WizardEvent::Next) => {
                if cursor < LAST_STEP {
                    (
                        WizardState::AtStep(cursor + 1),
                        vec![WizardAction::PersistStep(cursor + 1)],
                    )
                } else {
                    (WizardState::Completing, Vec::new())
                }
            }
            (WizardState::AtStep(cursor), WizardEvent::Back) => {
                if cursor > INTRO_STEP {
                    (
                        WizardState::AtStep(cursor - 1),
                        vec![WizardAction::PersistStep(cursor - 1)],
                    )
                } else {
                    (WizardState::AtStep(INTRO_STEP), Vec::new())
                }
            }
            (WizardState::AtStep(_), WizardEvent::Skip) => (WizardState::Completing, Vec::new()),
            (WizardState::Completing, WizardEvent::AnimationFinished) => {
                (WizardState::Complete, vec![WizardAction::MarkComplete])
            }
            // Completing is non-interruptible and Complete is terminal.
            (state, _event) => (state, Vec::new()),
        }
    }
}
