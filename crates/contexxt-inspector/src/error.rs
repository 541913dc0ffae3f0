use thiserror::Error;

use crate::popover::{PopoverPhase, SessionId};

#[derive(Debug, Error)]
pub enum PopoverError {
    #[error("Popover is not visible (phase: {phase})")]
    NotVisible { phase: PopoverPhase },

    #[error("Session {session} is no longer live")]
    StaleSession { session: SessionId },

    #[error("Mount of session {0} was superseded by a newer one")]
    Superseded(SessionId),
}
