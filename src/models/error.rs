use thiserror::Error;

use super::round::Status;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    /// Rejected input such as an empty player name
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Operation not allowed in the round's current state
    #[error("{0}")]
    State(#[from] StateError),

    /// Leaderboard or config persistence failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Round is not running (status: {0})")]
    NotRunning(Status),

    #[error("'{0}' is not in the available pool")]
    TokenUnavailable(String),
}
