pub mod clock;
pub mod config;
pub mod container;
pub mod dataset;
pub mod error;
pub mod leaderboard;
pub mod round;

pub use clock::SystemClock;
// config is accessed as crate::models::config::{load_config, save_config, ...}
pub use container::{classify, Container};
pub use error::{GameError, StateError};
pub use leaderboard::{CsvLeaderboard, Leaderboard, LeaderboardRecord};
pub use round::{EndReason, Placement, Round, Status};
