pub mod common;
pub mod env;
pub mod play;

pub use play::{play_random, PlayConfig, PlayError, PlaySummary, RandomPlayer};
