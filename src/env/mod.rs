pub mod base;
pub mod gridworld;
pub mod scripted;
pub mod wrappers;
