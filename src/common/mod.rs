pub mod callback;
pub mod cancel;
pub mod logger;
pub mod spaces;
pub mod timer;
