//! # Runtime
//!
//! Process startup, the cycle scheduler and signal handling.

pub mod initialization;
pub mod scheduler;
pub mod shutdown;

pub use initialization::*;
pub use scheduler::run_scheduler;
pub use shutdown::{listen_for_signals, Shutdown};
