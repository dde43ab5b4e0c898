//! Domain model module declarations.

pub mod outcome;
pub mod status;

pub use outcome::{LifecycleAction, LifecycleOutcome, ProcessDescription};
pub use status::ProcessStatus;
