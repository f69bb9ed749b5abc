//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod forms;
pub mod io;
pub mod telemetry;
