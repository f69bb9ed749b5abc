//! Application services layer.

pub mod error;
pub mod forms;
pub mod render;
pub mod repos;
