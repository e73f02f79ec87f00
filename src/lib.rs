//! Playbulb controller library
//! Finds a MIPOW Playbulb over Bluetooth LE and changes or blinks its color,
//! verifying every change by reading it back.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use commands::{Command, Invocation};
pub use config::BulbConfig;
pub use error::BulbError;
