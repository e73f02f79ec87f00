//! Core functionality for the Playbulb controller
//! This module contains the color model and the Bluetooth protocol client.

pub mod bluetooth;
pub mod color;

// Re-export commonly used types
pub use bluetooth::BluetoothManager;
pub use color::{ColorSource, ColorValue, Preset};
