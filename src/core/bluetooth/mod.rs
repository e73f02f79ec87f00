//! Bluetooth functionality for the Playbulb controller
//! This module handles all bluetooth operations including scanning,
//! connecting, and reading and writing the bulb's color.

mod connection;
mod constants;
mod manager;
mod scanner;
mod sequencer;
mod transport;
mod types;
mod writer;

#[cfg(test)]
pub(crate) mod simulated;

// Re-export types that should be publicly accessible
pub use connection::ConnectionManager;
pub use constants::*; // Re-export all constants
pub use manager::BluetoothManager;
pub use scanner::BluetoothScanner;
pub use sequencer::{BlinkSequencer, BlinkState};
pub use transport::{AdvertisementStream, BleTransport, BluestTransport, SessionOf};
pub use types::{AdvertisedDevice, DeviceSession, GattAttribute, RadioState};
pub use writer::ColorWriter;
