//! Constants used throughout the application
//! This module contains the GATT identifiers and default timings used to talk to the bulb.

use uuid::Uuid;

/// Substring every Playbulb puts in its advertised local name
pub const BULB_NAME_PATTERN: &str = "PLAYBULB";

/// The Playbulb color service (16-bit `ff08` on the Bluetooth base UUID)
pub const UUID_COLOR_SERVICE: Uuid = Uuid::from_u128(0x0000ff08_0000_1000_8000_00805f9b34fb);

/// The characteristic holding the current color, written and read back
pub const UUID_COLOR_CHAR: Uuid = Uuid::from_u128(0x0000fffc_0000_1000_8000_00805f9b34fb);

/// The effect characteristic. Resolved alongside the color characteristic but not used by
/// color operations.
pub const UUID_EFFECT_CHAR: Uuid = Uuid::from_u128(0x0000fffb_0000_1000_8000_00805f9b34fb);

/// Time allowed to find a matching advertisement, in milliseconds
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 2000;

/// Grace period between a color write and its read-back, in milliseconds
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 100;

/// Pause between the steps of a blink, in milliseconds
pub const DEFAULT_BLINK_TIME_MS: u64 = 200;

/// Color payload size in bytes: [mode/white, red, green, blue]
pub const COLOR_PACKET_SIZE: usize = 4;
