//! Error types for bulb operations
//! Every failure is terminal for the invocation; `exit_code` maps it to the process outcome.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::core::color::ColorValue;

/// Exit code for a confirmed color operation
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for connection, write, read, verification and usage failures
pub const EXIT_FAILURE: u8 = 1;
/// Exit code when no bulb was found in time
pub const EXIT_DISCOVERY_TIMEOUT: u8 = 2;

/// Failures reported by the underlying BLE stack
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error(transparent)]
    Bluest(#[from] bluest::Error),
    #[error("{0}")]
    Failed(String),
}

/// The step of session setup that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStage {
    Connect,
    ServiceDiscovery,
    CharacteristicDiscovery,
}

impl fmt::Display for ConnectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::ServiceDiscovery => "service discovery",
            Self::CharacteristicDiscovery => "characteristic discovery",
        })
    }
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to connect to playbulb {device}: {source}")]
    Connect {
        device: String,
        #[source]
        source: TransportError,
    },
    #[error("Failed to get services: {0}")]
    ServiceDiscovery(#[source] TransportError),
    #[error("Color service {0} not found")]
    ServiceNotFound(Uuid),
    #[error("Failed to get characteristics: {0}")]
    CharacteristicDiscovery(#[source] TransportError),
    #[error("Color characteristic {0} not found")]
    CharacteristicNotFound(Uuid),
}

impl ConnectionError {
    pub fn stage(&self) -> ConnectionStage {
        match self {
            Self::Connect { .. } => ConnectionStage::Connect,
            Self::ServiceDiscovery(_) | Self::ServiceNotFound(_) => {
                ConnectionStage::ServiceDiscovery
            }
            Self::CharacteristicDiscovery(_) | Self::CharacteristicNotFound(_) => {
                ConnectionStage::CharacteristicDiscovery
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum BulbError {
    #[error("Timed out finding the Playbulb after {timeout:?} (name pattern {pattern:?})")]
    DiscoveryTimeout { timeout: Duration, pattern: String },
    #[error("Discovery was cancelled")]
    DiscoveryCancelled,
    #[error("Scanning failed: {0}")]
    Scan(#[source] TransportError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Failed to write color {color}: {source}")]
    Write {
        color: ColorValue,
        #[source]
        source: TransportError,
    },
    #[error("Failed to read color: {0}")]
    Read(#[source] TransportError),
    #[error("Failed to set color: wrote {expected}, read back {}", hex_bytes(.actual))]
    VerificationMismatch { expected: ColorValue, actual: Vec<u8> },
    #[error("Device reported a malformed color {}", hex_bytes(.0))]
    MalformedColor(Vec<u8>),
    #[error("{0}")]
    Usage(String),
}

impl BulbError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DiscoveryTimeout { .. } => EXIT_DISCOVERY_TIMEOUT,
            _ => EXIT_FAILURE,
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
