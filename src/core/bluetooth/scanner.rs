//! Discovery of the bulb by advertised name
//! The first advertisement whose name matches wins; the scan is bounded by a deadline.

use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use regex::Regex;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::transport::BleTransport;
use crate::core::bluetooth::types::{AdvertisedDevice, RadioState};
use crate::error::{BulbError, TransportError};

pub struct BluetoothScanner<'a, T: BleTransport> {
    transport: &'a T,
    cancel_token: CancellationToken,
}

impl<'a, T: BleTransport> BluetoothScanner<'a, T> {
    pub fn new(transport: &'a T, cancel_token: CancellationToken) -> Self {
        Self {
            transport,
            cancel_token,
        }
    }

    /// Waits for the first advertisement named like `name_pattern`.
    ///
    /// The deadline is fixed before anything else happens, so time spent waiting for the radio
    /// to power on counts against `timeout`. Whichever of match, deadline or cancellation
    /// comes first decides the outcome, and scanning is stopped exactly once afterwards.
    pub async fn discover(
        &self,
        name_pattern: &Regex,
        timeout: Duration,
    ) -> Result<AdvertisedDevice<T::Peripheral>, BulbError> {
        let deadline = Instant::now() + timeout;

        let outcome = tokio::select! {
            found = self.scan_until_match(name_pattern) => found,
            _ = sleep_until(deadline) => {
                warn!("Timed out finding the Playbulb.");
                Err(BulbError::DiscoveryTimeout {
                    timeout,
                    pattern: name_pattern.as_str().to_string(),
                })
            }
            _ = self.cancel_token.cancelled() => {
                info!("Discovery cancelled.");
                Err(BulbError::DiscoveryCancelled)
            }
        };

        if let Err(e) = self.transport.stop_scanning().await {
            warn!("Failed to stop scanning: {}", e);
        }

        if let Ok(device) = &outcome {
            info!(
                "Found Playbulb device: Address: {}, Name: {:?}, RSSI: {:?}",
                device.address, device.name, device.rssi
            );
        }
        outcome
    }

    async fn scan_until_match(
        &self,
        name_pattern: &Regex,
    ) -> Result<AdvertisedDevice<T::Peripheral>, BulbError> {
        let mut radio_states = self
            .transport
            .radio_state_changes()
            .await
            .map_err(BulbError::Scan)?
            .fuse();
        let mut radio = self.transport.radio_state().await.map_err(BulbError::Scan)?;

        loop {
            while radio != RadioState::PoweredOn {
                info!("Bluetooth radio is {:?}, waiting for it to power on", radio);
                radio = radio_states.next().await.ok_or_else(|| {
                    BulbError::Scan(TransportError::Failed(
                        "radio state notifications ended".to_string(),
                    ))
                })?;
            }

            let mut advertisements = self
                .transport
                .scan_for_advertisements()
                .await
                .map_err(BulbError::Scan)?;

            loop {
                tokio::select! {
                    advertisement = advertisements.next() => {
                        let Some(device) = advertisement else {
                            return Err(BulbError::Scan(TransportError::Failed(
                                "advertisement stream ended".to_string(),
                            )));
                        };
                        if Self::is_bulb(&device, name_pattern) {
                            return Ok(device);
                        }
                        debug!("Ignoring device {} ({:?})", device.address, device.name);
                    }
                    Some(state) = radio_states.next() => {
                        radio = state;
                        if radio != RadioState::PoweredOn {
                            info!("Bluetooth radio powered off, stopping scan");
                            self.transport.stop_scanning().await.map_err(BulbError::Scan)?;
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Returns true if the advertised name matches. Nameless advertisements never match.
    fn is_bulb(device: &AdvertisedDevice<T::Peripheral>, name_pattern: &Regex) -> bool {
        device
            .name
            .as_deref()
            .map(|name| name_pattern.is_match(name))
            .unwrap_or(false)
    }
}
