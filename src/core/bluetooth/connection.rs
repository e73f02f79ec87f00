//! Bluetooth connection handling for the Playbulb
//! This module connects to a discovered bulb and resolves its color characteristic.

use log::{debug, info, warn};

use crate::core::bluetooth::constants::{UUID_COLOR_CHAR, UUID_COLOR_SERVICE, UUID_EFFECT_CHAR};
use crate::core::bluetooth::transport::{BleTransport, SessionOf};
use crate::core::bluetooth::types::{AdvertisedDevice, DeviceSession, GattAttribute};
use crate::error::ConnectionError;

/// Connection manager for the bulb
pub struct ConnectionManager<'a, T: BleTransport> {
    transport: &'a T,
}

impl<'a, T: BleTransport> ConnectionManager<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Connects and resolves the color characteristic. Single attempt, no retry.
    pub async fn open(
        &self,
        device: AdvertisedDevice<T::Peripheral>,
    ) -> Result<SessionOf<T>, ConnectionError> {
        let AdvertisedDevice {
            peripheral,
            name,
            address,
            ..
        } = device;
        info!("Device details - Address: {}, Name: {:?}", address, name);

        self.transport
            .connect(&peripheral)
            .await
            .map_err(|source| ConnectionError::Connect {
                device: address.clone(),
                source,
            })?;

        info!("Connection successful, discovering services...");
        let services = self
            .transport
            .discover_services(&peripheral, &[UUID_COLOR_SERVICE])
            .await
            .map_err(ConnectionError::ServiceDiscovery)?;
        let color_service = services
            .into_iter()
            .find(|s| s.uuid() == UUID_COLOR_SERVICE)
            .ok_or(ConnectionError::ServiceNotFound(UUID_COLOR_SERVICE))?;

        info!("Found color service: {}", color_service.uuid());

        let mut color_char_opt = None;
        let mut effect_char_opt = None;

        for characteristic in self
            .transport
            .discover_characteristics(&color_service, &[UUID_COLOR_CHAR, UUID_EFFECT_CHAR])
            .await
            .map_err(ConnectionError::CharacteristicDiscovery)?
        {
            let uuid = characteristic.uuid();
            if uuid == UUID_COLOR_CHAR {
                info!("Found color characteristic: {}", uuid);
                color_char_opt = Some(characteristic);
            } else if uuid == UUID_EFFECT_CHAR {
                debug!("Found effect characteristic: {}", uuid);
                effect_char_opt = Some(characteristic);
            }
        }

        let color_characteristic =
            color_char_opt.ok_or(ConnectionError::CharacteristicNotFound(UUID_COLOR_CHAR))?;
        if effect_char_opt.is_none() {
            warn!("Effect characteristic {} not found", UUID_EFFECT_CHAR);
        }

        Ok(DeviceSession {
            peripheral,
            address,
            color_characteristic,
            effect_characteristic: effect_char_opt,
        })
    }

    /// Disconnects the session's peripheral. The session is consumed and cannot be reused.
    pub async fn close(&self, session: SessionOf<T>) {
        match self.transport.disconnect(&session.peripheral).await {
            Ok(()) => info!("Successfully disconnected from {}", session.address),
            Err(e) => warn!("Failed to disconnect from {}: {}", session.address, e),
        }
    }
}
