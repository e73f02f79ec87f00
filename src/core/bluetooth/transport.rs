//! BLE transport capability
//! The protocol logic only talks to the radio through [`BleTransport`], so it can run
//! against bluest on real hardware or against a simulated bulb in tests.

use std::future::ready;
use std::sync::LazyLock;

use async_trait::async_trait;
use bluest::{Adapter, AdapterEvent, Characteristic, Device, Service};
use futures_util::{FutureExt, StreamExt};
use futures_util::stream::BoxStream;
use log::{debug, info, warn};
use regex::Regex;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::types::{AdvertisedDevice, DeviceSession, GattAttribute, RadioState};
use crate::error::TransportError;

/// Stream of advertisements produced while a scan is running
pub type AdvertisementStream<'a, P> = BoxStream<'a, AdvertisedDevice<P>>;

/// Session type produced for a given transport
pub type SessionOf<T> =
    DeviceSession<<T as BleTransport>::Peripheral, <T as BleTransport>::Characteristic>;

/// Operations the bulb protocol needs from a BLE stack
#[async_trait]
pub trait BleTransport: Send + Sync {
    type Peripheral: Clone + Send + Sync + 'static;
    type Service: GattAttribute + Clone + Send + Sync + 'static;
    type Characteristic: GattAttribute + Clone + Send + Sync + 'static;

    /// Current power state of the radio
    async fn radio_state(&self) -> Result<RadioState, TransportError>;

    /// Power state transitions, delivered as they happen
    async fn radio_state_changes(&self) -> Result<BoxStream<'_, RadioState>, TransportError>;

    /// Starts a passive scan and yields every advertisement seen
    async fn scan_for_advertisements(
        &self,
    ) -> Result<AdvertisementStream<'_, Self::Peripheral>, TransportError>;

    /// Stops the running scan. Calling it when no scan is running is a no-op.
    async fn stop_scanning(&self) -> Result<(), TransportError>;

    async fn connect(&self, peripheral: &Self::Peripheral) -> Result<(), TransportError>;

    async fn disconnect(&self, peripheral: &Self::Peripheral) -> Result<(), TransportError>;

    async fn discover_services(
        &self,
        peripheral: &Self::Peripheral,
        ids: &[Uuid],
    ) -> Result<Vec<Self::Service>, TransportError>;

    async fn discover_characteristics(
        &self,
        service: &Self::Service,
        ids: &[Uuid],
    ) -> Result<Vec<Self::Characteristic>, TransportError>;

    /// Writes `bytes`, waiting for the peripheral's acknowledgement when `with_response` is set
    async fn write(
        &self,
        characteristic: &Self::Characteristic,
        bytes: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError>;

    async fn read(&self, characteristic: &Self::Characteristic) -> Result<Vec<u8>, TransportError>;
}

impl GattAttribute for Service {
    fn uuid(&self) -> Uuid {
        Service::uuid(self)
    }
}

impl GattAttribute for Characteristic {
    fn uuid(&self) -> Uuid {
        Characteristic::uuid(self)
    }
}

/// [`BleTransport`] backed by the platform Bluetooth stack through bluest
pub struct BluestTransport {
    adapter: Adapter,
    scan_token: Mutex<CancellationToken>,
}

impl BluestTransport {
    /// Opens the default Bluetooth adapter
    pub async fn new() -> Result<Self, TransportError> {
        let adapter = Adapter::default()
            .await
            .ok_or(TransportError::NoAdapter)?;
        info!("Bluetooth adapter opened.");
        Ok(Self {
            adapter,
            scan_token: Mutex::new(CancellationToken::new()),
        })
    }

    fn advertised_address(device: &Device) -> String {
        let id = device.id().to_string();
        extract_mac_address(&id).unwrap_or(id)
    }
}

#[async_trait]
impl BleTransport for BluestTransport {
    type Peripheral = Device;
    type Service = Service;
    type Characteristic = Characteristic;

    /// Powered on only when `wait_available` resolves without waiting; later transitions
    /// arrive through `radio_state_changes`.
    async fn radio_state(&self) -> Result<RadioState, TransportError> {
        Ok(radio_state_from(self.adapter.wait_available().now_or_never()))
    }

    async fn radio_state_changes(&self) -> Result<BoxStream<'_, RadioState>, TransportError> {
        let events = self.adapter.events().await?;
        Ok(events
            .filter_map(|event| {
                ready(match event {
                    Ok(AdapterEvent::Available) => Some(RadioState::PoweredOn),
                    Ok(_) => Some(RadioState::PoweredOff),
                    Err(e) => {
                        warn!("Error in adapter event stream: {}", e);
                        None
                    }
                })
            })
            .boxed())
    }

    async fn scan_for_advertisements(
        &self,
    ) -> Result<AdvertisementStream<'_, Device>, TransportError> {
        let token = {
            let mut guard = self.scan_token.lock().await;
            guard.cancel();
            *guard = CancellationToken::new();
            guard.clone()
        };

        info!("Starting bluetooth scan");
        let scan_stream = self.adapter.scan(&[]).await?;
        Ok(scan_stream
            .take_until(token.cancelled_owned())
            .map(|discovered| {
                let address = Self::advertised_address(&discovered.device);
                debug!(
                    "Found device - Address: {}, Name: {:?}, RSSI: {:?}",
                    address, discovered.adv_data.local_name, discovered.rssi
                );
                AdvertisedDevice::new(
                    discovered.device,
                    discovered.adv_data.local_name,
                    address,
                    discovered.rssi,
                )
            })
            .boxed())
    }

    async fn stop_scanning(&self) -> Result<(), TransportError> {
        let guard = self.scan_token.lock().await;
        if !guard.is_cancelled() {
            info!("Stopping Bluetooth scan.");
            guard.cancel();
        }
        Ok(())
    }

    async fn connect(&self, peripheral: &Device) -> Result<(), TransportError> {
        if peripheral.is_connected().await {
            info!("Device {} already connected.", peripheral.id());
            return Ok(());
        }
        info!("Initiating connection to {}...", peripheral.id());
        self.adapter.connect_device(peripheral).await?;
        Ok(())
    }

    async fn disconnect(&self, peripheral: &Device) -> Result<(), TransportError> {
        if peripheral.is_connected().await {
            info!("Disconnecting from device {}", peripheral.id());
            self.adapter.disconnect_device(peripheral).await?;
        } else {
            info!("Device {} not connected", peripheral.id());
        }
        Ok(())
    }

    async fn discover_services(
        &self,
        peripheral: &Device,
        ids: &[Uuid],
    ) -> Result<Vec<Service>, TransportError> {
        let mut services = Vec::new();
        for id in ids {
            services.extend(peripheral.discover_services_with_uuid(*id).await?);
        }
        Ok(services)
    }

    async fn discover_characteristics(
        &self,
        service: &Service,
        ids: &[Uuid],
    ) -> Result<Vec<Characteristic>, TransportError> {
        let mut characteristics = Vec::new();
        for id in ids {
            characteristics.extend(service.discover_characteristics_with_uuid(*id).await?);
        }
        Ok(characteristics)
    }

    async fn write(
        &self,
        characteristic: &Characteristic,
        bytes: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        if with_response {
            characteristic.write(bytes).await?;
        } else {
            characteristic.write_without_response(bytes).await?;
        }
        Ok(())
    }

    async fn read(&self, characteristic: &Characteristic) -> Result<Vec<u8>, TransportError> {
        Ok(characteristic.read().await?)
    }
}

/// Maps a single poll of the adapter's availability future to a radio state
fn radio_state_from<E: std::fmt::Display>(ready: Option<Result<(), E>>) -> RadioState {
    match ready {
        Some(Ok(())) => RadioState::PoweredOn,
        Some(Err(e)) => {
            warn!("Bluetooth adapter unavailable: {}", e);
            RadioState::PoweredOff
        }
        None => RadioState::PoweredOff,
    }
}

static MAC_ADDRESS_REGEXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("MAC address pattern is valid")
});

/// Pulls the last MAC address out of a platform device id
fn extract_mac_address(device_id_str: &str) -> Option<String> {
    MAC_ADDRESS_REGEXP
        .find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
