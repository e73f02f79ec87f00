//! Defines shared data structures for the Bluetooth module.

use uuid::Uuid;

/// Power state of the local Bluetooth radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    PoweredOn,
    PoweredOff,
}

/// A peripheral seen while scanning. Only lives until a session is opened on it.
#[derive(Debug, Clone)]
pub struct AdvertisedDevice<P> {
    /// Transport handle used to connect
    pub peripheral: P,
    /// The advertised local name, if the advertisement carried one
    pub name: Option<String>,
    /// The address of the device (MAC address on most platforms, the platform id otherwise)
    pub address: String,
    /// The signal strength (RSSI) of the advertisement
    pub rssi: Option<i16>,
}

impl<P> AdvertisedDevice<P> {
    pub fn new(peripheral: P, name: Option<String>, address: String, rssi: Option<i16>) -> Self {
        Self {
            peripheral,
            name,
            address,
            rssi,
        }
    }
}

/// Anything in the GATT table that is addressed by UUID
pub trait GattAttribute {
    fn uuid(&self) -> Uuid;
}

/// An open connection to one bulb with its color characteristic resolved.
/// Owned by a single invocation and closed when that invocation ends.
#[derive(Clone)]
pub struct DeviceSession<P, C> {
    /// The connected peripheral, used for disconnecting.
    pub peripheral: P,
    /// The address the peripheral advertised with.
    pub address: String,
    /// The characteristic written and read back for every color change.
    pub color_characteristic: C,
    /// The effect characteristic, when the bulb exposes it.
    pub effect_characteristic: Option<C>,
}
