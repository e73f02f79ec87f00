//! In-memory bulb used by the tests
//! Plays back scheduled advertisements and radio events on tokio time, records every
//! operation with its timestamp and injects faults on request.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use crate::core::bluetooth::constants::{UUID_COLOR_CHAR, UUID_COLOR_SERVICE, UUID_EFFECT_CHAR};
use crate::core::bluetooth::transport::{AdvertisementStream, BleTransport};
use crate::core::bluetooth::types::{AdvertisedDevice, GattAttribute, RadioState};
use crate::core::color::ColorValue;
use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOp {
    StartScan,
    StopScan,
    Connect,
    Disconnect,
    DiscoverServices,
    DiscoverCharacteristics,
    Write(Vec<u8>),
    WriteFailed(Vec<u8>),
    Read,
    ReadFailed,
}

/// Operation to fail. `Write(n)` and `Read(n)` fail the n-th (zero based) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Connect,
    DiscoverServices,
    DiscoverCharacteristics,
    Write(usize),
    Read(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedPeripheral {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedAttribute(Uuid);

impl GattAttribute for SimulatedAttribute {
    fn uuid(&self) -> Uuid {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ScheduledAdvertisement {
    delay: Duration,
    name: Option<String>,
    address: String,
}

struct SimulatedState {
    radio: RadioState,
    scanning: bool,
    connected: bool,
    color: Vec<u8>,
    writes_attempted: usize,
    reads_attempted: usize,
    log: Vec<(Duration, SimulatedOp)>,
}

pub struct SimulatedBulb {
    created: Instant,
    advertisements: Vec<ScheduledAdvertisement>,
    radio_changes: Vec<(Duration, RadioState)>,
    has_service: bool,
    has_color_char: bool,
    has_effect_char: bool,
    faults: Vec<Fault>,
    stuck_byte: Option<(usize, u8)>,
    truncate_reads: Option<usize>,
    scan_ends: bool,
    state: Mutex<SimulatedState>,
}

pub struct SimulatedBulbBuilder {
    radio: RadioState,
    color: ColorValue,
    advertisements: Vec<ScheduledAdvertisement>,
    radio_changes: Vec<(Duration, RadioState)>,
    has_service: bool,
    has_color_char: bool,
    has_effect_char: bool,
    faults: Vec<Fault>,
    stuck_byte: Option<(usize, u8)>,
    truncate_reads: Option<usize>,
    scan_ends: bool,
}

impl SimulatedBulbBuilder {
    pub fn radio(mut self, state: RadioState) -> Self {
        self.radio = state;
        self
    }

    /// Radio transition `delay` after the previous one
    pub fn radio_change(mut self, delay: Duration, state: RadioState) -> Self {
        self.radio_changes.push((delay, state));
        self
    }

    /// Advertisement seen `delay` after the previous one, replayed on every scan
    pub fn advertise(mut self, delay: Duration, name: &str, address: &str) -> Self {
        self.advertisements.push(ScheduledAdvertisement {
            delay,
            name: Some(name.to_string()),
            address: address.to_string(),
        });
        self
    }

    pub fn advertise_nameless(mut self, delay: Duration, address: &str) -> Self {
        self.advertisements.push(ScheduledAdvertisement {
            delay,
            name: None,
            address: address.to_string(),
        });
        self
    }

    pub fn initial_color(mut self, color: ColorValue) -> Self {
        self.color = color;
        self
    }

    pub fn fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Reads report `value` at `index` whatever was written
    pub fn stuck_byte(mut self, index: usize, value: u8) -> Self {
        self.stuck_byte = Some((index, value));
        self
    }

    /// Reads return only the first `len` bytes
    pub fn truncate_reads(mut self, len: usize) -> Self {
        self.truncate_reads = Some(len);
        self
    }

    /// The advertisement stream closes after the scheduled advertisements
    pub fn scan_ends(mut self) -> Self {
        self.scan_ends = true;
        self
    }

    pub fn without_color_service(mut self) -> Self {
        self.has_service = false;
        self
    }

    pub fn without_color_characteristic(mut self) -> Self {
        self.has_color_char = false;
        self
    }

    pub fn without_effect_characteristic(mut self) -> Self {
        self.has_effect_char = false;
        self
    }

    pub fn build(self) -> SimulatedBulb {
        SimulatedBulb {
            created: Instant::now(),
            advertisements: self.advertisements,
            radio_changes: self.radio_changes,
            has_service: self.has_service,
            has_color_char: self.has_color_char,
            has_effect_char: self.has_effect_char,
            faults: self.faults,
            stuck_byte: self.stuck_byte,
            truncate_reads: self.truncate_reads,
            scan_ends: self.scan_ends,
            state: Mutex::new(SimulatedState {
                radio: self.radio,
                scanning: false,
                connected: false,
                color: self.color.as_bytes().to_vec(),
                writes_attempted: 0,
                reads_attempted: 0,
                log: Vec::new(),
            }),
        }
    }
}

impl SimulatedBulb {
    pub fn builder() -> SimulatedBulbBuilder {
        SimulatedBulbBuilder {
            radio: RadioState::PoweredOn,
            color: ColorValue::OFF,
            advertisements: Vec::new(),
            radio_changes: Vec::new(),
            has_service: true,
            has_color_char: true,
            has_effect_char: true,
            faults: Vec::new(),
            stuck_byte: None,
            truncate_reads: None,
            scan_ends: false,
        }
    }

    /// The advertisement a scan would report for this bulb
    pub fn advertised(&self) -> AdvertisedDevice<SimulatedPeripheral> {
        let address = "AA:BB:CC:DD:EE:FF".to_string();
        AdvertisedDevice::new(
            SimulatedPeripheral {
                address: address.clone(),
            },
            Some("PLAYBULB".to_string()),
            address,
            Some(-60),
        )
    }

    pub fn is_scanning(&self) -> bool {
        self.state.lock().unwrap().scanning
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn color(&self) -> Vec<u8> {
        self.state.lock().unwrap().color.clone()
    }

    /// Payloads of the writes the bulb accepted, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter_map(|(_, op)| match op {
                SimulatedOp::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, filter: impl Fn(&SimulatedOp) -> bool) -> usize {
        self.times(filter).len()
    }

    /// Offsets from construction of every logged operation accepted by `filter`
    pub fn times(&self, filter: impl Fn(&SimulatedOp) -> bool) -> Vec<Duration> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|(_, op)| filter(op))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn first_time(&self, filter: impl Fn(&SimulatedOp) -> bool) -> Option<Duration> {
        self.times(filter).first().copied()
    }

    fn record(&self, state: &mut SimulatedState, op: SimulatedOp) {
        state.log.push((self.created.elapsed(), op));
    }

    fn log(&self, op: SimulatedOp) {
        let mut state = self.state.lock().unwrap();
        self.record(&mut state, op);
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn failure(what: &str) -> TransportError {
        TransportError::Failed(format!("simulated {what} failure"))
    }
}

#[async_trait]
impl BleTransport for SimulatedBulb {
    type Peripheral = SimulatedPeripheral;
    type Service = SimulatedAttribute;
    type Characteristic = SimulatedAttribute;

    async fn radio_state(&self) -> Result<RadioState, TransportError> {
        Ok(self.state.lock().unwrap().radio)
    }

    async fn radio_state_changes(&self) -> Result<BoxStream<'_, RadioState>, TransportError> {
        Ok(stream::iter(self.radio_changes.clone())
            .then(move |(delay, radio)| async move {
                sleep(delay).await;
                self.state.lock().unwrap().radio = radio;
                radio
            })
            .chain(stream::pending())
            .boxed())
    }

    async fn scan_for_advertisements(
        &self,
    ) -> Result<AdvertisementStream<'_, SimulatedPeripheral>, TransportError> {
        {
            let mut state = self.state.lock().unwrap();
            state.scanning = true;
            self.record(&mut state, SimulatedOp::StartScan);
        }
        let advertisements = stream::iter(self.advertisements.clone()).then(|advertisement| async move {
            sleep(advertisement.delay).await;
            AdvertisedDevice::new(
                SimulatedPeripheral {
                    address: advertisement.address.clone(),
                },
                advertisement.name,
                advertisement.address,
                Some(-60),
            )
        });
        if self.scan_ends {
            Ok(advertisements.boxed())
        } else {
            Ok(advertisements.chain(stream::pending()).boxed())
        }
    }

    async fn stop_scanning(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.scanning = false;
        self.record(&mut state, SimulatedOp::StopScan);
        Ok(())
    }

    async fn connect(&self, _peripheral: &SimulatedPeripheral) -> Result<(), TransportError> {
        self.log(SimulatedOp::Connect);
        if self.has_fault(Fault::Connect) {
            return Err(Self::failure("connect"));
        }
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn disconnect(&self, _peripheral: &SimulatedPeripheral) -> Result<(), TransportError> {
        self.log(SimulatedOp::Disconnect);
        self.state.lock().unwrap().connected = false;
        Ok(())
    }

    async fn discover_services(
        &self,
        _peripheral: &SimulatedPeripheral,
        ids: &[Uuid],
    ) -> Result<Vec<SimulatedAttribute>, TransportError> {
        self.log(SimulatedOp::DiscoverServices);
        if self.has_fault(Fault::DiscoverServices) {
            return Err(Self::failure("service discovery"));
        }
        Ok(ids
            .iter()
            .filter(|id| self.has_service && **id == UUID_COLOR_SERVICE)
            .map(|id| SimulatedAttribute(*id))
            .collect())
    }

    async fn discover_characteristics(
        &self,
        _service: &SimulatedAttribute,
        ids: &[Uuid],
    ) -> Result<Vec<SimulatedAttribute>, TransportError> {
        self.log(SimulatedOp::DiscoverCharacteristics);
        if self.has_fault(Fault::DiscoverCharacteristics) {
            return Err(Self::failure("characteristic discovery"));
        }
        Ok(ids
            .iter()
            .filter(|id| {
                (self.has_color_char && **id == UUID_COLOR_CHAR)
                    || (self.has_effect_char && **id == UUID_EFFECT_CHAR)
            })
            .map(|id| SimulatedAttribute(*id))
            .collect())
    }

    async fn write(
        &self,
        _characteristic: &SimulatedAttribute,
        bytes: &[u8],
        _with_response: bool,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state.writes_attempted;
        state.writes_attempted += 1;
        if self.has_fault(Fault::Write(attempt)) {
            self.record(&mut state, SimulatedOp::WriteFailed(bytes.to_vec()));
            return Err(Self::failure("write"));
        }
        state.color = bytes.to_vec();
        self.record(&mut state, SimulatedOp::Write(bytes.to_vec()));
        Ok(())
    }

    async fn read(&self, _characteristic: &SimulatedAttribute) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state.reads_attempted;
        state.reads_attempted += 1;
        if self.has_fault(Fault::Read(attempt)) {
            self.record(&mut state, SimulatedOp::ReadFailed);
            return Err(Self::failure("read"));
        }
        self.record(&mut state, SimulatedOp::Read);

        let mut data = state.color.clone();
        if let Some((index, value)) = self.stuck_byte {
            if let Some(byte) = data.get_mut(index) {
                *byte = value;
            }
        }
        if let Some(len) = self.truncate_reads {
            data.truncate(len);
        }
        Ok(data)
    }
}
