//! Verified color writes
//! A color change only counts once the bulb reports the written value back.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::core::bluetooth::transport::{BleTransport, SessionOf};
use crate::core::color::ColorValue;
use crate::error::BulbError;

pub struct ColorWriter<'a, T: BleTransport> {
    transport: &'a T,
    session: &'a SessionOf<T>,
    settle_interval: Duration,
}

impl<'a, T: BleTransport> ColorWriter<'a, T> {
    pub fn new(transport: &'a T, session: &'a SessionOf<T>, settle_interval: Duration) -> Self {
        Self {
            transport,
            session,
            settle_interval,
        }
    }

    /// Writes `color`, waits for the bulb to settle, then reads it back.
    /// Returns the confirmed color; any differing byte is a [`BulbError::VerificationMismatch`].
    pub async fn set_color(&self, color: ColorValue) -> Result<ColorValue, BulbError> {
        info!("Sending color to playbulb: {}", color);
        self.transport
            .write(&self.session.color_characteristic, color.as_bytes(), true)
            .await
            .map_err(|source| BulbError::Write { color, source })?;

        sleep(self.settle_interval).await;

        let data = self.read_raw().await?;
        if data.as_slice() != color.as_bytes() {
            warn!("Failed to set color");
            return Err(BulbError::VerificationMismatch {
                expected: color,
                actual: data,
            });
        }

        debug!("Color {} confirmed", color);
        Ok(color)
    }

    /// Reads the current color without writing anything
    pub async fn read_color(&self) -> Result<ColorValue, BulbError> {
        let data = self.read_raw().await?;
        ColorValue::from_slice(&data).ok_or(BulbError::MalformedColor(data))
    }

    async fn read_raw(&self) -> Result<Vec<u8>, BulbError> {
        self.transport
            .read(&self.session.color_characteristic)
            .await
            .map_err(|e| {
                warn!("failed to read color");
                BulbError::Read(e)
            })
    }
}
