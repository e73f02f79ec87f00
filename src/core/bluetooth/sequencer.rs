//! Blink effect
//! Flashes a color twice and restores the original one, verifying every change.
//! A failure part way through aborts the sequence and may leave the bulb in the flash color.

use std::time::Duration;

use log::{debug, info};
use tokio::time::sleep;

use crate::core::bluetooth::transport::BleTransport;
use crate::core::bluetooth::writer::ColorWriter;
use crate::core::color::ColorValue;
use crate::error::BulbError;

/// States of a blink, visited strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    ReadOriginal,
    FlashOn,
    WaitAfterFlash,
    Restore,
    WaitAfterRestore,
    FlashOnAgain,
    WaitAfterSecondFlash,
    RestoreAgain,
    Done,
}

impl BlinkState {
    pub fn next(self) -> Self {
        match self {
            Self::ReadOriginal => Self::FlashOn,
            Self::FlashOn => Self::WaitAfterFlash,
            Self::WaitAfterFlash => Self::Restore,
            Self::Restore => Self::WaitAfterRestore,
            Self::WaitAfterRestore => Self::FlashOnAgain,
            Self::FlashOnAgain => Self::WaitAfterSecondFlash,
            Self::WaitAfterSecondFlash => Self::RestoreAgain,
            Self::RestoreAgain | Self::Done => Self::Done,
        }
    }
}

pub struct BlinkSequencer<'w, 'a, T: BleTransport> {
    writer: &'w ColorWriter<'a, T>,
    blink_time: Duration,
}

impl<'w, 'a, T: BleTransport> BlinkSequencer<'w, 'a, T> {
    pub fn new(writer: &'w ColorWriter<'a, T>, blink_time: Duration) -> Self {
        Self { writer, blink_time }
    }

    /// Runs the blink and returns the restored original color
    pub async fn blink(&self, flash_color: ColorValue) -> Result<ColorValue, BulbError> {
        let mut state = BlinkState::ReadOriginal;
        let mut original = ColorValue::OFF;

        while state != BlinkState::Done {
            debug!("Blink state: {:?}", state);
            match state {
                BlinkState::ReadOriginal => {
                    original = self.writer.read_color().await?;
                    info!("Original color is {}", original);
                }
                BlinkState::FlashOn | BlinkState::FlashOnAgain => {
                    self.writer.set_color(flash_color).await?;
                }
                BlinkState::Restore | BlinkState::RestoreAgain => {
                    self.writer.set_color(original).await?;
                }
                BlinkState::WaitAfterFlash
                | BlinkState::WaitAfterRestore
                | BlinkState::WaitAfterSecondFlash => {
                    sleep(self.blink_time).await;
                }
                BlinkState::Done => {}
            }
            state = state.next();
        }

        info!("Blink finished, color restored to {}", original);
        Ok(original)
    }
}
