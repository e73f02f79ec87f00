//! Bluetooth manager for the Playbulb
//! This module provides the main interface for one command invocation:
//! discover, connect, run the command, disconnect.

use log::info;
use tokio_util::sync::CancellationToken;

use crate::commands::{Command, Invocation};
use crate::core::bluetooth::connection::ConnectionManager;
use crate::core::bluetooth::scanner::BluetoothScanner;
use crate::core::bluetooth::sequencer::BlinkSequencer;
use crate::core::bluetooth::transport::{BleTransport, SessionOf};
use crate::core::bluetooth::writer::ColorWriter;
use crate::core::color::ColorValue;
use crate::error::BulbError;

/// Manages Bluetooth operations
pub struct BluetoothManager<T: BleTransport> {
    /// The transport every operation goes through
    transport: T,
    /// Cancels a discovery in progress
    cancel_token: CancellationToken,
}

impl<T: BleTransport> BluetoothManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Token that aborts discovery when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Runs one invocation end to end and returns the color the bulb confirmed.
    /// The session is always closed, whether the command succeeded or not.
    pub async fn run(&self, invocation: &Invocation) -> Result<ColorValue, BulbError> {
        let scanner = BluetoothScanner::new(&self.transport, self.cancel_token.clone());
        let device = scanner
            .discover(&invocation.name_pattern, invocation.scan_timeout)
            .await?;

        let connection = ConnectionManager::new(&self.transport);
        let session = connection.open(device).await?;

        let result = self.execute(&session, invocation).await;
        connection.close(session).await;
        result
    }

    async fn execute(
        &self,
        session: &SessionOf<T>,
        invocation: &Invocation,
    ) -> Result<ColorValue, BulbError> {
        let color = invocation.color.color();
        let writer = ColorWriter::new(&self.transport, session, invocation.settle_interval);

        info!("Running {} with color {}", invocation.command, color);
        match invocation.command {
            Command::Change => writer.set_color(color).await,
            Command::Blink => {
                BlinkSequencer::new(&writer, invocation.blink_time)
                    .blink(color)
                    .await
            }
        }
    }
}
