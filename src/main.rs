use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, error, info};

use playbulb_lib::config::BulbConfig;
use playbulb_lib::core::ColorValue;
use playbulb_lib::core::bluetooth::{BluestTransport, BluetoothManager};
use playbulb_lib::error::{EXIT_FAILURE, EXIT_SUCCESS};
use playbulb_lib::{BulbError, Invocation, logging};

#[derive(Parser, Debug)]
#[command(name = "playbulb", version)]
#[command(about = "Change or blink the color of a Playbulb over Bluetooth LE")]
struct Cli {
    /// Command to run: `change` or `blink`
    command: Option<String>,

    /// 8 hex digits (white, red, green, blue) or one of red, green, blue, purple, off
    #[arg(short, long)]
    color: Option<String>,

    /// Pause between blink steps in milliseconds
    #[arg(long, value_name = "MS")]
    blink_time: Option<u64>,

    /// How long to search for the bulb in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Regular expression matched against advertised device names
    #[arg(long, value_name = "PATTERN")]
    name: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(LevelFilter::Info);

    // clap exits with 2 on bad arguments, which is reserved for discovery timeouts
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli).await {
        Ok(color) => {
            info!("Playbulb color is {}", color);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<BulbError>()
                .map(BulbError::exit_code)
                .unwrap_or(EXIT_FAILURE);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<ColorValue> {
    let config = BulbConfig::load_config(cli.config.as_deref())
        .await?
        .with_overrides(cli.timeout, cli.blink_time, cli.name);
    let invocation = Invocation::new(cli.command.as_deref(), cli.color.as_deref(), &config)?;

    let transport = BluestTransport::new()
        .await
        .context("Failed to open the Bluetooth adapter")?;
    let manager = BluetoothManager::new(transport);

    let cancel_token = manager.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling discovery.");
            cancel_token.cancel();
        }
    });

    Ok(manager.run(&invocation).await?)
}
