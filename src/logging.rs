use std::io::Write;

use chrono::Local;
use log::LevelFilter;

/// Initializes the stderr logger.
///
/// `level` applies unless `RUST_LOG` says otherwise. Every line carries a local timestamp.
pub fn init(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to initialize logger: {}", e);
    }
}
