use anyhow::Result;
use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber writing to stderr and, optionally, to `log_path`.
///
/// Filter format: `<level>,actor_bridge=<level>`; `RUST_LOG` directives are
/// appended when present.
pub fn setup_logging(
    log_level: &tracing::Level,
    log_path: Option<&Path>,
    with_console: bool,
) -> Result<()> {
    let mut filter = format!(
        "{},actor_bridge={},actor_bridge_cli={}",
        log_level.as_str(),
        log_level.as_str(),
        log_level.as_str()
    );
    if let Ok(extra) = std::env::var("RUST_LOG") {
        filter.push(',');
        filter.push_str(&extra);
    }

    let file_layer = match log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_line_number(true)
                    .with_file(true)
                    .with_target(true)
                    .with_ansi(false)
                    .with_filter(EnvFilter::builder().parse(&filter)?),
            )
        }
        None => None,
    };

    let console_layer = with_console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer.map(|layer| layer.with_filter(EnvFilter::new(&filter))))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
