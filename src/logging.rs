use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::Result;

/// Route tracing output to `log_path`. The terminal front-end owns stdout, so
/// nothing is written to the console. `RUST_LOG` overrides the configured
/// level.
pub fn init_file_logger(settings: &LoggingSettings, log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&settings.level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();

    Ok(())
}

fn default_directive(level: &str) -> String {
    format!("library_lending_tracker={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_level_to_this_crate() {
        assert_eq!(default_directive("debug"), "library_lending_tracker=debug,warn");
    }
}
