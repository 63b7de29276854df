//! Binary entry point: load settings, start file logging, open the SQLite
//! store, seed an empty catalog and drive the Ratatui event loop until the
//! user exits.
use anyhow::Context;
use library_lending_tracker::config::data_dir;
use library_lending_tracker::logging::init_file_logger;
use library_lending_tracker::{run_app, App, Library, Settings};

fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_file_logger(&settings.logging, &data_dir()?.join("tracker.log"))
        .context("failed to start logging")?;

    let library = Library::from_settings(&settings).context("failed to open library database")?;
    library
        .seed_if_empty()
        .context("failed to seed sample catalog")?;

    tracing::info!("starting with database {}", library.database().path().display());
    let mut app = App::new(library)?;
    run_app(&mut app)
}
