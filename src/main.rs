//!
//! src/main.rs  Andrew Belles  Oct 19th, 2026
//!
//! Entry point: one sync of a Spotify playlist into the first worksheet
//! of a Google spreadsheet, then exit. Live testbenches for both services
//! sit at the bottom.
//!
//!

mod config;
mod errors;
mod logging;

mod auth;
mod fetch;
mod reconcile;
mod sheets;
mod sink;
mod sync;
mod types;

#[cfg(test)]
mod testserver;

use crate::errors::SyncError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SyncError> {
    let cfgs    = config::load_config()?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service = "playlist-sheet-sync",
        version = %env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let spotify   = fetch::SpotifyClient::new(&cfgs.http, &cfgs.spotify)?;
    let worksheet = sheets::GoogleWorksheet::new(&cfgs.http, &cfgs.sheets)?;
    let sheet     = sink::SheetSink::new(worksheet);

    let today = chrono::Local::now().format(sink::DATE_FORMAT).to_string();
    let mut synchronizer = sync::Synchronizer::new(
        spotify, sheet, cfgs.spotify.playlist_id.clone()
    );
    synchronizer.run(&today).await?;

    Ok(())
}
