//!
//! src/sync.rs  Andrew Belles  Oct 19th, 2026
//!
//! Runs one sync: authenticate both sides, fetch the playlist, diff it
//! against the sheet and append whatever is new. Steps run strictly one
//! after another and each runs at most once.
//!

use std::fmt;

use tracing::{debug, error, info};

use crate::errors::SyncError;
use crate::fetch::PlaylistSource;
use crate::reconcile;
use crate::sheets::Worksheet;
use crate::sink::SheetSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    AuthenticatingSource,
    AuthenticatingSink,
    EnsuringHeaders,
    FetchingSource,
    ReadingSinkState,
    Reconciling,
    AppendingDelta,
    Done,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counts reported once a run reaches `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub fetched: usize,
    pub existing: usize,
    pub added: usize,
}

pub struct Synchronizer<S, W> {
    source: S,
    sink: SheetSink<W>,
    playlist_id: String,
    state: SyncState,
}

impl<S, W> Synchronizer<S, W>
where
    S: PlaylistSource + Send + Sync,
    W: Worksheet + Send + Sync,
{
    pub fn new(source: S, sink: SheetSink<W>, playlist_id: impl Into<String>) -> Self {
        Self { source, sink, playlist_id: playlist_id.into(), state: SyncState::Idle }
    }

    #[cfg(test)]
    pub fn state(&self) -> SyncState { self.state }

    #[cfg(test)]
    pub fn sink(&self) -> &SheetSink<W> { &self.sink }

    fn enter(&mut self, next: SyncState) {
        debug!(from = %self.state, to = %next, "sync.state");
        self.state = next;
    }

    ///
    /// Runs every step once. `today` is the date-added value for new rows.
    /// On error the state is left at `Failed` and the error is returned as-is;
    /// rows appended before the failure stay in the sheet.
    ///
    pub async fn run(&mut self, today: &str) -> Result<SyncReport, SyncError> {
        if self.state != SyncState::Idle {
            return Err(SyncError::Config(
                format!("sync already ran (state {})", self.state)
            ));
        }
        info!(playlist = %self.playlist_id, "sync.start");

        match self.steps(today).await {
            Ok(report) => {
                self.enter(SyncState::Done);
                info!(
                    fetched = report.fetched,
                    existing = report.existing,
                    added = report.added,
                    "sync.done"
                );
                Ok(report)
            }
            Err(e) => {
                error!(state = %self.state, error = %e, "sync.failed");
                self.enter(SyncState::Failed);
                Err(e)
            }
        }
    }

    async fn steps(&mut self, today: &str) -> Result<SyncReport, SyncError> {
        self.enter(SyncState::AuthenticatingSource);
        self.source.authenticate().await?;

        self.enter(SyncState::AuthenticatingSink);
        self.sink.authenticate().await?;

        self.enter(SyncState::EnsuringHeaders);
        self.sink.ensure_headers().await;

        self.enter(SyncState::FetchingSource);
        let tracks = self.source.fetch_all_tracks(&self.playlist_id).await?;

        self.enter(SyncState::ReadingSinkState);
        let existing = self.sink.read_existing_keys().await;

        self.enter(SyncState::Reconciling);
        let delta = reconcile::diff(&tracks, &existing);
        info!(count = delta.len(), "sync.delta");

        self.enter(SyncState::AppendingDelta);
        let added = self.sink.append_tracks(&delta, today).await?;

        Ok(SyncReport { fetched: tracks.len(), existing: existing.len(), added })
    }
}
