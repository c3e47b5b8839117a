//!
//! src/sink.rs  Andrew Belles  Oct 19th, 2026
//!
//! Spreadsheet side of the sync. Decides which rows go into the worksheet
//! and which failures a run can live with.
//!

use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, warn};

use crate::errors::SyncError;
use crate::sheets::{Row, Worksheet};
use crate::types::{Track, identity_key};

pub const ARTIST_HEADER: &str = "アーティスト";
pub const ALBUM_HEADER: &str = "アルバム";
pub const TITLE_HEADER: &str = "曲名";
pub const NOTE_HEADER: &str = "メモ";
pub const DATE_HEADER: &str = "追加日";

/// Header row written to an empty worksheet: artist, album, title, note, date-added
pub const HEADERS: [&str; 5] = [ARTIST_HEADER, ALBUM_HEADER, TITLE_HEADER, NOTE_HEADER, DATE_HEADER];

/// Date-added column layout
pub const DATE_FORMAT: &str = "%Y/%m/%d";

pub type Record = HashMap<String, String>;

/// First row names the columns; each later row becomes a header -> cell map.
/// Short rows read as empty cells, cells past the header are dropped.
pub fn records(values: &[Row]) -> Vec<Record> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| {
            header.iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Keys of every record that has both an artist and a title
pub fn existing_keys(records: &[Record]) -> HashSet<String> {
    records.iter()
        .filter_map(|record| {
            let artist = record.get(ARTIST_HEADER).filter(|s| !s.is_empty())?;
            let title = record.get(TITLE_HEADER).filter(|s| !s.is_empty())?;
            Some(identity_key(artist, title))
        })
        .collect()
}

/// One row per track with a blank note column
pub fn track_rows(tracks: &[Track], date: &str) -> Vec<Row> {
    tracks.iter()
        .map(|t| vec![
            t.artist_display(),
            t.album.clone(),
            t.title.clone(),
            String::new(),
            date.to_string(),
        ])
        .collect()
}

#[derive(Debug)]
pub struct SheetSink<W> {
    worksheet: W,
}

impl<W: Worksheet + Send + Sync> SheetSink<W> {
    pub fn new(worksheet: W) -> Self {
        Self { worksheet }
    }

    #[cfg(test)]
    pub fn worksheet(&self) -> &W { &self.worksheet }

    pub async fn authenticate(&mut self) -> Result<(), SyncError> {
        self.worksheet.open().await
    }

    /// Writes the header row into an empty worksheet. Any existing row,
    /// matching or not, leaves the sheet alone. Failures are logged only.
    #[instrument(skip(self))]
    pub async fn ensure_headers(&self) {
        match self.write_headers_if_empty().await {
            Ok(true) => info!("sheets.headers.created"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "sheets.headers.error"),
        }
    }

    async fn write_headers_if_empty(&self) -> Result<bool, SyncError> {
        if !self.worksheet.get_all_values().await?.is_empty() {
            return Ok(false);
        }
        let header: Row = HEADERS.iter().map(|h| h.to_string()).collect();
        self.worksheet.append_rows(&[header]).await?;
        Ok(true)
    }

    /// Keys already recorded in the sheet. A failed read is treated as an
    /// empty sheet, which can duplicate rows on a transient error.
    #[instrument(skip(self))]
    pub async fn read_existing_keys(&self) -> HashSet<String> {
        match self.worksheet.get_all_values().await {
            Ok(values) => {
                let keys = existing_keys(&records(&values));
                info!(count = keys.len(), "sheets.existing");
                keys
            }
            Err(e) => {
                warn!(error = %e, "sheets.read.error");
                HashSet::new()
            }
        }
    }

    #[instrument(skip(self, tracks), fields(count = tracks.len()))]
    pub async fn append_tracks(&self, tracks: &[Track], date: &str) -> Result<usize, SyncError> {
        if tracks.is_empty() {
            info!("sheets.append.skipped");
            return Ok(0);
        }
        let rows = track_rows(tracks, date);
        self.worksheet.append_rows(&rows).await?;
        info!(count = rows.len(), "sheets.appended");
        Ok(rows.len())
    }
}
