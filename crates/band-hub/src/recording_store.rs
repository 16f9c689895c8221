//! SQLite store for recordings captured locally before (or after) upload.
//!
//! Provides pooled connections, schema bootstrap, and keyed CRUD.

use std::path::Path;

use anyhow::{Context, Result, bail};
use band_hub_types::UploadedFile;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};

use crate::clock::now_ms;
use crate::drive::RecordingUpload;

const SELECT_COLUMNS: &str = "id, name, audio, duration_secs, size_bytes, mime_type, timestamp_ms, \
     song_name, recording_type, quality, drive_file_id, drive_web_view_link, drive_uploaded_at_ms";

#[derive(Clone)]
pub struct RecordingStore {
    pool: Pool<SqliteConnectionManager>,
}

/// A freshly captured recording.
#[derive(Debug, Clone)]
pub struct NewRecording {
    pub name: String,
    pub audio: Vec<u8>,
    pub duration_secs: f64,
    pub mime_type: String,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub song_name: Option<String>,
    pub recording_type: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRecord {
    pub id: i64,
    pub name: String,
    pub audio: Vec<u8>,
    pub duration_secs: f64,
    pub size_bytes: i64,
    pub mime_type: String,
    pub timestamp_ms: i64,
    pub song_name: Option<String>,
    pub recording_type: Option<String>,
    pub quality: Option<String>,
    pub drive_file_id: Option<String>,
    pub drive_web_view_link: Option<String>,
    pub drive_uploaded_at_ms: Option<i64>,
}

impl RecordingRecord {
    pub fn is_uploaded(&self) -> bool {
        self.drive_file_id.is_some()
    }

    pub fn to_upload(&self) -> RecordingUpload {
        RecordingUpload {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            audio: self.audio.clone(),
            duration_secs: self.duration_secs,
            timestamp_ms: self.timestamp_ms,
            quality: self.quality.clone(),
        }
    }
}

/// Partial update; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct RecordingUpdate {
    pub name: Option<String>,
    pub song_name: Option<String>,
    pub recording_type: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordingStats {
    pub count: u64,
    pub duration_secs: f64,
    pub size_bytes: u64,
}

/// Outcome of a bulk upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub failed: usize,
}

fn map_recording_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordingRecord> {
    Ok(RecordingRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        audio: row.get(2)?,
        duration_secs: row.get(3)?,
        size_bytes: row.get(4)?,
        mime_type: row.get(5)?,
        timestamp_ms: row.get(6)?,
        song_name: row.get(7)?,
        recording_type: row.get(8)?,
        quality: row.get(9)?,
        drive_file_id: row.get(10)?,
        drive_web_view_link: row.get(11)?,
        drive_uploaded_at_ms: row.get(12)?,
    })
}

impl RecordingStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create recordings dir {:?}", parent))?;
        }
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("create recordings db pool")?;
        {
            let conn = pool.get().context("open recordings db")?;
            init_schema(&conn)?;
        }
        tracing::debug!(path = %db_path.display(), "recordings store ready");
        Ok(Self { pool })
    }

    /// Insert a recording and return its id.
    pub fn save(&self, recording: &NewRecording) -> Result<i64> {
        let conn = self.pool.get().context("open recordings db")?;
        conn.execute(
            r#"
            INSERT INTO recordings
                (name, audio, duration_secs, size_bytes, mime_type, timestamp_ms,
                 song_name, recording_type, quality)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                recording.name,
                recording.audio,
                recording.duration_secs,
                recording.audio.len() as i64,
                recording.mime_type,
                recording.timestamp_ms,
                recording.song_name,
                recording.recording_type,
                recording.quality,
            ],
        )
        .context("insert recording")?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, name = %recording.name, bytes = recording.audio.len(), "saved recording");
        Ok(id)
    }

    /// All recordings, newest first.
    pub fn all(&self) -> Result<Vec<RecordingRecord>> {
        let conn = self.pool.get().context("open recordings db")?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM recordings ORDER BY timestamp_ms DESC, id DESC"
            ))
            .context("prepare recordings query")?;
        let rows = stmt
            .query_map([], map_recording_row)
            .context("query recordings")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("read recordings")
    }

    pub fn get(&self, id: i64) -> Result<Option<RecordingRecord>> {
        let conn = self.pool.get().context("open recordings db")?;
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM recordings WHERE id = ?1"),
            params![id],
            map_recording_row,
        )
        .optional()
        .context("fetch recording")
    }

    /// Delete a recording. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get().context("open recordings db")?;
        let removed = conn
            .execute("DELETE FROM recordings WHERE id = ?1", params![id])
            .context("delete recording")?;
        Ok(removed > 0)
    }

    pub fn update(&self, id: i64, changes: &RecordingUpdate) -> Result<RecordingRecord> {
        let conn = self.pool.get().context("open recordings db")?;
        let updated = conn
            .execute(
                r#"
                UPDATE recordings SET
                    name = COALESCE(?2, name),
                    song_name = COALESCE(?3, song_name),
                    recording_type = COALESCE(?4, recording_type),
                    quality = COALESCE(?5, quality)
                WHERE id = ?1
                "#,
                params![
                    id,
                    changes.name,
                    changes.song_name,
                    changes.recording_type,
                    changes.quality,
                ],
            )
            .context("update recording")?;
        if updated == 0 {
            bail!("recording {id} not found");
        }
        drop(conn);
        self.get(id)?
            .with_context(|| format!("recording {id} vanished during update"))
    }

    /// Record where a local recording ended up on Drive.
    pub fn mark_uploaded(&self, id: i64, uploaded: &UploadedFile) -> Result<()> {
        let conn = self.pool.get().context("open recordings db")?;
        let updated = conn
            .execute(
                r#"
                UPDATE recordings SET
                    drive_file_id = ?2,
                    drive_web_view_link = ?3,
                    drive_uploaded_at_ms = ?4
                WHERE id = ?1
                "#,
                params![id, uploaded.file_id, uploaded.web_view_link, now_ms()],
            )
            .context("mark recording uploaded")?;
        if updated == 0 {
            bail!("recording {id} not found");
        }
        tracing::info!(id, file_id = %uploaded.file_id, "recording marked as uploaded");
        Ok(())
    }

    /// Recordings without a Drive copy, newest first.
    pub fn pending_uploads(&self) -> Result<Vec<RecordingRecord>> {
        let conn = self.pool.get().context("open recordings db")?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM recordings WHERE drive_file_id IS NULL \
                 ORDER BY timestamp_ms DESC, id DESC"
            ))
            .context("prepare pending uploads query")?;
        let rows = stmt
            .query_map([], map_recording_row)
            .context("query pending uploads")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("read pending uploads")
    }

    /// Upload one recording, record its Drive location, then remove the local copy.
    pub fn upload_and_remove<F>(&self, record: &RecordingRecord, upload: F) -> Result<UploadedFile>
    where
        F: FnOnce(&RecordingRecord) -> Result<UploadedFile>,
    {
        let uploaded = upload(record)?;
        self.mark_uploaded(record.id, &uploaded)?;
        self.delete(record.id)?;
        tracing::info!(id = record.id, file_id = %uploaded.file_id, "local copy removed after upload");
        Ok(uploaded)
    }

    /// Upload every pending recording. A failed upload is logged and counted;
    /// the remaining recordings are still attempted.
    pub fn upload_pending<F>(&self, mut upload: F) -> Result<UploadSummary>
    where
        F: FnMut(&RecordingRecord) -> Result<UploadedFile>,
    {
        let mut summary = UploadSummary::default();
        for record in self.pending_uploads()? {
            match self.upload_and_remove(&record, &mut upload) {
                Ok(_) => summary.uploaded += 1,
                Err(err) => {
                    tracing::warn!(id = record.id, name = %record.name, error = %err, "upload failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    pub fn total_stats(&self) -> Result<RecordingStats> {
        let conn = self.pool.get().context("open recordings db")?;
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0.0), COALESCE(SUM(size_bytes), 0) FROM recordings",
            [],
            |row| {
                Ok(RecordingStats {
                    count: row.get::<_, i64>(0)?.max(0) as u64,
                    duration_secs: row.get(1)?,
                    size_bytes: row.get::<_, i64>(2)?.max(0) as u64,
                })
            },
        )
        .context("compute recording stats")
    }

    /// Remove every recording. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.pool.get().context("open recordings db")?;
        let removed = conn
            .execute("DELETE FROM recordings", [])
            .context("clear recordings")?;
        tracing::info!(removed, "cleared local recordings");
        Ok(removed)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS recordings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            audio BLOB NOT NULL,
            duration_secs REAL NOT NULL DEFAULT 0,
            size_bytes INTEGER NOT NULL DEFAULT 0,
            mime_type TEXT NOT NULL,
            timestamp_ms INTEGER NOT NULL,
            song_name TEXT,
            recording_type TEXT,
            quality TEXT,
            drive_file_id TEXT,
            drive_web_view_link TEXT,
            drive_uploaded_at_ms INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_recordings_timestamp ON recordings(timestamp_ms);
        CREATE INDEX IF NOT EXISTS idx_recordings_name ON recordings(name);
        "#,
    )
    .context("create recordings schema")?;
    Ok(())
}
