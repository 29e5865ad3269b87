//! File-based capture archive with TTL support.
//!
//! Accepted payloads are written per tournament so a cycle can be replayed
//! through the normalizer offline.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::payload::CapturedPayload;
use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::types::{Tournament, TournamentId};

/// Archived payloads of one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub tournament: Tournament,
    pub payloads: Vec<CapturedPayload>,
    pub captured_at: DateTime<Utc>,
}

/// File-based archive
pub struct CaptureArchive {
    base_dir: PathBuf,
    ttl: Duration,
}

impl CaptureArchive {
    pub fn new(base_dir: PathBuf, ttl: Duration) -> Self {
        Self { base_dir, ttl }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(PathBuf::from(&config.dir), Duration::hours(config.ttl_hours))
    }

    /// Archive file path for a tournament
    pub fn path(&self, id: TournamentId) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }

    /// Archived entry if present and not expired
    pub fn get(&self, id: TournamentId) -> Option<ArchiveEntry> {
        let path = self.path(id);
        if !path.exists() {
            return None;
        }

        let entry = Self::read_file(&path).ok()?;

        let elapsed = Utc::now() - entry.captured_at;
        if elapsed > self.ttl {
            // Remove expired entry
            let _ = std::fs::remove_file(&path);
            return None;
        }

        Some(entry)
    }

    /// Write a tournament's payloads, replacing any earlier entry
    pub fn store(&self, tournament: &Tournament, payloads: &[CapturedPayload]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.base_dir)?;

        let entry = ArchiveEntry {
            tournament: tournament.clone(),
            payloads: payloads.to_vec(),
            captured_at: Utc::now(),
        };

        let path = self.path(tournament.id);
        let content = serde_json::to_string_pretty(&entry)?;
        std::fs::write(&path, content)?;

        Ok(path)
    }

    /// Read an archive file regardless of age
    pub fn read_file(path: &Path) -> Result<ArchiveEntry> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Remove expired entries, returning how many were deleted
    pub fn prune(&self) -> Result<usize> {
        if !self.base_dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for dir_entry in std::fs::read_dir(&self.base_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let expired = match Self::read_file(&path) {
                Ok(entry) => Utc::now() - entry.captured_at > self.ttl,
                Err(_) => true,
            };
            if expired {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
