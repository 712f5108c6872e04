use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::analysis::TicketAnalysis;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};

const CACHE_LIMIT: usize = 256;

#[derive(Default, Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    key: String,
    analysis: TicketAnalysis,
}

/// Remembers the normalized analysis of each ticket so a replayed run reuses
/// the earlier result instead of querying the model again.
pub struct AnalysisCache {
    file_path: PathBuf,
    file: CacheFile,
}

impl AnalysisCache {
    pub async fn load(path: &Path) -> AppResult<Self> {
        let file = match fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str::<CacheFile>(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid cache file: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CacheFile::default(),
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self {
            file_path: path.to_path_buf(),
            file,
        })
    }

    pub fn get(&self, key: &str) -> Option<TicketAnalysis> {
        self.file
            .entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.analysis.clone())
    }

    pub fn insert(&mut self, key: String, analysis: &TicketAnalysis) {
        self.file.entries.retain(|entry| entry.key != key);
        self.file.entries.push(CacheEntry {
            key,
            analysis: analysis.clone(),
        });

        if self.file.entries.len() > CACHE_LIMIT {
            let overflow = self.file.entries.len() - CACHE_LIMIT;
            self.file.entries.drain(0..overflow);
        }
    }

    /// Writes to a sibling temp file and renames it over the cache, so an
    /// interrupted save leaves the previous file intact.
    pub async fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(&self.file)
            .map_err(|err| AppError::Configuration(format!("failed to write cache: {err}")))?;
        let staging = self.file_path.with_extension("json.tmp");
        fs::write(&staging, data).await?;
        fs::rename(&staging, &self.file_path).await?;
        Ok(())
    }

    /// Keyed on the fields the model sees, so an edited ticket is analyzed anew.
    pub fn compute_key(ticket: &Ticket) -> String {
        let mut hasher = Hasher::new();
        hasher.update(ticket.id.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(ticket.title.as_bytes());
        hasher.update(&[0]);
        hasher.update(ticket.description.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::ticket::Priority;

    fn analysis(summary: &str) -> TicketAnalysis {
        TicketAnalysis {
            summary: summary.to_string(),
            priority: Priority::High,
            ..TicketAnalysis::default()
        }
    }

    #[tokio::test]
    async fn persists_entries_between_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = AnalysisCache::load(&path).await.unwrap();
        cache.insert("k1".to_string(), &analysis("first"));
        cache.save().await.unwrap();

        let reloaded = AnalysisCache::load(&path).await.unwrap();
        assert_eq!(reloaded.get("k1"), Some(analysis("first")));
        assert_eq!(reloaded.get("k2"), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = AnalysisCache::load(&path).await.unwrap();
        cache.insert("k1".to_string(), &analysis("first"));
        cache.save().await.unwrap();

        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        cache.insert("k2".to_string(), &analysis("second"));
        assert!(cache.save().await.is_err());

        let reloaded = AnalysisCache::load(&path).await.unwrap();
        assert_eq!(reloaded.get("k1"), Some(analysis("first")));
        assert_eq!(reloaded.get("k2"), None);
    }

    #[tokio::test]
    async fn replaces_existing_key_and_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let mut cache = AnalysisCache::load(&dir.path().join("cache.json"))
            .await
            .unwrap();

        cache.insert("dup".to_string(), &analysis("old"));
        cache.insert("dup".to_string(), &analysis("new"));
        assert_eq!(cache.file.entries.len(), 1);
        assert_eq!(cache.get("dup").unwrap().summary, "new");

        for index in 0..CACHE_LIMIT {
            cache.insert(format!("k{index}"), &analysis("filler"));
        }
        assert_eq!(cache.file.entries.len(), CACHE_LIMIT);
        assert!(cache.get("dup").is_none());
        assert!(cache.get("k0").is_some());
    }

    #[test]
    fn key_changes_with_ticket_content() {
        let mut ticket = Ticket::new("Login broken".to_string(), "500 on submit".to_string(), None);
        let before = AnalysisCache::compute_key(&ticket);
        assert_eq!(before, AnalysisCache::compute_key(&ticket));

        ticket.description.push_str(" since Monday");
        assert_ne!(before, AnalysisCache::compute_key(&ticket));
    }
}
