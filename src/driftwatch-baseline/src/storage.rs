//! Baseline persistence.

use crate::{Baseline, BaselineError, Domain, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Loads and saves the baseline file.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the baseline file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline, or start an empty one if the file does not exist.
    ///
    /// Maps for `enabled` domains are always present in the result. A file
    /// that exists but cannot be read or parsed is an error.
    pub async fn load(&self, enabled: &[Domain]) -> Result<Baseline> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|source| BaselineError::Read {
                path: self.path.clone(),
                source,
            })?;
        if !exists {
            debug!(
                "No baseline at {}, starting with an empty one",
                self.path.display()
            );
            return Ok(Baseline::empty_for(enabled));
        }

        let json = fs::read_to_string(&self.path)
            .await
            .map_err(|source| BaselineError::Read {
                path: self.path.clone(),
                source,
            })?;
        let mut baseline: Baseline =
            serde_json::from_str(&json).map_err(|source| BaselineError::Parse {
                path: self.path.clone(),
                source,
            })?;
        baseline.ensure_domains(enabled);

        debug!(
            "Loaded baseline from {}: {} file(s), {} port(s), {} process(es)",
            self.path.display(),
            baseline.len(Domain::Files),
            baseline.len(Domain::Ports),
            baseline.len(Domain::Processes)
        );
        Ok(baseline)
    }

    /// Overwrite the baseline file with the complete in-memory baseline.
    pub async fn save(&self, baseline: &Baseline) -> Result<()> {
        let json = serde_json::to_string_pretty(baseline)?;
        atomic_write(&self.path, json.as_bytes())
            .await
            .map_err(|source| BaselineError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!("Saved baseline to {}", self.path.display());
        Ok(())
    }
}

/// Write to a temp file next to `path`, then rename over it.
async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !fs::try_exists(&parent).await.unwrap_or(false) {
        fs::create_dir_all(&parent).await?;
    }

    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("baseline"),
        std::process::id()
    ));

    fs::write(&temp_path, content).await?;

    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&temp_path)
        .await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_gives_empty_baseline() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));

        let baseline = store.load(&[Domain::Files, Domain::Processes]).await.unwrap();
        assert_eq!(
            baseline,
            Baseline::empty_for(&[Domain::Files, Domain::Processes])
        );
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_round_trip_all_domains() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));

        let mut baseline = Baseline::empty_for(&Domain::ALL);
        baseline.approve(Domain::Files, "/srv/www/index.html");
        baseline.approve(Domain::Ports, "8080:nginx");
        baseline.approve(Domain::Processes, "sshd");

        store.save(&baseline).await.unwrap();
        let loaded = store.load(&[]).await.unwrap();
        assert_eq!(loaded, baseline);
    }

    #[tokio::test]
    async fn test_round_trip_empty_maps() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));

        let baseline = Baseline::empty_for(&Domain::ALL);
        store.save(&baseline).await.unwrap();
        assert_eq!(store.load(&[]).await.unwrap(), baseline);

        let partial = Baseline::empty_for(&[Domain::Ports]);
        store.save(&partial).await.unwrap();
        assert_eq!(store.load(&[]).await.unwrap(), partial);
    }

    #[tokio::test]
    async fn test_load_fills_enabled_domains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, r#"{ "known_ports": { "22:sshd": true } }"#).unwrap();

        let store = BaselineStore::new(&path);
        let baseline = store.load(&[Domain::Processes]).await.unwrap();
        assert!(baseline.contains(Domain::Ports, "22:sshd"));
        assert_eq!(baseline.known_process, Some(Default::default()));
        assert!(baseline.known_files.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let err = BaselineStore::new(&path).load(&Domain::ALL).await.unwrap_err();
        assert!(matches!(err, BaselineError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_save_overwrites_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "stale content that is much longer than the new baseline").unwrap();

        let store = BaselineStore::new(&path);
        let mut baseline = Baseline::empty_for(&[Domain::Processes]);
        baseline.approve(Domain::Processes, "cron");
        store.save(&baseline).await.unwrap();

        let on_disk: Baseline =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, baseline);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("baseline.json");
        let store = BaselineStore::new(&path);
        store.save(&Baseline::empty_for(&[Domain::Files])).await.unwrap();
        assert!(path.exists());
    }
}
