//! Platform-specific state directory management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Manages platform-specific application directories
#[derive(Debug, Clone)]
pub struct StateDir {
    /// Project directories from the directories crate
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    /// Create a new StateDir using the platform defaults
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("com", "Stockroom", "stockroom");

        if project_dirs.is_none() {
            tracing::warn!("Failed to determine platform-specific directories, will use fallback");
        }

        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Create a new StateDir rooted at an override directory
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("config");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Get the data directory for persistent storage
    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("data");
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from("./data")
        }
    }

    /// Get the directory for log files
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// Path of the persisted session
    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join("session.json")
    }

    /// Path of the default settings file
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir().join("stockroom.toml")
    }

    /// Create all required directories
    pub fn create_directories(&self) -> Result<()> {
        for dir in [self.config_dir(), self.data_dir(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            tracing::debug!("Ensured directory exists: {}", dir.display());
        }

        Ok(())
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_layout() {
        let dir = StateDir::with_override("/srv/stockroom");
        assert_eq!(dir.config_dir(), PathBuf::from("/srv/stockroom/config"));
        assert_eq!(dir.data_dir(), PathBuf::from("/srv/stockroom/data"));
        assert_eq!(
            dir.session_path(),
            PathBuf::from("/srv/stockroom/data/session.json")
        );
        assert_eq!(
            dir.settings_path(),
            PathBuf::from("/srv/stockroom/config/stockroom.toml")
        );
    }

    #[test]
    fn test_create_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StateDir::with_override(tmp.path());
        dir.create_directories().unwrap();
        assert!(dir.config_dir().is_dir());
        assert!(dir.logs_dir().is_dir());
    }
}
