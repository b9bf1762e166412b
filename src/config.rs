//! Environment-driven settings.
//!
//! Values come from the process environment, after loading a `.env` file from
//! the working directory if one exists. Empty variables count as unset.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::interpreter::DEFAULT_MODEL;

/// Errors that can occur while reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Failed to determine data directory; set CHUNKWISE_FILES_ROOT")]
    NoDataDir,
}

/// Runtime settings for the interpretation pipeline and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `OPENAI_API_KEY`; required only when the API is called.
    pub openai_api_key: Option<String>,
    /// `OPENAI_BASE_URL`; the client default applies when unset.
    pub openai_base_url: Option<String>,
    /// `CHUNKWISE_MODEL`
    pub model: String,
    /// `CHUNKWISE_CHUNK_SIZE`, in characters
    pub chunk_size: usize,
    /// `CHUNKWISE_CHUNK_PAUSE_SECS`
    pub chunk_pause: Duration,
    /// `CHUNKWISE_FILES_ROOT`, defaults to `{data_dir}/chunkwise`. Holds
    /// documents and their answer files; created on startup.
    pub files_root: PathBuf,
    /// `CHUNKWISE_MD_PATH`, defaults to `{files_root}/document.md`
    pub default_md_path: PathBuf,
}

impl Settings {
    /// Loads `.env` (if present) and reads settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable does not parse or no
    /// files root can be determined.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Reads settings from the process environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let chunk_size = match get("CHUNKWISE_CHUNK_SIZE") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CHUNKWISE_CHUNK_SIZE",
                        value,
                        expected: "a positive integer",
                    });
                }
            },
            None => DEFAULT_CHUNK_SIZE,
        };

        let chunk_pause = match get("CHUNKWISE_CHUNK_PAUSE_SECS") {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid {
                        name: "CHUNKWISE_CHUNK_PAUSE_SECS",
                        value,
                        expected: "a whole number of seconds",
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(1),
        };

        let files_root = match get("CHUNKWISE_FILES_ROOT") {
            Some(root) => PathBuf::from(root),
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("chunkwise"),
        };

        let default_md_path = get("CHUNKWISE_MD_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| files_root.join("document.md"));

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("CHUNKWISE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            chunk_size,
            chunk_pause,
            files_root,
            default_md_path,
        })
    }

    /// Creates the files root directory if it does not exist yet.
    pub fn ensure_files_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.files_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = settings_from(&[("CHUNKWISE_FILES_ROOT", "/tmp/cw")]).unwrap();

        assert_eq!(settings.openai_api_key, None);
        assert_eq!(settings.openai_base_url, None);
        assert_eq!(settings.model, "gpt-4-turbo-preview");
        assert_eq!(settings.chunk_size, 4000);
        assert_eq!(settings.chunk_pause, Duration::from_secs(1));
        assert_eq!(settings.files_root, PathBuf::from("/tmp/cw"));
        assert_eq!(settings.default_md_path, PathBuf::from("/tmp/cw/document.md"));
    }

    #[test]
    fn reads_every_variable() {
        let settings = settings_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("CHUNKWISE_MODEL", "gpt-4o-mini"),
            ("CHUNKWISE_CHUNK_SIZE", "1200"),
            ("CHUNKWISE_CHUNK_PAUSE_SECS", "0"),
            ("CHUNKWISE_FILES_ROOT", "/data"),
            ("CHUNKWISE_MD_PATH", "/data/paper/full.md"),
        ])
        .unwrap();

        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.openai_base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.chunk_size, 1200);
        assert_eq!(settings.chunk_pause, Duration::ZERO);
        assert_eq!(settings.default_md_path, PathBuf::from("/data/paper/full.md"));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let settings = settings_from(&[
            ("OPENAI_API_KEY", ""),
            ("CHUNKWISE_MODEL", "  "),
            ("CHUNKWISE_FILES_ROOT", "/r"),
        ])
        .unwrap();

        assert_eq!(settings.openai_api_key, None);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn invalid_chunk_size_is_rejected() {
        for bad in ["zero", "0", "-5"] {
            let result = settings_from(&[
                ("CHUNKWISE_FILES_ROOT", "/r"),
                ("CHUNKWISE_CHUNK_SIZE", bad),
            ]);
            let error = result.unwrap_err();
            assert!(error.to_string().contains("CHUNKWISE_CHUNK_SIZE"), "{}", bad);
        }
    }

    #[test]
    fn invalid_pause_is_rejected() {
        let result = settings_from(&[
            ("CHUNKWISE_FILES_ROOT", "/r"),
            ("CHUNKWISE_CHUNK_PAUSE_SECS", "1.5"),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "CHUNKWISE_CHUNK_PAUSE_SECS",
                ..
            })
        ));
    }

    #[test]
    fn ensure_files_root_creates_missing_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("data").join("chunkwise");
        let settings = settings_from(&[("CHUNKWISE_FILES_ROOT", root.to_str().unwrap())]).unwrap();

        settings.ensure_files_root().unwrap();
        assert!(root.is_dir());

        // Existing directory is fine.
        settings.ensure_files_root().unwrap();
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        unsafe {
            std::env::set_var("CHUNKWISE_FILES_ROOT", "/env-root");
            std::env::set_var("CHUNKWISE_MODEL", "env-model");
        }

        let settings = Settings::from_env();

        unsafe {
            std::env::remove_var("CHUNKWISE_FILES_ROOT");
            std::env::remove_var("CHUNKWISE_MODEL");
        }

        let settings = settings.unwrap();
        assert_eq!(settings.files_root, PathBuf::from("/env-root"));
        assert_eq!(settings.model, "env-model");
    }
}
