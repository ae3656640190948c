//! TOML settings loading
//!
//! A settings file has two optional tables:
//!
//! ```toml
//! [queue]
//! name = "ingest"
//! max_backlog = 100000
//!
//! [logging]
//! level = "debug"
//! format = "ext"
//! ```

use crate::core::logging::LoggingConfig;
use crate::queue::{QueueConfig, QueueError, QueueResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> QueueResult<Self> {
        let settings: Self = toml::from_str(contents).map_err(|e| QueueError::Configuration {
            message: format!("failed to parse settings: {e}"),
        })?;
        settings.queue.validate()?;
        Ok(settings)
    }

    /// Read and validate a settings file
    pub async fn load(path: impl AsRef<Path>) -> QueueResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| QueueError::Configuration {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;

        Self::from_toml_str(&contents).map_err(|e| match e {
            QueueError::Configuration { message } => QueueError::Configuration {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::LogFormat;
    use std::io::Write;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_both_tables_parsed() {
        let settings = Settings::from_toml_str(
            r#"
            [queue]
            name = "ingest"
            max_backlog = 500

            [logging]
            level = "debug"
            format = "ext"
            color = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.queue.name, "ingest");
        assert_eq!(settings.queue.max_backlog, Some(500));
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Ext);
        assert!(!settings.logging.color);
    }

    #[test]
    fn test_invalid_queue_table_rejected() {
        let err = Settings::from_toml_str("[queue]\nevent_capacity = 0").unwrap_err();
        assert!(matches!(err, QueueError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_table_rejected() {
        let result = Settings::from_toml_str("[metrics]\nenabled = true");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\nname = \"from-file\"").unwrap();

        let settings = Settings::load(file.path()).await.unwrap();
        assert_eq!(settings.queue.name, "from-file");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        match Settings::load(&missing).await {
            Err(QueueError::Configuration { message }) => {
                assert!(message.contains("absent.toml"));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[queue]\nmax_backlog = \"lots\"").unwrap();

        match Settings::load(file.path()).await {
            Err(QueueError::Configuration { message }) => {
                assert!(message.contains(&file.path().display().to_string()));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }
}
