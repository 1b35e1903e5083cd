use std::path::Path;

use serde::Deserialize;

use crate::form::{AttachmentPolicy, FormOptions};

/// Engine-wide settings, usually loaded from a `localhunt.toml`.
///
/// ```toml
/// [form]
/// reset_on_success = true
/// preview_debounce_ms = 150
///
/// [attachments]
/// max_bytes = 5242880
/// allowed_mime_types = ["application/pdf", "image/png"]
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub form: FormOptions,
    pub attachments: AttachmentPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("attachment policy must allow at least one MIME type")]
    NoAllowedTypes,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        if config.attachments.allowed_mime_types.is_empty() {
            return Err(ConfigError::NoAllowedTypes);
        }
        tracing::debug!(
            reset_on_success = config.form.reset_on_success,
            preview_debounce_ms = config.form.preview_debounce_ms,
            max_bytes = config.attachments.max_bytes,
            "engine config loaded"
        );
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ALLOWED_ATTACHMENT_TYPES, MAX_ATTACHMENT_BYTES};

    #[test]
    fn empty_source_yields_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.attachments.max_bytes, MAX_ATTACHMENT_BYTES);
        assert_eq!(
            config.attachments.allowed_mime_types,
            ALLOWED_ATTACHMENT_TYPES.map(String::from).to_vec()
        );
        assert!(!config.form.reset_on_success);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [form]
            preview_debounce_ms = 150

            [attachments]
            max_bytes = 1048576
            "#,
        )
        .expect("partial config parses");
        assert_eq!(config.form.preview_debounce_ms, 150);
        assert!(!config.form.reset_on_success);
        assert_eq!(config.attachments.max_bytes, 1024 * 1024);
        assert_eq!(config.attachments.allowed_mime_types.len(), 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = EngineConfig::from_toml_str("[form]\nautosave = true\n")
            .expect_err("unknown key must fail");
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("autosave"));
    }

    #[test]
    fn empty_type_list_is_rejected() {
        let error = EngineConfig::from_toml_str("[attachments]\nallowed_mime_types = []\n")
            .expect_err("no types allowed");
        assert!(matches!(error, ConfigError::NoAllowedTypes));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = EngineConfig::load("/nonexistent/localhunt.toml").expect_err("missing file");
        assert!(error.to_string().contains("/nonexistent/localhunt.toml"));
    }
}
