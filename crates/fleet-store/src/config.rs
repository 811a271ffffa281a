//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::queries::DEFAULT_RESULT_LIMIT;

/// Largest accepted `queries.result_limit`.
pub const MAX_RESULT_LIMIT: u32 = 10_000;

/// Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend location and table names.
    pub backend: BackendConfig,
    /// Query composition settings.
    pub queries: QueryConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file is not an error; defaults are returned instead.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.as_ref().display());
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// # Example
    ///
    /// ```
    /// use fleet_store::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.backend.validate();
        errors.extend(self.queries.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Backend settings.
///
/// Contact points are only carried here for the connector that builds the
/// [`Session`](crate::Session); this crate never dials them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Cluster contact points (host or host:port).
    pub contact_points: Vec<String>,
    /// Keyspace holding the telemetry tables.
    pub keyspace: String,
    /// Table with the latest reading per vehicle.
    pub current_table: String,
    /// Table with the full reading history.
    pub historical_table: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            contact_points: vec!["127.0.0.1".to_string()],
            keyspace: "datastax".to_string(),
            current_table: "vehicle_current_reading".to_string(),
            historical_table: "vehicle_historical_readings".to_string(),
        }
    }
}

impl BackendConfig {
    /// `keyspace.current_table`.
    pub fn current_table_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.current_table)
    }

    /// `keyspace.historical_table`.
    pub fn historical_table_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.historical_table)
    }

    /// Validate backend configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.contact_points.is_empty() {
            errors.push(ValidationError {
                field: "backend.contact_points".to_string(),
                message: "at least one contact point is required".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for (i, point) in self.contact_points.iter().enumerate() {
            let field = format!("backend.contact_points[{}]", i);
            if point.trim().is_empty() {
                errors.push(ValidationError {
                    field,
                    message: "contact point cannot be empty".to_string(),
                });
            } else if !seen.insert(point.to_lowercase()) {
                errors.push(ValidationError {
                    field,
                    message: format!("duplicate contact point '{}'", point),
                });
            }
        }

        for (field, value) in [
            ("backend.keyspace", &self.keyspace),
            ("backend.current_table", &self.current_table),
            ("backend.historical_table", &self.historical_table),
        ] {
            if let Some(message) = identifier_problem(value) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message,
                });
            }
        }

        errors
    }
}

fn identifier_problem(value: &str) -> Option<String> {
    if value.is_empty() {
        Some("name cannot be empty".to_string())
    } else if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(format!(
            "invalid name '{}': only letters, digits and '_' are allowed",
            value
        ))
    } else {
        None
    }
}

/// Query composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Row limit for list operations. The latest-reading lookup always
    /// uses 1.
    pub result_limit: u32,
    /// Reject filter text and vehicle ids that would terminate the
    /// statement literal, instead of embedding them verbatim.
    pub reject_unsafe_filters: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            result_limit: DEFAULT_RESULT_LIMIT,
            reject_unsafe_filters: false,
        }
    }
}

impl QueryConfig {
    /// Validate query configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.result_limit == 0 {
            errors.push(ValidationError {
                field: "queries.result_limit".to_string(),
                message: "result limit cannot be 0".to_string(),
            });
        } else if self.result_limit > MAX_RESULT_LIMIT {
            errors.push(ValidationError {
                field: "queries.result_limit".to_string(),
                message: format!(
                    "result limit {} is too large (maximum {})",
                    self.result_limit, MAX_RESULT_LIMIT
                ),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The field path (e.g., `backend.keyspace` or `backend.contact_points[0]`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet")
        .join("store.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend.contact_points, vec!["127.0.0.1"]);
        assert_eq!(config.backend.keyspace, "datastax");
        assert_eq!(config.queries.result_limit, 100);
        assert!(!config.queries.reject_unsafe_filters);
    }

    #[test]
    fn test_table_names() {
        let backend = BackendConfig::default();
        assert_eq!(
            backend.current_table_name(),
            "datastax.vehicle_current_reading"
        );
        assert_eq!(
            backend.historical_table_name(),
            "datastax.vehicle_historical_readings"
        );
    }

    #[test]
    fn test_config_partial_toml_uses_defaults() {
        let toml = r#"
            [backend]
            keyspace = "fleet"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.keyspace, "fleet");
        assert_eq!(config.backend.current_table, "vehicle_current_reading");
        assert_eq!(config.queries, QueryConfig::default());
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            [backend]
            contact_points = ["10.0.0.1", "10.0.0.2:9042"]
            keyspace = "telemetry"
            current_table = "current"
            historical_table = "history"

            [queries]
            result_limit = 250
            reject_unsafe_filters = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.contact_points.len(), 2);
        assert_eq!(config.backend.historical_table_name(), "telemetry.history");
        assert_eq!(config.queries.result_limit, 250);
        assert!(config.queries.reject_unsafe_filters);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("store.toml");

        let config = Config {
            backend: BackendConfig {
                contact_points: vec!["node1".to_string()],
                keyspace: "ks".to_string(),
                ..BackendConfig::default()
            },
            queries: QueryConfig {
                result_limit: 20,
                reject_unsafe_filters: true,
            },
        };

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/store.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "this is not valid { toml").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_validated_rejects_bad_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        std::fs::write(&config_path, "[queries]\nresult_limit = 0\n").unwrap();

        let result = Config::load_validated(&config_path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("fleet/store.toml"));
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_contact_point_validation() {
        let backend = BackendConfig {
            contact_points: vec![],
            ..BackendConfig::default()
        };
        assert_eq!(backend.validate().len(), 1);

        let backend = BackendConfig {
            contact_points: vec!["Node1".to_string(), "node1".to_string(), " ".to_string()],
            ..BackendConfig::default()
        };
        let errors = backend.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "backend.contact_points[1]");
        assert!(errors[0].message.contains("duplicate"));
        assert_eq!(errors[1].field, "backend.contact_points[2]");
    }

    #[test]
    fn test_identifier_validation() {
        let backend = BackendConfig {
            keyspace: String::new(),
            current_table: "bad-name".to_string(),
            historical_table: "ok_name_2".to_string(),
            ..BackendConfig::default()
        };
        let errors = backend.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "backend.keyspace");
        assert_eq!(errors[1].field, "backend.current_table");
        assert!(errors[1].message.contains("bad-name"));
    }

    #[test]
    fn test_result_limit_validation() {
        let ok = QueryConfig {
            result_limit: MAX_RESULT_LIMIT,
            ..QueryConfig::default()
        };
        assert!(ok.validate().is_empty());

        let too_big = QueryConfig {
            result_limit: MAX_RESULT_LIMIT + 1,
            ..QueryConfig::default()
        };
        assert!(too_big.validate()[0].message.contains("too large"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let config = Config {
            queries: QueryConfig {
                result_limit: 0,
                ..QueryConfig::default()
            },
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        let display = err.to_string();
        assert!(display.contains("Configuration validation failed"));
        assert!(display.contains("  - queries.result_limit: result limit cannot be 0"));
    }
}
