//! Configuration loading and validation.

mod types;
pub mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl DatabaseConfig {
    /// Build a tokio-postgres connection string carrying the credentials.
    pub fn full_connection_string(&self) -> String {
        format!(
            "{} user={} password={}",
            self.connection_string, self.user, self.password
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
remote:
  endpoint: "https://api.example.com/2/0"
  workspace_id: "ws-1"
  model_id: "model-1"
  auth_token: "token"
database:
  connection_string: "host=localhost port=5432 dbname=plans"
  user: "plans"
  password: "secret"
  query: "INSERT INTO lines (a, b) VALUES ($1, $2)"
transfer:
  batch_size: 250
  separator: ";"
"#;

    #[test]
    fn test_from_yaml_applies_defaults() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.transfer.batch_size, 250);
        assert_eq!(config.transfer.separator, ';');
        // Unspecified knobs fall back to defaults.
        assert_eq!(config.transfer.max_retry_count, 5);
        assert_eq!(config.transfer.page_size, 500);
        assert!(!config.database.stored_procedure);
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        let broken = YAML.replace("password: \"secret\"", "password: \"\"");
        assert!(Config::from_yaml(&broken).is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", YAML).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.remote.workspace_id, "ws-1");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("no_such_config.yaml").unwrap_err();
        assert!(matches!(err, crate::error::SyncError::Io(_)));
    }

    #[test]
    fn test_full_connection_string() {
        let config = Config::from_yaml(YAML).unwrap();
        let conn = config.database.full_connection_string();
        assert!(conn.contains("user=plans"));
        assert!(conn.contains("password=secret"));
    }
}
