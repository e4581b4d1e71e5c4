use crate::core::repository::StoreFiles;
use crate::core::service::DeletePolicy;
use crate::core::ConfigProvider;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub hotels_file: String,
    pub customers_file: String,
    pub reservations_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let files = StoreFiles::default();
        Self {
            data_dir: "./data".to_string(),
            hotels_file: files.hotels,
            customers_file: files.customers,
            reservations_file: files.reservations,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub on_delete: DeletePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeskError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeskError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeskError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn store_files(&self) -> StoreFiles {
        StoreFiles {
            hotels: self.storage.hotels_file.clone(),
            customers: self.storage.customers_file.clone(),
            reservations: self.storage.reservations_file.clone(),
        }
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.policy.on_delete
    }
}

impl ConfigProvider for AppConfig {
    fn hotels_file(&self) -> &str {
        &self.storage.hotels_file
    }

    fn customers_file(&self) -> &str {
        &self.storage.customers_file
    }

    fn reservations_file(&self) -> &str {
        &self.storage.reservations_file
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        let config_error = |e: DeskError| DeskError::ConfigError {
            message: e.to_string(),
        };

        validate_non_empty_string("storage.data_dir", &self.storage.data_dir)
            .map_err(config_error)?;
        let files = [
            ("storage.hotels_file", &self.storage.hotels_file),
            ("storage.customers_file", &self.storage.customers_file),
            ("storage.reservations_file", &self.storage.reservations_file),
        ];
        for (field, value) in files {
            validate_non_empty_string(field, value).map_err(config_error)?;
        }

        if files[0].1 == files[1].1 || files[0].1 == files[2].1 || files[1].1 == files[2].1 {
            return Err(DeskError::ConfigError {
                message: "each collection needs its own store file".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(DeskError::ConfigError {
                message: format!(
                    "logging.level '{}' is not one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[storage]
data_dir = "/var/lib/front-desk"
hotels_file = "h.json"
customers_file = "c.json"
reservations_file = "r.json"

[policy]
on_delete = "cascade_cancel"

[logging]
level = "debug"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.storage.data_dir, "/var/lib/front-desk");
        assert_eq!(config.hotels_file(), "h.json");
        assert_eq!(config.delete_policy(), DeletePolicy::CascadeCancel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml_str("[policy]\n").unwrap();
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.reservations_file(), "reservations.json");
        assert_eq!(config.delete_policy(), DeletePolicy::Reject);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FRONT_DESK_TEST_DATA_DIR", "/tmp/front-desk-data");

        let toml_content = r#"
[storage]
data_dir = "${FRONT_DESK_TEST_DATA_DIR}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/front-desk-data");

        std::env::remove_var("FRONT_DESK_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let unknown_policy = AppConfig::from_toml_str("[policy]\non_delete = \"ignore\"\n");
        assert!(matches!(unknown_policy, Err(DeskError::ConfigError { .. })));

        let same_files = AppConfig::from_toml_str(
            "[storage]\nhotels_file = \"all.json\"\ncustomers_file = \"all.json\"\n",
        )
        .unwrap();
        assert!(same_files.validate().is_err());

        let bad_level = AppConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\ndata_dir = \"./file-data\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.storage.data_dir, "./file-data");

        let missing = AppConfig::from_file_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(missing.storage.data_dir, "./data");
    }
}
