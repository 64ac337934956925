use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::GroupBy;

/// The file name looked up when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "griev.toml";

/// Configuration for the grievance tracker.
///
/// Controls where the complaint data set lives, how reports are grouped when
/// no grouping is requested, and how strictly data sets are checked on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Path of the complaint data set.
    ///
    /// The format (YAML or JSON) is chosen from the file extension.
    data: PathBuf,

    /// The grouping used by reports when none is given explicitly.
    group_by: GroupBy,

    /// Whether complaints that break a lifecycle invariant are skipped with a
    /// warning when a data set is loaded.
    ///
    /// When `false` (default) such a data set fails to load.
    pub allow_invalid: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: default_data(),
            group_by: GroupBy::default(),
            allow_invalid: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration if the file exists, and returns the defaults
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the path of the complaint data set.
    #[must_use]
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// Sets the path of the complaint data set.
    pub fn set_data(&mut self, data: PathBuf) {
        self.data = data;
    }

    /// Returns the default report grouping.
    #[must_use]
    pub const fn group_by(&self) -> GroupBy {
        self.group_by
    }

    /// Sets the default report grouping.
    pub const fn set_group_by(&mut self, group_by: GroupBy) {
        self.group_by = group_by;
    }
}

fn default_data() -> PathBuf {
    PathBuf::from("complaints.yaml")
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data")]
        data: PathBuf,

        #[serde(default)]
        group_by: GroupBy,

        #[serde(default)]
        allow_invalid: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data,
                group_by,
                allow_invalid,
            } => Self {
                data,
                group_by,
                allow_invalid,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            data: config.data,
            group_by: config.group_by,
            allow_invalid: config.allow_invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ndata = \"wards/all.json\"\ngroup_by = \"ward\"\nallow_invalid = true\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.data(), Path::new("wards/all.json"));
        assert_eq!(config.group_by(), GroupBy::Ward);
        assert!(config.allow_invalid);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ngroup_by = \"colour\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default();
        config.set_group_by(GroupBy::Priority);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
