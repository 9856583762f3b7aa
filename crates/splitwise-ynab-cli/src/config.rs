use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use splitwise_ynab::{GroupFilter, WatermarkPolicy};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "splitwise-ynab.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSplitwise {
    pub api_key: String,
    /// `0` or absent means every group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
}

impl ConfigSplitwise {
    pub fn group(&self) -> GroupFilter {
        GroupFilter::from_group_id(self.group_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigYnab {
    pub access_token: String,
    pub budget: String,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSync {
    /// Everything changed after this instant still needs reconciling.
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub watermark: WatermarkPolicy,
}

/// Credentials plus the persisted sync state. Rewritten after every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub splitwise: ConfigSplitwise,
    pub ynab: ConfigYnab,
    pub sync: ConfigSync,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Write the config back, replacing the file only once it is fully written.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write config file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace config file: {}", path.display()))?;
        Ok(())
    }

    /// `splitwise-ynab.toml` next to the running executable.
    pub fn default_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        let dir = exe
            .parent()
            .with_context(|| format!("Executable has no parent directory: {}", exe.display()))?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE: &str = r#"
[splitwise]
api_key = "sw-key"

[ynab]
access_token = "ynab-token"
budget = "My Budget"
account = "Splitwise"

[sync]
last_update = "2023-01-01T00:00:00Z"
"#;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn load_minimal() {
        let (_dir, path) = write_config(EXAMPLE);
        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config.splitwise.group(), GroupFilter::All);
        assert_eq!(config.ynab.account, "Splitwise");
        assert_eq!(
            config.sync.last_update,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(config.sync.watermark, WatermarkPolicy::RunStart);
    }

    #[test]
    fn load_group_and_policy() {
        let contents = EXAMPLE
            .replace("api_key = \"sw-key\"", "api_key = \"sw-key\"\ngroup_id = 391")
            .replace(
                "last_update = \"2023-01-01T00:00:00Z\"",
                "last_update = \"2023-01-01T00:00:00Z\"\nwatermark = \"latest-seen\"",
            );
        let (_dir, path) = write_config(&contents);
        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config.splitwise.group(), GroupFilter::Group(391));
        assert_eq!(config.sync.watermark, WatermarkPolicy::LatestSeen);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(
            err.to_string().starts_with("Failed to read config file:"),
            "{err}"
        );
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let (_dir, path) = write_config(&format!("{EXAMPLE}\n[extra]\nkey = 1\n"));
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
    }

    #[test]
    fn load_requires_watermark() {
        let contents = EXAMPLE.replace("last_update = \"2023-01-01T00:00:00Z\"", "");
        let (_dir, path) = write_config(&contents);
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("last_update"), "{err:#}");
    }

    #[test]
    fn save_round_trips_with_new_watermark() {
        let (dir, path) = write_config(EXAMPLE);
        let mut config = Config::load_from_file(&path).unwrap();
        config.sync.last_update = Utc.with_ymd_and_hms(2023, 3, 4, 5, 6, 7).unwrap();
        config.save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(
            written.contains(r#"last_update = "2023-03-04T05:06:07Z""#),
            "{written}"
        );
        assert!(written.contains(r#"access_token = "ynab-token""#), "{written}");
        assert!(!written.contains("group_id"), "{written}");

        let reloaded = Config::load_from_file(&path).unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
