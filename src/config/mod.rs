use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::PlannerError;
use crate::plan::ScheduleSettings;
use crate::utils::{app_data_dir, config_file_in, ensure_dir};

/// User configuration: the period generator knobs plus the last opened plan
/// key for auto-load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_plan: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleSettings::default(),
            last_opened_plan: None,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, PlannerError> {
        Self::from_base(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, PlannerError> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self, PlannerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Missing configuration is not an error; defaults apply.
    pub fn load(&self) -> Result<Config, PlannerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), PlannerError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_when_no_file_exists() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.schedule.lookback_periods, 4);
        assert_eq!(config.schedule.total_periods, 12);
        assert_eq!(config.last_opened_plan, None);
    }

    #[test]
    fn save_and_load_roundtrips() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.schedule.floor_date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        config.schedule.total_periods = 26;
        config.last_opened_plan = Some("casa".into());
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.schedule.floor_date, config.schedule.floor_date);
        assert_eq!(loaded.schedule.total_periods, 26);
        assert_eq!(loaded.last_opened_plan.as_deref(), Some("casa"));
    }
}
