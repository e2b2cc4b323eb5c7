use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::PlannerError;
use crate::plan::{BudgetPlan, CURRENT_SCHEMA_VERSION};
use crate::utils::{ensure_dir, plans_dir_in, state_file_in};

use super::{Result, StorageBackend};

const PLAN_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// JSON file backend: one snapshot file per plan key under the application
/// data directory, plus a small state file tracking the last opened plan.
#[derive(Clone)]
pub struct JsonStorage {
    plans_dir: PathBuf,
    state_file: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    last_plan: Option<String>,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let base = root.unwrap_or_else(crate::utils::app_data_dir);
        ensure_dir(&base)?;
        let plans_dir = plans_dir_in(&base);
        ensure_dir(&plans_dir)?;
        Ok(Self {
            plans_dir,
            state_file: state_file_in(&base),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    fn read_state(&self) -> Result<StoreState> {
        if self.state_file.exists() {
            let data = fs::read_to_string(&self.state_file)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(StoreState::default())
        }
    }
}

impl StorageBackend for JsonStorage {
    fn load_plan(&self, key: &str) -> Result<Option<BudgetPlan>> {
        let path = self.plan_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let plan: BudgetPlan = serde_json::from_str(&data)?;
        if plan.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(PlannerError::Persistence(format!(
                "plan schema v{} is newer than supported v{}",
                plan.schema_version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(Some(plan))
    }

    fn save_plan(&self, plan: &BudgetPlan, key: &str) -> Result<PathBuf> {
        let path = self.plan_path(key);
        let json = serde_json::to_string_pretty(plan)?;
        write_atomic(&path, &json)?;
        Ok(path)
    }

    fn plan_path(&self, key: &str) -> PathBuf {
        self.plans_dir
            .join(format!("{}.{}", canonical_key(key), PLAN_EXTENSION))
    }

    fn last_plan(&self) -> Result<Option<String>> {
        Ok(self.read_state()?.last_plan)
    }

    fn record_last_plan(&self, key: Option<&str>) -> Result<()> {
        let mut state = self.read_state().unwrap_or_default();
        state.last_plan = key.map(canonical_key);
        let data = serde_json::to_string_pretty(&state)?;
        write_atomic(&self.state_file, &data)?;
        Ok(())
    }
}

/// Slug applied to plan keys before they become file names.
fn canonical_key(key: &str) -> String {
    let mut slug = String::with_capacity(key.len());
    for ch in key.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else {
            slug.push('_');
        }
    }
    if slug.is_empty() {
        slug.push_str("default");
    }
    slug
}

/// Stages to a temporary sibling then renames, so readers never observe a
/// half-written snapshot.
fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_roundtrips() {
        let temp = tempdir().unwrap();
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).unwrap();
        let mut plan = BudgetPlan::new();
        plan.add_template("Water", 80.0, 25).unwrap();

        let path = storage.save_plan(&plan, "My Plan").unwrap();
        assert!(path.ends_with("my_plan.json"));

        let loaded = storage.load_plan("My Plan").unwrap().unwrap();
        assert_eq!(loaded.id, plan.id);
        assert_eq!(loaded.templates.len(), 1);
    }

    #[test]
    fn missing_plan_loads_as_none() {
        let temp = tempdir().unwrap();
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).unwrap();
        assert!(storage.load_plan("nothing").unwrap().is_none());
    }

    #[test]
    fn rejects_future_schema_versions() {
        let temp = tempdir().unwrap();
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).unwrap();
        let mut plan = BudgetPlan::new();
        plan.schema_version = CURRENT_SCHEMA_VERSION + 3;
        storage.save_plan(&plan, "future").unwrap();

        let err = storage.load_plan("future").unwrap_err();
        assert!(matches!(err, PlannerError::Persistence(message) if message.contains("newer")));
    }

    #[test]
    fn records_and_reads_last_plan() {
        let temp = tempdir().unwrap();
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(storage.last_plan().unwrap(), None);
        storage.record_last_plan(Some("Casa Grande")).unwrap();
        assert_eq!(storage.last_plan().unwrap(), Some("casa_grande".into()));
    }
}
