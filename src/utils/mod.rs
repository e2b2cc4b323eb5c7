use std::{env, fs, path::Path, path::PathBuf, sync::Once};

use dirs::home_dir;

use crate::errors::PlannerError;

const DEFAULT_DIR_NAME: &str = ".payplan_core";
const PLANS_DIR: &str = "plans";
const STATE_FILE: &str = "state.json";
const CONFIG_FILE: &str = "config.json";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("payplan_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}

/// Returns the application data directory, defaulting to `~/.payplan_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("PAYPLAN_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one snapshot file per plan key.
pub fn plans_dir_in(base: &Path) -> PathBuf {
    base.join(PLANS_DIR)
}

/// Path to the shared state file (tracking the last opened plan).
pub fn state_file_in(base: &Path) -> PathBuf {
    base.join(STATE_FILE)
}

/// Path to the active configuration file.
pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn ensure_dir(path: &Path) -> Result<(), PlannerError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
