use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Account mapping picked up from the working directory.
pub const LOCAL_CONFIG: &str = "becky.json";
const ACCOUNTS_FILE: &str = "accounts.json";

/// Default output directory of SIEVE scripts, relative to the working
/// directory.
pub const DEFAULT_SIEVE_DIR: &str = "config/sieve";

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sievebridge").map(|d| d.config_dir().to_path_buf())
}

/// The account mapping to use: `explicit` if given, then `./becky.json`,
/// then `accounts.json` in the user configuration directory.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let local = Path::new(LOCAL_CONFIG);
    if local.is_file() {
        return Ok(local.to_path_buf());
    }
    config_dir()
        .map(|d| d.join(ACCOUNTS_FILE))
        .ok_or(Error::NoConfigDir)
}

/// `<sieve dir>/<account>.sieve`
pub fn sieve_path(sieve_dir: &Path, account: &str) -> PathBuf {
    sieve_dir.join(format!("{account}.sieve"))
}
