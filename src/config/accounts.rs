use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One Becky! mailbox and the name its SIEVE script is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    pub account: String,
    /// The mailbox directory holding `IFilter.def` and the folder indexes.
    pub path: PathBuf,
}

pub fn load_accounts(path: &Path) -> Result<Vec<AccountMapping>> {
    let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_accounts(&data)
}

pub fn parse_accounts(data: &str) -> Result<Vec<AccountMapping>> {
    Ok(serde_json::from_str(data)?)
}
