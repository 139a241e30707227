use encoding_rs::SHIFT_JIS;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};

/// Name of the rule file inside a Becky! mailbox directory.
pub const FILTER_FILE: &str = "IFilter.def";

/// Read an `IFilter.def`. Becky! writes them in Shift_JIS (CP932); bytes that
/// do not decode are replaced.
pub fn load_def(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
    if had_errors {
        warn!(path = %path.display(), "invalid Shift_JIS sequences replaced");
    }
    Ok(text.into_owned())
}

/// Write an `IFilter.def` in Shift_JIS.
pub fn save_def(path: &Path, text: &str) -> Result<()> {
    let (bytes, _, unmappable) = SHIFT_JIS.encode(text);
    if unmappable {
        warn!(path = %path.display(), "characters without a Shift_JIS mapping written as references");
    }
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

pub fn load_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write a SIEVE script, creating its directory as needed.
pub fn save_script(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_is_shift_jis() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(FILTER_FILE);
        let text = "@0:Subject:請求書\tO\tI\n";

        save_def(&path, text).unwrap();
        let raw = fs::read(&path).unwrap();
        assert!(std::str::from_utf8(&raw).is_err());
        assert_eq!(raw.len(), text.len() - 9 + 6);

        assert_eq!(load_def(&path).unwrap(), text);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(FILTER_FILE);
        fs::write(&path, b"ok\x81").unwrap();
        assert_eq!(load_def(&path).unwrap(), "ok\u{FFFD}");
    }

    #[test]
    fn test_script_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config/sieve/work.sieve");
        save_script(&path, "require [\"fileinto\"];\n").unwrap();
        assert_eq!(load_script(&path).unwrap(), "require [\"fileinto\"];\n");
    }

    #[test]
    fn test_missing_file() {
        let err = load_def(Path::new("/nonexistent/IFilter.def")).unwrap_err();
        assert!(err.to_string().starts_with("/nonexistent/IFilter.def: "));
    }
}
