use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::folder::path::INDEX_SUFFIX;
use crate::folder::{decode_folder_path, FolderMap};

/// Map the logical folders of a Becky! mailbox directory to the physical
/// index paths `IFilter.def` refers to them by (`<dir name>\<file>.ini`).
///
/// A directory that does not exist gives an empty map; only `Trash` will
/// resolve through it.
pub fn build_folder_map(dir: &Path) -> Result<FolderMap> {
    let dir_token = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut map = FolderMap::new(dir_token.clone());

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "mailbox directory not found, folder map is empty");
            return Ok(map);
        }
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(INDEX_SUFFIX) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    for name in names {
        let logical = decode_folder_path(&name);
        debug!(file = %name, folder = %logical, "mapped folder");
        map.insert(logical, format!("{dir_token}\\{name}"));
    }

    Ok(map)
}
