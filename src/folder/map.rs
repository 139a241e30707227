use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::folder::path::{TRASH, TRASH_MARKER};

/// Logical folder path → physical path token of one Becky! mailbox.
///
/// Built by scanning the mailbox directory (see
/// [`crate::store::folder_scan::build_folder_map`]); the trash folder needs
/// no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMap {
    mailbox_dir: String,
    entries: BTreeMap<String, String>,
}

impl FolderMap {
    /// `mailbox_dir` is the directory token physical paths are relative to,
    /// e.g. `45bee44e.mb`.
    pub fn new(mailbox_dir: impl Into<String>) -> Self {
        Self {
            mailbox_dir: mailbox_dir.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn mailbox_dir(&self) -> &str {
        &self.mailbox_dir
    }

    pub fn insert(&mut self, logical: impl Into<String>, physical: impl Into<String>) {
        self.entries.insert(logical.into(), physical.into());
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn trash_path(&self) -> String {
        if self.mailbox_dir.is_empty() {
            format!("{TRASH_MARKER}\\")
        } else {
            format!("{}\\{TRASH_MARKER}\\", self.mailbox_dir)
        }
    }

    /// Physical path for a logical folder. `Trash` always resolves.
    pub fn resolve(&self, logical: &str) -> Option<String> {
        if logical == TRASH {
            Some(self.trash_path())
        } else {
            self.get(logical).map(str::to_string)
        }
    }
}
