use once_cell::sync::Lazy;
use regex::Regex;

use crate::folder::utf7;

/// Logical name of the trash folder.
pub const TRASH: &str = "Trash";
/// Any physical path containing this is the trash folder.
pub const TRASH_MARKER: &str = "!Trash";
/// Suffix of a mailbox folder's index file.
pub const INDEX_SUFFIX: &str = ".ini";

const INBOX: &str = "INBOX";
const RESERVED_PREFIX: char = '#';

static INBOX_ROOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:#|^)(INBOX\[[0-9a-fA-F]+\])(?:\.(.*))?$").expect("inbox root pattern")
});

static INDEX_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9a-fA-F]+\]$").expect("index tag pattern"));

/// Turn a physical folder path (as found after `!M:`, or an index file name)
/// into a logical dotted path such as `INBOX.Archive`.
///
/// `45bee44e.mb\#account#INBOX[1f].&U3BSNw-[3a].ini` becomes `INBOX.印刷`.
pub fn decode_folder_path(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    if normalized.contains(TRASH_MARKER) {
        return TRASH.to_string();
    }

    let filename = normalized.rsplit('/').next().unwrap_or_default();
    let filename = filename.strip_suffix(INDEX_SUFFIX).unwrap_or(filename);

    let segments: Vec<&str> = match INBOX_ROOT.captures(filename) {
        Some(caps) => std::iter::once(INBOX)
            .chain(caps.get(2).into_iter().flat_map(|rest| rest.as_str().split('.')))
            .collect(),
        None => filename.split('.').collect(),
    };

    segments
        .into_iter()
        .map(|segment| utf7::decode(&INDEX_TAG.replace(segment, "")))
        .filter(|segment| !segment.is_empty() && !segment.starts_with(RESERVED_PREFIX))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_inbox_subfolder() {
        assert_eq!(decode_folder_path("#account#INBOX[1f].&U3BSNw-[3a].ini"), "INBOX.印刷");
        assert_eq!(
            decode_folder_path(r"45bee44e.mb\#account#INBOX[1f].&U3BSNw-[3a].ini"),
            "INBOX.印刷"
        );
    }

    #[test]
    fn test_inbox_root() {
        assert_eq!(decode_folder_path(r"45bee44e.mb\#account#INBOX[1f].ini"), "INBOX");
        assert_eq!(decode_folder_path("INBOX[2].ini"), "INBOX");
    }

    #[test]
    fn test_nested_subfolders() {
        assert_eq!(
            decode_folder_path(r"45bee44e.mb\#account#INBOX[1f].Archive[4].Print[1].ini"),
            "INBOX.Archive.Print"
        );
    }

    #[test]
    fn test_trash() {
        assert_eq!(decode_folder_path("!Trash"), "Trash");
        assert_eq!(decode_folder_path("directory/!Trash"), "Trash");
        assert_eq!(decode_folder_path(r"45bee44e.mb\!Trash\"), "Trash");
    }

    #[test]
    fn test_plain_filename() {
        assert_eq!(decode_folder_path(r"45bee44e.mb\Regex.ini"), "Regex");
        assert_eq!(decode_folder_path("Lists.Rust"), "Lists.Rust");
    }

    #[test]
    fn test_reserved_segments_dropped() {
        assert_eq!(decode_folder_path("#account.Work[2].ini"), "Work");
        assert_eq!(decode_folder_path("a..b"), "a.b");
    }

    #[test]
    fn test_undecodable_segment_kept() {
        assert_eq!(decode_folder_path("INBOX[1].&!!-.ini"), "INBOX.&!!-");
    }

    proptest! {
        #[test]
        fn trash_marker_always_wins(prefix in "[^!]*", suffix in ".*") {
            let raw = format!("{prefix}!Trash{suffix}");
            prop_assert_eq!(decode_folder_path(&raw), "Trash");
        }
    }
}
