//! Becky! folder naming: physical index paths, logical dotted paths and the
//! modified UTF-7 used inside them.
pub mod map;
pub mod path;
pub mod utf7;

pub use map::FolderMap;
pub use path::{decode_folder_path, TRASH};
pub use utf7::{decode as decode_mailbox_name, encode as encode_mailbox_name};
