//! Becky! Internet Mail `IFilter.def` rule files.
//!
//! ```text
//! :Begin ""
//! !M:45bee44e.mb\#account#INBOX[1f].Print[1].ini
//! @0:Subject:Invoice	O	I
//! $O:Sort=1
//! :End ""
//! ```
pub mod reader;
pub mod writer;

pub use reader::parse;
pub use writer::generate;

pub(crate) const BEGIN: &str = ":Begin";
pub(crate) const END: &str = ":End";
pub(crate) const FOLDER: &str = "!M:";
pub(crate) const DELETE: &str = "!D";
pub(crate) const COPY_MODE: &str = "$O:Sort=0";
pub(crate) const MOVE_MODE: &str = "$O:Sort=1";
pub(crate) const CONDITION: char = '@';
pub(crate) const FIELD_SEPARATOR: char = '\t';
