pub mod folder_scan;
pub mod rule_io;

pub use folder_scan::build_folder_map;
