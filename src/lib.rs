//! Convert mail filtering rules between Becky! Internet Mail's `IFilter.def`
//! and SIEVE scripts, checking every conversion by reading the output back.
pub mod batch;
pub mod becky;
pub mod config;
pub mod converter;
pub mod error;
pub mod folder;
pub mod model;
pub mod sieve;
pub mod store;
pub mod verify;

pub use error::{Error, Result};
