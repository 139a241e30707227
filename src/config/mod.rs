pub mod accounts;
pub mod paths;

pub use accounts::{load_accounts, AccountMapping};
