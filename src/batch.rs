//! Conversion of every configured account in one run.
//!
//! Accounts are independent: a failure is logged and counted, and the run
//! moves on to the next account.
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::paths::{sieve_path, DEFAULT_SIEVE_DIR};
use crate::config::AccountMapping;
use crate::converter::{becky_to_sieve, sieve_to_becky, Conversion};
use crate::error::{Error, Result};
use crate::store::build_folder_map;
use crate::store::rule_io::{load_def, load_script, save_def, save_script, FILTER_FILE};
use crate::verify::VerifyOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `IFilter.def` to `<sieve dir>/<account>.sieve`
    ToSieve,
    /// `<sieve dir>/<account>.sieve` to `IFilter.def`
    ToBecky,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub sieve_dir: PathBuf,
    /// Write output without the round trip check.
    pub skip_verify: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            sieve_dir: PathBuf::from(DEFAULT_SIEVE_DIR),
            skip_verify: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub written: usize,
    /// Accounts without an input file.
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

enum Outcome {
    Written(PathBuf),
    Skipped,
}

pub fn run(direction: Direction, accounts: &[AccountMapping], options: &BatchOptions) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for mapping in accounts {
        let result = match direction {
            Direction::ToSieve => account_to_sieve(mapping, options),
            Direction::ToBecky => account_to_becky(mapping, options),
        };
        match result {
            Ok(Outcome::Written(path)) => {
                info!(account = %mapping.account, path = %path.display(), "wrote rules");
                summary.written += 1;
            }
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                error!(account = %mapping.account, "conversion failed: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

fn account_to_sieve(mapping: &AccountMapping, options: &BatchOptions) -> Result<Outcome> {
    let def_path = mapping.path.join(FILTER_FILE);
    if !def_path.is_file() {
        warn!(account = %mapping.account, path = %def_path.display(), "no IFilter.def, skipping");
        return Ok(Outcome::Skipped);
    }

    info!(account = %mapping.account, "converting IFilter.def to SIEVE");
    let text = load_def(&def_path)?;
    let verify = (!options.skip_verify).then_some(VerifyOptions { expand_lists: false });
    let conversion = becky_to_sieve(&text, verify);
    accept(mapping, &conversion)?;

    let out = output_path(Direction::ToSieve, mapping, &options.sieve_dir);
    save_script(&out, &conversion.output)?;
    Ok(Outcome::Written(out))
}

fn account_to_becky(mapping: &AccountMapping, options: &BatchOptions) -> Result<Outcome> {
    let script_path = sieve_path(&options.sieve_dir, &mapping.account);
    if !script_path.is_file() {
        warn!(account = %mapping.account, path = %script_path.display(), "no SIEVE script, skipping");
        return Ok(Outcome::Skipped);
    }
    if !mapping.path.is_dir() {
        warn!(path = %mapping.path.display(), "mailbox directory not found, folders will not resolve");
    }

    info!(account = %mapping.account, "converting SIEVE to IFilter.def");
    let text = load_script(&script_path)?;
    let folders = build_folder_map(&mapping.path)?;
    let verify = (!options.skip_verify).then_some(VerifyOptions { expand_lists: true });
    let conversion = sieve_to_becky(&text, &folders, verify);
    accept(mapping, &conversion)?;

    let out = output_path(Direction::ToBecky, mapping, &options.sieve_dir);
    save_def(&out, &conversion.output)?;
    Ok(Outcome::Written(out))
}

fn accept(mapping: &AccountMapping, conversion: &Conversion) -> Result<()> {
    if conversion.is_accepted() {
        Ok(())
    } else {
        Err(Error::Rejected {
            account: mapping.account.clone(),
        })
    }
}

/// Path the batch writes for `mapping` in `direction`.
pub fn output_path(direction: Direction, mapping: &AccountMapping, sieve_dir: &Path) -> PathBuf {
    match direction {
        Direction::ToSieve => sieve_path(sieve_dir, &mapping.account),
        Direction::ToBecky => mapping.path.join(FILTER_FILE),
    }
}
