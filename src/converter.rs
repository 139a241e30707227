//! One-shot conversions between `IFilter.def` text and SIEVE text.
//!
//! `becky_to_sieve()`: parse def → rules → emit sieve → verify
//! `sieve_to_becky()`: parse sieve → rules → generate def → verify
use tracing::debug;

use crate::folder::FolderMap;
use crate::model::Rule;
use crate::verify::{self, Verification, VerifyOptions};
use crate::{becky, sieve};

#[derive(Debug, Clone)]
pub struct Conversion {
    /// Rules read from the input.
    pub rules: Vec<Rule>,
    /// Generated text in the other format.
    pub output: String,
    /// `None` when verification was skipped.
    pub verification: Option<Verification>,
}

impl Conversion {
    /// Skipped verification counts as accepted.
    pub fn is_accepted(&self) -> bool {
        self.verification.as_ref().map_or(true, Verification::is_accepted)
    }
}

/// Convert an `IFilter.def` to a SIEVE script.
pub fn becky_to_sieve(text: &str, verify: Option<VerifyOptions>) -> Conversion {
    let rules = becky::parse(text);
    debug!(rules = rules.len(), "read IFilter.def");

    let output = sieve::emit(&rules);
    let verification = verify.map(|options| verify::verify_sieve_output(&rules, &output, options));

    Conversion {
        rules,
        output,
        verification,
    }
}

/// Convert a SIEVE script to an `IFilter.def`, resolving destination
/// folders through `folders`.
pub fn sieve_to_becky(text: &str, folders: &FolderMap, verify: Option<VerifyOptions>) -> Conversion {
    let rules = sieve::parse(text);
    debug!(rules = rules.len(), folders = folders.len(), "read SIEVE script");

    let output = becky::generate(&rules, folders);
    let verification = verify.map(|options| verify::verify_becky_output(&rules, &output, options));

    Conversion {
        rules,
        output,
        verification,
    }
}
