//! Round-trip verification of generated output.
//!
//! The generated text is read back with the reader of the other format and
//! compared with the rules it was generated from. A different rule count or
//! destination folder is a hard failure and the output must not be written.
//! Differences in the condition sets are only reported: quoting and list
//! representation legitimately differ between the two formats.
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::model::{Condition, ConditionValue, Rule};
use crate::{becky, sieve};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Compare every element of a list value as a condition of its own.
    pub expand_lists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardFailure {
    #[error("rule count mismatch: {expected} in the source, {actual} after re-reading")]
    RuleCount { expected: usize, actual: usize },
    #[error("rule #{rule}: folder mismatch, {expected:?} became {actual:?}")]
    FolderMismatch {
        rule: usize,
        expected: Option<String>,
        actual: Option<String>,
    },
}

/// A lowercased header with a whitespace-normalized value.
pub type ConditionKey = (String, String);

/// Conditions of one rule that did not survive the round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDrift {
    /// 1-based rule number.
    pub rule: usize,
    pub missing: BTreeSet<ConditionKey>,
    pub unexpected: BTreeSet<ConditionKey>,
}

impl fmt::Display for ConditionDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{}: conditions differ", self.rule)?;
        for (label, keys) in [("missing", &self.missing), ("unexpected", &self.unexpected)] {
            if keys.is_empty() {
                continue;
            }
            let keys = keys
                .iter()
                .map(|(header, value)| format!("{header}: {value:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "; {label}: {keys}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub failure: Option<HardFailure>,
    pub warnings: Vec<ConditionDrift>,
}

impl Verification {
    /// Whether the output may be persisted. Warnings do not count.
    pub fn is_accepted(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Some(failure) => writeln!(f, "verification failed: {failure}")?,
            None => writeln!(f, "verification passed")?,
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {warning}")?;
        }
        Ok(())
    }
}

/// Compare `original` with the rules read back from generated output.
pub fn compare(original: &[Rule], reparsed: &[Rule], options: VerifyOptions) -> Verification {
    let mut verification = Verification::default();

    if original.len() != reparsed.len() {
        let failure = HardFailure::RuleCount {
            expected: original.len(),
            actual: reparsed.len(),
        };
        error!(%failure, "round trip verification failed");
        verification.failure = Some(failure);
        return verification;
    }

    for (i, (before, after)) in original.iter().zip(reparsed).enumerate() {
        let rule = i + 1;
        if before.folder() != after.folder() {
            let failure = HardFailure::FolderMismatch {
                rule,
                expected: before.folder().map(str::to_string),
                actual: after.folder().map(str::to_string),
            };
            error!(%failure, "round trip verification failed");
            verification.failure = Some(failure);
            return verification;
        }

        let expected = condition_keys(&before.conditions, options);
        let actual = condition_keys(&after.conditions, options);
        if expected != actual {
            let drift = ConditionDrift {
                rule,
                missing: expected.difference(&actual).cloned().collect(),
                unexpected: actual.difference(&expected).cloned().collect(),
            };
            warn!(%drift, "condition drift");
            verification.warnings.push(drift);
        }
    }

    info!(
        rules = original.len(),
        warnings = verification.warnings.len(),
        "round trip verified"
    );
    verification
}

/// Verify Sieve text generated from `original`.
pub fn verify_sieve_output(original: &[Rule], generated: &str, options: VerifyOptions) -> Verification {
    compare(original, &sieve::parse(generated), options)
}

/// Verify an `IFilter.def` generated from `original`.
pub fn verify_becky_output(original: &[Rule], generated: &str, options: VerifyOptions) -> Verification {
    compare(original, &becky::parse(generated), options)
}

fn condition_keys(conditions: &[Condition], options: VerifyOptions) -> BTreeSet<ConditionKey> {
    let mut keys = BTreeSet::new();
    for condition in conditions {
        let header = condition.header.to_string().to_lowercase();
        match &condition.value {
            ConditionValue::List(items) if options.expand_lists => {
                for item in items {
                    keys.insert((header.clone(), normalize_whitespace(item)));
                }
            }
            ConditionValue::List(items) => {
                let joined = items
                    .iter()
                    .map(|item| normalize_whitespace(item))
                    .collect::<Vec<_>>()
                    .join(", ");
                keys.insert((header, format!("[{joined}]")));
            }
            ConditionValue::Scalar(value) => {
                keys.insert((header, normalize_whitespace(value)));
            }
        }
    }
    keys
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
