//! Emit SIEVE script text from rules.
use std::collections::BTreeSet;
use tracing::debug;

use crate::model::{Action, Condition, ConditionValue, HeaderField, MatchKind, Rule};
use crate::sieve::{CASE_SENSITIVE_COMPARATOR, WILDCARD};

const INDENT: &str = "    ";

/// Headers rendered with an `address` test rather than `header`.
const ADDRESS_HEADERS: &[&str] = &["from", "to", "cc", "bcc"];

pub fn emit(rules: &[Rule]) -> String {
    let requires = compute_requires(rules)
        .iter()
        .map(|ext| format!("\"{ext}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = format!("require [{requires}];\n");

    for (i, rule) in rules.iter().enumerate() {
        if rule.conditions.is_empty() {
            debug!(rule = i + 1, "rule has no conditions, skipping");
            continue;
        }
        out.push('\n');
        out.push_str(&format!("# {}. {}\n", i + 1, rule.folder().unwrap_or("Action Only")));
        emit_rule(&mut out, rule);
    }

    out
}

fn emit_rule(out: &mut String, rule: &Rule) {
    match rule.conditions.as_slice() {
        [single] => {
            out.push_str("if ");
            emit_test(out, single);
            out.push_str(" {\n");
        }
        conditions => {
            out.push_str("if anyof (\n");
            let tests = conditions
                .iter()
                .map(|c| {
                    let mut test = String::from(INDENT);
                    emit_test(&mut test, c);
                    test
                })
                .collect::<Vec<_>>();
            out.push_str(&tests.join(",\n"));
            out.push_str("\n) {\n");
        }
    }

    if let Some(folder) = rule.folder() {
        out.push_str(&format!("{INDENT}fileinto \"{}\";\n", escape_sieve_string(folder)));
    }
    for action in &rule.actions {
        match action {
            Action::FileInto(_) => {}
            Action::Discard => out.push_str(&format!("{INDENT}discard;\n")),
            Action::Keep => out.push_str(&format!("{INDENT}keep;\n")),
        }
    }
    out.push_str(&format!("{INDENT}stop;\n}}\n"));
}

fn emit_test(out: &mut String, condition: &Condition) {
    let kind = condition.flags.match_kind();

    let command = match &condition.header {
        HeaderField::Body => "body",
        HeaderField::Names(names) if is_address_test(names) => "address",
        HeaderField::Names(_) => "header",
    };
    out.push_str(command);
    out.push(' ');
    out.push_str(kind.as_sieve());

    if !condition.flags.is_case_insensitive() {
        out.push_str(&format!(" :comparator \"{CASE_SENSITIVE_COMPARATOR}\""));
    }

    if let HeaderField::Names(names) = &condition.header {
        out.push(' ');
        emit_string_or_list(out, names);
    }

    let keys: Vec<String> = condition
        .value
        .iter()
        .map(|v| match kind {
            MatchKind::Prefix => format!("{v}{WILDCARD}"),
            _ => v.clone(),
        })
        .collect();
    out.push(' ');
    match &condition.value {
        ConditionValue::Scalar(_) => emit_string(out, &keys[0]),
        ConditionValue::List(_) => emit_list(out, &keys),
    }
}

fn is_address_test(names: &[String]) -> bool {
    match names {
        [name] => ADDRESS_HEADERS.contains(&name.to_ascii_lowercase().as_str()),
        _ => false,
    }
}

fn emit_string_or_list(out: &mut String, items: &[String]) {
    if items.len() == 1 {
        emit_string(out, &items[0]);
    } else {
        emit_list(out, items);
    }
}

fn emit_string(out: &mut String, s: &str) {
    out.push_str(&format!("\"{}\"", escape_sieve_string(s)));
}

fn emit_list(out: &mut String, items: &[String]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        emit_string(out, item);
    }
    out.push(']');
}

pub fn escape_sieve_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Compute what `require` extensions a rule set needs, sorted.
pub fn compute_requires(rules: &[Rule]) -> Vec<&'static str> {
    let mut requires = BTreeSet::from(["fileinto", "mailbox"]);

    for condition in rules.iter().flat_map(|r| &r.conditions) {
        if condition.flags.match_kind() == MatchKind::Regex {
            requires.insert("regex");
        }
        if condition.header.is_body() {
            requires.insert("body");
        }
    }

    requires.into_iter().collect()
}
