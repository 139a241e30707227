use tracing::debug;

use crate::becky::{BEGIN, CONDITION, COPY_MODE, DELETE, END, FIELD_SEPARATOR, FOLDER};
use crate::folder::decode_folder_path;
use crate::model::{Action, Condition, ConditionValue, HeaderField, MatchFlags, Operator, Rule};

const LIST_SEPARATOR: &str = "\", \"";

enum State {
    Outside,
    InsideRule(Rule),
}

/// Parse an `IFilter.def` into its rules.
///
/// Parsing is best-effort: unknown directives are ignored and blocks that
/// lack a condition or an action are dropped.
pub fn parse(text: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut state = State::Outside;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(BEGIN) {
            if let State::InsideRule(_) = state {
                debug!(line = lineno + 1, "rule block opened before the previous one closed");
            }
            state = State::InsideRule(Rule::default());
            continue;
        }

        if line.starts_with(END) {
            if let State::InsideRule(rule) = std::mem::replace(&mut state, State::Outside) {
                if rule.is_well_formed() {
                    rules.push(rule);
                } else {
                    debug!(line = lineno + 1, "dropping incomplete rule block");
                }
            }
            continue;
        }

        let State::InsideRule(rule) = &mut state else {
            continue;
        };

        if let Some(path) = line.strip_prefix(FOLDER) {
            rule.set_folder(decode_folder_path(path));
        } else if line.starts_with(DELETE) {
            rule.add_action(Action::Discard);
        } else if line.starts_with(COPY_MODE) {
            rule.add_action(Action::Keep);
        } else if let Some(directive) = line.strip_prefix(CONDITION) {
            match parse_condition(directive) {
                Some(condition) => rule.conditions.push(condition),
                None => debug!(line = lineno + 1, "unparsable condition"),
            }
        }
    }

    rules
}

/// `<group>:<header>:<value>` `\t` `<operator>` `\t` `<flags>`, without the
/// leading `@`. The group id is not used.
pub fn parse_condition(directive: &str) -> Option<Condition> {
    let mut fields = directive.split(FIELD_SEPARATOR);
    let test = fields.next()?;
    let operator = fields.next().map(Operator::from_becky).unwrap_or_default();
    let flags = fields.next().map(MatchFlags::from_becky).unwrap_or_default();

    let (_group, rest) = test.split_once(':')?;
    let (header, value) = rest.split_once(':')?;

    let header = HeaderField::parse(header);
    if header.is_empty() {
        return None;
    }

    Some(Condition {
        header,
        value: parse_value(value),
        flags,
        operator,
    })
}

/// A value written as a quoted list, `["a@x.com", "b@x.com"]`, is a list;
/// anything else (`[WATCHDOG]` included) is taken verbatim.
fn parse_value(value: &str) -> ConditionValue {
    let scalar = || ConditionValue::Scalar(value.to_string());
    let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
        return scalar();
    };
    if !inner.contains(LIST_SEPARATOR) {
        return scalar();
    }

    let items = inner
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    ConditionValue::from_items(items).unwrap_or_else(scalar)
}
