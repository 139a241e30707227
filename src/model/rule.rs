use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::enums::{MatchFlags, Operator};

/// Header name standing for the message body.
pub const BODY_SENTINEL: &str = "[body]";

/// What a condition looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderField {
    Body,
    /// One or more header field names.
    Names(Vec<String>),
}

impl HeaderField {
    /// Parse a header column: `[body]` or a comma-separated list of names.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case(BODY_SENTINEL) {
            return Self::Body;
        }
        Self::from_names(s.split(','))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Names(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        match self {
            Self::Body => &[],
            Self::Names(names) => names,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Body => false,
            Self::Names(names) => names.is_empty(),
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => f.write_str(BODY_SENTINEL),
            Self::Names(names) => f.write_str(&names.join(", ")),
        }
    }
}

/// The key a condition matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionValue {
    Scalar(String),
    /// A Sieve string list. Always has at least two elements.
    List(Vec<String>),
}

impl ConditionValue {
    /// A one-element list is a scalar; an empty list has no value at all.
    pub fn from_items(mut items: Vec<String>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop().map(Self::Scalar),
            _ => Some(Self::List(items)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        match self {
            Self::Scalar(s) => std::slice::from_ref(s).iter(),
            Self::List(items) => items.iter(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub header: HeaderField,
    pub value: ConditionValue,
    pub flags: MatchFlags,
    pub operator: Operator,
}

impl Condition {
    pub fn new(header: HeaderField, value: ConditionValue, flags: MatchFlags) -> Self {
        Self {
            header,
            value,
            flags,
            operator: Operator::Or,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    FileInto(String),
    Discard,
    /// Leave a copy in the inbox and keep delivering.
    Keep,
}

/// One filtering rule: any matching condition triggers all actions, then
/// evaluation stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn folder(&self) -> Option<&str> {
        self.actions.iter().find_map(|a| match a {
            Action::FileInto(folder) => Some(folder.as_str()),
            _ => None,
        })
    }

    /// Route the rule to `folder`, replacing any previous destination.
    /// An empty folder name clears the destination.
    pub fn set_folder(&mut self, folder: impl Into<String>) {
        let folder = folder.into();
        self.actions.retain(|a| !matches!(a, Action::FileInto(_)));
        if !folder.is_empty() {
            self.actions.insert(0, Action::FileInto(folder));
        }
    }

    pub fn add_action(&mut self, action: Action) {
        match action {
            Action::FileInto(folder) => self.set_folder(folder),
            other => {
                if !self.actions.contains(&other) {
                    self.actions.push(other);
                }
            }
        }
    }

    pub fn discards(&self) -> bool {
        self.actions.contains(&Action::Discard)
    }

    pub fn keeps(&self) -> bool {
        self.actions.contains(&Action::Keep)
    }

    /// At least one condition and something to do when it matches.
    pub fn is_well_formed(&self) -> bool {
        !self.conditions.is_empty() && !self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_parse() {
        assert_eq!(HeaderField::parse("[body]"), HeaderField::Body);
        assert_eq!(HeaderField::parse("[BODY]"), HeaderField::Body);
        assert_eq!(
            HeaderField::parse("To, Cc"),
            HeaderField::Names(vec!["To".to_string(), "Cc".to_string()])
        );
        assert!(HeaderField::parse(" , ").is_empty());
        assert_eq!(HeaderField::parse("To,Cc").to_string(), "To, Cc");
    }

    #[test]
    fn test_value_from_items() {
        assert_eq!(ConditionValue::from_items(vec![]), None);
        assert_eq!(
            ConditionValue::from_items(vec!["a".to_string()]),
            Some(ConditionValue::Scalar("a".to_string()))
        );
        let list = ConditionValue::from_items(vec!["a".to_string(), "b".to_string()]).unwrap();
        assert!(list.is_list());
        assert_eq!(list.iter().count(), 2);
    }

    #[test]
    fn test_single_destination() {
        let mut rule = Rule::default();
        rule.add_action(Action::Keep);
        rule.set_folder("INBOX.A");
        rule.add_action(Action::FileInto("INBOX.B".to_string()));
        rule.add_action(Action::Keep);
        assert_eq!(rule.folder(), Some("INBOX.B"));
        assert_eq!(rule.actions.len(), 2);
        assert_eq!(rule.actions[0], Action::FileInto("INBOX.B".to_string()));

        rule.set_folder("");
        assert_eq!(rule.folder(), None);
        assert!(rule.keeps());
    }

    #[test]
    fn test_well_formed() {
        let mut rule = Rule::default();
        assert!(!rule.is_well_formed());
        rule.add_action(Action::Discard);
        assert!(!rule.is_well_formed());
        rule.conditions.push(Condition::new(
            HeaderField::parse("Subject"),
            "spam".into(),
            MatchFlags::CASE_INSENSITIVE,
        ));
        assert!(rule.is_well_formed());
    }
}
