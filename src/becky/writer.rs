use std::borrow::Cow;
use tracing::warn;

use crate::becky::{BEGIN, CONDITION, COPY_MODE, DELETE, END, FIELD_SEPARATOR, FOLDER, MOVE_MODE};
use crate::folder::FolderMap;
use crate::model::{HeaderField, Rule, BODY_SENTINEL};

const PREAMBLE: &[&str] = &["Version=1", "AutoSorting=1", "OnlyRead=0", "OnlyOneFolder=1"];

/// Becky! has a single condition group per rule.
const GROUP: &str = "0";

/// Render rules as an `IFilter.def`.
///
/// Destinations are looked up in `folders`; a folder with no physical path
/// gets no `!M:` line. List values are written as one condition line per
/// element since the format has no list syntax.
pub fn generate(rules: &[Rule], folders: &FolderMap) -> String {
    let mut lines: Vec<String> = PREAMBLE.iter().map(|l| l.to_string()).collect();

    for (i, rule) in rules.iter().enumerate() {
        lines.push(format!("{BEGIN} \"\""));

        if let Some(folder) = rule.folder() {
            match folders.resolve(folder) {
                Some(physical) => lines.push(format!("{FOLDER}{physical}")),
                None => warn!(rule = i + 1, folder, "no mailbox folder found, dropping destination"),
            }
        }

        if rule.discards() {
            lines.push(DELETE.to_string());
        }

        for condition in &rule.conditions {
            let header = becky_header(&condition.header);
            for value in condition.value.iter() {
                let value = single_line(value, i + 1);
                lines.push(format!(
                    "{CONDITION}{GROUP}:{header}:{value}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
                    condition.operator, condition.flags
                ));
            }
        }

        lines.push(if rule.keeps() { COPY_MODE } else { MOVE_MODE }.to_string());
        lines.push(format!("{END} \"\""));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Tabs and line breaks would split a condition line into extra fields or
/// lines, so they become spaces.
fn single_line(value: &str, rule: usize) -> Cow<'_, str> {
    let is_break = |c: char| c == '\t' || c == '\n' || c == '\r';
    if !value.contains(is_break) {
        return Cow::Borrowed(value);
    }
    warn!(rule, value, "condition value contains a tab or line break, replacing with spaces");
    Cow::Owned(value.replace(is_break, " "))
}

fn becky_header(header: &HeaderField) -> Cow<'static, str> {
    match header {
        HeaderField::Body => Cow::Borrowed(BODY_SENTINEL),
        HeaderField::Names(names) => Cow::Owned(
            names
                .iter()
                .map(|n| canonical_header(n))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

/// Conventional capitalisation of the common headers; others pass through.
pub fn canonical_header(name: &str) -> Cow<'_, str> {
    let canonical = match name.to_ascii_lowercase().as_str() {
        "from" => "From",
        "to" => "To",
        "cc" => "Cc",
        "subject" => "Subject",
        "reply-to" => "Reply-To",
        "sender" => "Sender",
        "x-sender" => "X-Sender",
        _ => return Cow::Borrowed(name),
    };
    Cow::Borrowed(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::becky::parse;
    use crate::model::{Action, Condition, ConditionValue, MatchFlags};

    fn rule(header: &str, value: ConditionValue, flags: MatchFlags, actions: Vec<Action>) -> Rule {
        Rule {
            conditions: vec![Condition::new(HeaderField::parse(header), value, flags)],
            actions,
        }
    }

    fn print_map() -> FolderMap {
        let mut map = FolderMap::new("45bee44e.mb");
        map.insert("INBOX.Print", r"45bee44e.mb\#account#INBOX[1f].Print[1].ini");
        map
    }

    #[test]
    fn test_generate_block() {
        let rules = vec![rule(
            "subject",
            "Invoice".into(),
            MatchFlags::CASE_INSENSITIVE,
            vec![Action::FileInto("INBOX.Print".to_string())],
        )];
        let text = generate(&rules, &print_map());
        assert!(text.starts_with("Version=1\nAutoSorting=1\nOnlyRead=0\nOnlyOneFolder=1\n"));
        assert!(text.contains(":Begin \"\"\n!M:45bee44e.mb\\#account#INBOX[1f].Print[1].ini\n"));
        assert!(text.contains("@0:Subject:Invoice\tO\tI\n$O:Sort=1\n:End \"\"\n"));
    }

    #[test]
    fn test_list_value_is_expanded() {
        let rules = vec![rule(
            "From",
            ConditionValue::List(vec!["a@x.com".to_string(), "b@x.com".to_string()]),
            MatchFlags::CASE_INSENSITIVE,
            vec![Action::FileInto("INBOX.Print".to_string())],
        )];
        let text = generate(&rules, &print_map());
        assert!(text.contains("@0:From:a@x.com\tO\tI\n@0:From:b@x.com\tO\tI\n"));
        assert!(!text.lines().any(|l| l.starts_with("@0:From:[")));
    }

    #[test]
    fn test_control_characters_stay_in_value_field() {
        let rules = vec![rule(
            "Subject",
            "a\tb\r\nc".into(),
            MatchFlags::CASE_INSENSITIVE,
            vec![Action::FileInto("INBOX.Print".to_string())],
        )];
        let text = generate(&rules, &print_map());
        let line = text.lines().find(|l| l.starts_with("@0:Subject:")).unwrap();
        assert_eq!(line, "@0:Subject:a b  c\tO\tI");
        assert_eq!(line.split('\t').count(), 3);
        assert!(text.contains("@0:Subject:a b  c\tO\tI\n$O:Sort=1\n"));
    }

    #[test]
    fn test_trash_discard_and_copy() {
        let rules = vec![rule(
            "[body]",
            "Keyword".into(),
            MatchFlags::empty(),
            vec![Action::FileInto("Trash".to_string()), Action::Discard, Action::Keep],
        )];
        let text = generate(&rules, &FolderMap::new("45bee44e.mb"));
        assert!(text.contains("!M:45bee44e.mb\\!Trash\\\n!D\n@0:[body]:Keyword\tO\t\n$O:Sort=0\n"));
    }

    #[test]
    fn test_unmapped_folder_has_no_destination() {
        let rules = vec![rule(
            "Subject",
            "x".into(),
            MatchFlags::CASE_INSENSITIVE,
            vec![Action::FileInto("INBOX.Unknown".to_string())],
        )];
        let text = generate(&rules, &FolderMap::new("45bee44e.mb"));
        assert!(!text.contains("!M:"));
        assert!(text.contains(":Begin \"\""));
    }

    #[test]
    fn test_multi_header_casing() {
        let rules = vec![rule(
            "to, cc, x-mailer",
            "team".into(),
            MatchFlags::CASE_INSENSITIVE | MatchFlags::PREFIX,
            vec![Action::Discard],
        )];
        let text = generate(&rules, &FolderMap::default());
        assert!(text.contains("@0:To, Cc, x-mailer:team\tO\tIT\n"));
    }

    #[test]
    fn test_round_trip_through_reader() {
        let rules = vec![
            rule(
                "Subject",
                "Invoice".into(),
                MatchFlags::CASE_INSENSITIVE,
                vec![Action::FileInto("INBOX.Print".to_string())],
            ),
            rule("From", "spam@x.com".into(), MatchFlags::REGEX, vec![Action::Discard]),
        ];
        let reparsed = parse(&generate(&rules, &print_map()));
        assert_eq!(reparsed, rules);
    }
}
