//! Recursive descent SIEVE reader.
//!
//! Only the part of the language that maps onto [`Rule`]s is understood:
//! `if`/`elsif` blocks whose tests are `header`, `address` or `body`
//! (optionally inside `anyof`), with `fileinto`, `discard` and `keep`
//! actions. Everything else is skipped without failing.
use tracing::{debug, warn};

use crate::model::{Action, Condition, ConditionValue, HeaderField, MatchFlags, Rule};
use crate::sieve::lexer::{tokenize, Span, Token};
use crate::sieve::{CASE_SENSITIVE_COMPARATOR, WILDCARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestKind {
    Header,
    Address,
    Body,
}

impl TestKind {
    fn from_sieve(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "header" => Some(Self::Header),
            "address" => Some(Self::Address),
            "body" => Some(Self::Body),
            _ => None,
        }
    }
}

pub fn parse(input: &str) -> Vec<Rule> {
    let spans = tokenize(input);
    let tokens: Vec<&Span> = spans.iter().filter(|s| !s.token.is_comment()).collect();
    let mut pos = 0;
    let mut rules = Vec::new();

    while let Some(span) = tokens.get(pos) {
        match &span.token {
            Token::Identifier(ident) if ident.eq_ignore_ascii_case("if") => {
                pos += 1;
                parse_if_chain(&tokens, &mut pos, &mut rules);
            }
            Token::Identifier(ident) if ident.eq_ignore_ascii_case("require") => {
                skip_command(&tokens, &mut pos);
            }
            other => {
                debug!(offset = span.offset, token = ?other, "skipping top-level command");
                let before = pos;
                skip_command(&tokens, &mut pos);
                if pos == before {
                    pos += 1;
                }
            }
        }
    }

    rules
}

/// `if` has been consumed. Every `elsif` branch becomes a rule of its own:
/// with a `stop` after each rule, the chain and a sequence of `if`s agree.
fn parse_if_chain(tokens: &[&Span], pos: &mut usize, rules: &mut Vec<Rule>) {
    push_rule(rules, parse_branch(tokens, pos));

    loop {
        match tokens.get(*pos).map(|s| &s.token) {
            Some(Token::Identifier(s)) if s.eq_ignore_ascii_case("elsif") => {
                *pos += 1;
                push_rule(rules, parse_branch(tokens, pos));
            }
            Some(Token::Identifier(s)) if s.eq_ignore_ascii_case("else") => {
                *pos += 1;
                debug!("dropping else branch, it has no condition");
                parse_action_block(tokens, pos);
                break;
            }
            _ => break,
        }
    }
}

fn push_rule(rules: &mut Vec<Rule>, rule: Rule) {
    if rule.is_well_formed() {
        rules.push(rule);
    } else {
        debug!(
            conditions = rule.conditions.len(),
            actions = rule.actions.len(),
            "dropping incomplete rule"
        );
    }
}

fn parse_branch(tokens: &[&Span], pos: &mut usize) -> Rule {
    let mut conditions = Vec::new();
    parse_test_expr(tokens, pos, &mut conditions);

    // Whatever the test expression did not understand, up to the block.
    while let Some(span) = tokens.get(*pos) {
        if matches!(span.token, Token::LBrace | Token::RBrace | Token::Semicolon) {
            break;
        }
        *pos += 1;
    }

    let mut rule = Rule {
        conditions,
        actions: Vec::new(),
    };
    for action in parse_action_block(tokens, pos) {
        rule.add_action(action);
    }
    rule
}

fn parse_test_expr(tokens: &[&Span], pos: &mut usize, out: &mut Vec<Condition>) {
    let Some(span) = tokens.get(*pos) else {
        return;
    };
    let Token::Identifier(ident) = &span.token else {
        return;
    };
    *pos += 1;

    match ident.to_lowercase().as_str() {
        "anyof" => parse_test_list(tokens, pos, out),
        "allof" => {
            warn!(offset = span.offset, "allof is read as anyof");
            parse_test_list(tokens, pos, out);
        }
        "not" => {
            warn!(offset = span.offset, "negated test is read without its negation");
            parse_test_expr(tokens, pos, out);
        }
        name => match TestKind::from_sieve(name) {
            Some(kind) => {
                if let Some(condition) = parse_match_test(kind, tokens, pos) {
                    out.push(condition);
                }
            }
            None => {
                debug!(offset = span.offset, test = name, "ignoring unsupported test");
                skip_test_arguments(tokens, pos);
            }
        },
    }
}

fn parse_test_list(tokens: &[&Span], pos: &mut usize, out: &mut Vec<Condition>) {
    if !matches!(tokens.get(*pos).map(|s| &s.token), Some(Token::LParen)) {
        return;
    }
    *pos += 1;

    while let Some(span) = tokens.get(*pos) {
        match span.token {
            Token::RParen => {
                *pos += 1;
                break;
            }
            Token::Comma => *pos += 1,
            Token::LBrace | Token::RBrace | Token::Semicolon => break,
            _ => {
                let before = *pos;
                parse_test_expr(tokens, pos, out);
                if *pos == before {
                    *pos += 1;
                }
            }
        }
    }
}

fn skip_test_arguments(tokens: &[&Span], pos: &mut usize) {
    while let Some(span) = tokens.get(*pos) {
        match span.token {
            Token::Tag(_)
            | Token::QuotedString(_)
            | Token::MultiLineString(_)
            | Token::StringList(_)
            | Token::Number(_) => *pos += 1,
            _ => break,
        }
    }
}

/// `header|address|body [tags] <args>` with the command name consumed.
fn parse_match_test(kind: TestKind, tokens: &[&Span], pos: &mut usize) -> Option<Condition> {
    let mut case_sensitive = false;
    let mut regex = false;
    let mut wildcard = false;

    while let Some(Token::Tag(tag)) = tokens.get(*pos).map(|s| &s.token) {
        *pos += 1;
        match tag.as_str() {
            ":comparator" => {
                if let Some(Token::QuotedString(name)) = tokens.get(*pos).map(|s| &s.token) {
                    *pos += 1;
                    case_sensitive = name == CASE_SENSITIVE_COMPARATOR;
                }
            }
            ":regex" => regex = true,
            ":matches" => wildcard = true,
            ":contains" => {}
            other => debug!(tag = other, "ignoring tag"),
        }
    }

    let mut args: Vec<Vec<String>> = Vec::new();
    while let Some(span) = tokens.get(*pos) {
        match &span.token {
            Token::QuotedString(s) | Token::MultiLineString(s) => args.push(vec![s.clone()]),
            Token::StringList(items) => args.push(items.clone()),
            _ => break,
        }
        *pos += 1;
    }

    let (header, keys) = match kind {
        TestKind::Body => {
            let keys = args.pop().unwrap_or_else(|| vec![String::new()]);
            (HeaderField::Body, keys)
        }
        TestKind::Header | TestKind::Address => {
            // Leading arguments (an address part, say) are ignored.
            let keys = args.pop()?;
            let names = args.pop()?;
            (HeaderField::from_names(names.iter().flat_map(|n| n.split(','))), keys)
        }
    };

    if header.is_empty() {
        debug!("test without header names");
        return None;
    }

    let Some(mut value) = ConditionValue::from_items(keys) else {
        debug!(header = %header, "test with an empty key list");
        return None;
    };

    let mut flags = if case_sensitive {
        MatchFlags::empty()
    } else {
        MatchFlags::CASE_INSENSITIVE
    };
    if regex {
        flags |= MatchFlags::REGEX;
    }
    if wildcard {
        let items: Vec<&mut String> = match &mut value {
            ConditionValue::Scalar(s) => vec![s],
            ConditionValue::List(items) => items.iter_mut().collect(),
        };
        if items
            .iter()
            .all(|s| s.ends_with(WILDCARD) && !s.starts_with(WILDCARD))
        {
            for s in items {
                s.pop();
            }
            flags |= MatchFlags::PREFIX;
        } else {
            warn!(header = %header, "only prefix patterns of :matches are kept");
        }
    }

    Some(Condition::new(header, value, flags))
}

/// Parse `{ ... }` into the actions this model knows about.
fn parse_action_block(tokens: &[&Span], pos: &mut usize) -> Vec<Action> {
    if !matches!(tokens.get(*pos).map(|s| &s.token), Some(Token::LBrace)) {
        return Vec::new();
    }
    *pos += 1;

    let mut actions = Vec::new();
    while let Some(span) = tokens.get(*pos) {
        match &span.token {
            Token::RBrace => {
                *pos += 1;
                break;
            }
            Token::Semicolon => *pos += 1,
            Token::Identifier(name) => match name.to_lowercase().as_str() {
                "fileinto" => {
                    *pos += 1;
                    actions.extend(parse_fileinto(tokens, pos));
                }
                "discard" => {
                    actions.push(Action::Discard);
                    skip_command(tokens, pos);
                }
                "keep" => {
                    actions.push(Action::Keep);
                    skip_command(tokens, pos);
                }
                "stop" => skip_command(tokens, pos),
                other => {
                    debug!(offset = span.offset, command = other, "ignoring unsupported action");
                    skip_command(tokens, pos);
                }
            },
            _ => skip_command(tokens, pos),
        }
    }

    actions
}

/// `fileinto [:copy] [:create] "folder";` with `fileinto` consumed. The
/// folder is taken verbatim; `:copy` means a copy stays behind.
fn parse_fileinto(tokens: &[&Span], pos: &mut usize) -> Vec<Action> {
    let mut folder = None;
    let mut copy = false;

    while let Some(span) = tokens.get(*pos) {
        match &span.token {
            Token::Tag(tag) if tag == ":copy" => copy = true,
            Token::Tag(_) => {}
            Token::QuotedString(s) => folder = Some(s.clone()),
            _ => break,
        }
        *pos += 1;
    }
    if matches!(tokens.get(*pos).map(|s| &s.token), Some(Token::Semicolon)) {
        *pos += 1;
    }

    let mut actions: Vec<Action> = folder.map(Action::FileInto).into_iter().collect();
    if copy {
        actions.push(Action::Keep);
    }
    actions
}

/// Skip one command: up to and including its `;`, or through its balanced
/// `{ }` block. A `}` closing an enclosing block is left in place.
fn skip_command(tokens: &[&Span], pos: &mut usize) {
    let mut depth = 0usize;
    while let Some(span) = tokens.get(*pos) {
        match span.token {
            Token::Semicolon if depth == 0 => {
                *pos += 1;
                return;
            }
            Token::LBrace => depth += 1,
            Token::RBrace => {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                if depth == 0 {
                    *pos += 1;
                    // an if block may be followed by elsif/else blocks
                    if !matches!(
                        tokens.get(*pos).map(|s| &s.token),
                        Some(Token::Identifier(s)) if s.eq_ignore_ascii_case("elsif") || s.eq_ignore_ascii_case("else")
                    ) {
                        return;
                    }
                    continue;
                }
            }
            _ => {}
        }
        *pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> Rule {
        let mut rules = parse(input);
        assert_eq!(rules.len(), 1, "{rules:?}");
        rules.remove(0)
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
        assert!(parse("require [\"fileinto\", \"mailbox\"];\n").is_empty());
    }

    #[test]
    fn test_parse_simple_fileinto() {
        let rule = single(
            r#"require "fileinto";

# Filter: Move spam
if header :contains "Subject" "SPAM" {
    fileinto "Junk";
    stop;
}
"#,
        );
        assert_eq!(rule.folder(), Some("Junk"));
        assert_eq!(rule.actions.len(), 1);
        let cond = &rule.conditions[0];
        assert_eq!(cond.header, HeaderField::parse("Subject"));
        assert_eq!(cond.value, "SPAM".into());
        assert_eq!(cond.flags, MatchFlags::CASE_INSENSITIVE);
    }

    #[test]
    fn test_address_list_value() {
        let rule = single(
            r#"if address :contains "From" ["a@x.com","b@x.com"] { fileinto "INBOX.Test"; stop; }"#,
        );
        assert_eq!(rule.folder(), Some("INBOX.Test"));
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(
            rule.conditions[0].value,
            ConditionValue::List(vec!["a@x.com".to_string(), "b@x.com".to_string()])
        );
    }

    #[test]
    fn test_anyof_across_lines() {
        let rule = single(
            "if anyof (\n    header :contains \"Subject\" \"a\",\n    body :contains \"b\"\n)\n{\n    discard;\n    stop;\n}\n",
        );
        assert_eq!(rule.conditions.len(), 2);
        assert_eq!(rule.conditions[1].header, HeaderField::Body);
        assert_eq!(rule.actions, vec![Action::Discard]);
    }

    #[test]
    fn test_comparator_and_match_types() {
        let rule = single(
            r#"if anyof (
    header :regex "Subject" "^[0-9]+$",
    header :matches "Subject" "Pre*",
    header :contains :comparator "i;octet" "Subject" "Sensitive",
    header :matches "Subject" "*both*",
    header :comparator "i;ascii-casemap" "Subject" "Default"
) {
    keep;
}"#,
        );
        let c = &rule.conditions;
        assert_eq!(c.len(), 5);
        assert_eq!(c[0].flags, MatchFlags::CASE_INSENSITIVE | MatchFlags::REGEX);
        assert_eq!(c[0].value, "^[0-9]+$".into());
        assert_eq!(c[1].flags, MatchFlags::CASE_INSENSITIVE | MatchFlags::PREFIX);
        assert_eq!(c[1].value, "Pre".into());
        assert_eq!(c[2].flags, MatchFlags::empty());
        assert_eq!(c[3].flags, MatchFlags::CASE_INSENSITIVE);
        assert_eq!(c[3].value, "*both*".into());
        assert_eq!(c[4].flags, MatchFlags::CASE_INSENSITIVE);
        assert_eq!(rule.actions, vec![Action::Keep]);
    }

    #[test]
    fn test_prefix_list() {
        let rule = single(r#"if header :matches "Subject" ["[ML]*", "Re: [ML]*"] { keep; }"#);
        assert_eq!(
            rule.conditions[0].value,
            ConditionValue::List(vec!["[ML]".to_string(), "Re: [ML]".to_string()])
        );
        assert!(rule.conditions[0].flags.contains(MatchFlags::PREFIX));
    }

    #[test]
    fn test_header_name_list() {
        let rule = single(r#"if header :contains ["To", "Cc"] "team" { discard; }"#);
        assert_eq!(
            rule.conditions[0].header,
            HeaderField::Names(vec!["To".to_string(), "Cc".to_string()])
        );
    }

    #[test]
    fn test_address_part_is_ignored() {
        let rule = single(r#"if address :is :domain "From" "example.com" { fileinto "INBOX.Ex"; }"#);
        assert_eq!(rule.conditions[0].header, HeaderField::parse("From"));
        assert_eq!(rule.conditions[0].value, "example.com".into());
    }

    #[test]
    fn test_missing_arguments_yield_no_condition() {
        assert!(parse(r#"if header :contains "Subject" { fileinto "X"; }"#).is_empty());
        assert!(parse(r#"if header :contains "Subject" [] { fileinto "X"; }"#).is_empty());
    }

    #[test]
    fn test_body_without_argument() {
        let rule = single("if body :contains { discard; }");
        assert_eq!(rule.conditions[0].value, "".into());
    }

    #[test]
    fn test_escaped_value() {
        let rule = single(r#"if header :contains "Subject" "Say \"Hello\"" { fileinto "INBOX"; }"#);
        assert_eq!(rule.conditions[0].value, "Say \"Hello\"".into());
    }

    #[test]
    fn test_elsif_becomes_rule_and_else_is_dropped() {
        let rules = parse(
            r#"if header :contains "Subject" "a" { fileinto "A"; }
elsif header :contains "Subject" "b" { fileinto "B"; }
else { keep; }
if header :contains "Subject" "c" { discard; }"#,
        );
        let folders: Vec<_> = rules.iter().map(|r| r.folder()).collect();
        assert_eq!(folders, vec![Some("A"), Some("B"), None]);
        assert!(rules[2].discards());
    }

    #[test]
    fn test_unsupported_constructs_are_skipped() {
        let rules = parse(
            r#"require ["fileinto", "imap4flags"];
keep;
if size :over 100K { discard; }
if exists "X-Spam" { fileinto "Junk"; }
if header :contains "Subject" "x" {
    setflag "\\Seen";
    if true { stop; }
    redirect "someone@example.com";
    fileinto :copy :create "INBOX.Copy";
    stop;
}"#,
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].actions,
            vec![Action::FileInto("INBOX.Copy".to_string()), Action::Keep]
        );
    }

    #[test]
    fn test_allof_and_not_are_flattened() {
        let rule = single(
            r#"if allof (header :contains "From" "a", not header :contains "Subject" "b") { keep; }"#,
        );
        assert_eq!(rule.conditions.len(), 2);
    }

    #[test]
    fn test_condition_without_action_dropped() {
        assert!(parse(r#"if header :contains "Subject" "x" { stop; }"#).is_empty());
    }

    #[test]
    fn test_garbage_does_not_panic() {
        parse("this is not valid sieve {{{");
        parse("if if if");
        parse("} } ; ( ) if header ( { ");
    }
}
