//! SIEVE script tokenizer (RFC 5228).
//!
//! Tokenizing never fails: an unterminated string, list or comment simply
//! runs to the end of the input, and any other run of non-blank,
//! non-punctuation characters becomes an identifier.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A `:tag` like `:contains`, `:comparator`, `:domain`, lowercased.
    Tag(String),
    /// A bare word like `if`, `header`, `anyof`, `fileinto`.
    Identifier(String),
    /// A double-quoted string, escapes already resolved.
    QuotedString(String),
    /// A multi-line string `text:\r\n...\r\n.\r\n`
    MultiLineString(String),
    /// A bracketed string list `["a", "b"]`.
    StringList(Vec<String>),
    /// A numeric value, possibly with K/M/G suffix.
    Number(String),
    /// A `# ...` single-line comment.
    Comment(String),
    /// A `/* ... */` block comment.
    BlockComment(String),
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_) | Self::BlockComment(_))
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub token: Token,
    pub offset: usize,
    pub len: usize,
}

fn is_punctuation(b: u8) -> bool {
    matches!(b, b';' | b',' | b'(' | b')' | b'{' | b'}' | b'[' | b']' | b'"')
}

pub fn tokenize(input: &str) -> Vec<Span> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let token = match bytes[i] {
            b';' => {
                i += 1;
                Token::Semicolon
            }
            b',' => {
                i += 1;
                Token::Comma
            }
            b'(' => {
                i += 1;
                Token::LParen
            }
            b')' => {
                i += 1;
                Token::RParen
            }
            b'{' => {
                i += 1;
                Token::LBrace
            }
            b'}' => {
                i += 1;
                Token::RBrace
            }
            // stray closer
            b']' => {
                i += 1;
                continue;
            }

            b'#' => {
                let end = input[i..].find('\n').map_or(input.len(), |n| i + n);
                let text = input[i + 1..end].trim().to_string();
                i = end;
                Token::Comment(text)
            }

            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let body_start = i + 2;
                let (body_end, end) = match input[body_start..].find("*/") {
                    Some(n) => (body_start + n, body_start + n + 2),
                    None => (input.len(), input.len()),
                };
                i = end;
                Token::BlockComment(input[body_start..body_end].trim().to_string())
            }

            b'"' => {
                let (value, end) = scan_quoted(input, i);
                i = end;
                Token::QuotedString(value)
            }

            b'[' => {
                let (items, end) = scan_list(input, i);
                i = end;
                Token::StringList(items)
            }

            b't' | b'T'
                if input
                    .get(i..i + 5)
                    .is_some_and(|s| s.eq_ignore_ascii_case("text:")) =>
            {
                let (value, end) = scan_multiline(input, i + 5);
                i = end;
                Token::MultiLineString(value)
            }

            _ => {
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !is_punctuation(bytes[i])
                {
                    // a comment may follow a word without a blank
                    if bytes[i] == b'#' && i > start {
                        break;
                    }
                    i += 1;
                }
                classify_word(&input[start..i])
            }
        };

        tokens.push(Span {
            token,
            offset: start,
            len: i - start,
        });
    }

    tokens
}

fn classify_word(word: &str) -> Token {
    if word.starts_with(':') {
        return Token::Tag(word.to_lowercase());
    }
    let digits = word.trim_end_matches(['K', 'k', 'M', 'm', 'G', 'g']);
    if !digits.is_empty()
        && digits.len() + 1 >= word.len()
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Token::Number(word.to_string());
    }
    Token::Identifier(word.to_string())
}

/// Scan a quoted string starting at the opening quote at `start`. Returns the
/// unescaped value and the offset just past the closing quote.
fn scan_quoted(input: &str, start: usize) -> (String, usize) {
    let body_start = start + 1;
    let mut value = String::new();
    let mut chars = input[body_start..].char_indices();

    while let Some((ix, ch)) = chars.next() {
        match ch {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return (value, body_start + ix + 1),
            _ => value.push(ch),
        }
    }

    (value, input.len())
}

/// Scan a string list starting at `[`. Nested brackets are flattened and
/// anything that is not a quoted string is ignored.
fn scan_list(input: &str, start: usize) -> (Vec<String>, usize) {
    let bytes = input.as_bytes();
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                depth += 1;
                i += 1;
            }
            b']' => {
                i += 1;
                depth -= 1;
                if depth == 0 {
                    return (items, i);
                }
            }
            b'"' => {
                let (value, end) = scan_quoted(input, i);
                items.push(value);
                i = end;
            }
            _ => i += 1,
        }
    }

    (items, input.len())
}

/// Scan the body of a `text:` string; `start` is just past the colon.
fn scan_multiline(input: &str, start: usize) -> (String, usize) {
    // rest of the `text:` line is ignored
    let body_start = input[start..].find('\n').map_or(input.len(), |n| start + n + 1);

    let mut body = String::new();
    let mut pos = body_start;
    while pos < input.len() {
        let line_end = input[pos..].find('\n').map_or(input.len(), |n| pos + n + 1);
        let line = &input[pos..line_end];
        pos = line_end;

        let content = line.trim_end_matches(['\r', '\n']);
        if content == "." {
            return (body, pos);
        }
        // dot-stuffing
        body.push_str(line.strip_prefix("..").map_or(line, |_| &line[1..]));
    }

    (body, input.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("require \"fileinto\";");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("require".to_string()),
                Token::QuotedString("fileinto".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tags_and_strings() {
        let tokens = kinds("header :Contains \"Subject\" \"SPAM\"");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1], Token::Tag(":contains".to_string()));
    }

    #[test]
    fn test_escaped_quote() {
        let tokens = kinds(r#""Say \"Hello\"" "a\\b" "印刷""#);
        assert_eq!(
            tokens,
            vec![
                Token::QuotedString("Say \"Hello\"".to_string()),
                Token::QuotedString("a\\b".to_string()),
                Token::QuotedString("印刷".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_list_is_one_token() {
        let tokens = kinds(r#"["a@x.com","b@x.com", "c\"d"] ;"#);
        assert_eq!(
            tokens,
            vec![
                Token::StringList(vec![
                    "a@x.com".to_string(),
                    "b@x.com".to_string(),
                    "c\"d".to_string()
                ]),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_list_with_bracket_inside_string() {
        let tokens = kinds(r#"["[WATCHDOG]", "x]"]"#);
        assert_eq!(
            tokens,
            vec![Token::StringList(vec!["[WATCHDOG]".to_string(), "x]".to_string()])]
        );
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("# 1. INBOX.Test\nkeep; /* block\ncomment */ stop;");
        assert_eq!(tokens[0], Token::Comment("1. INBOX.Test".to_string()));
        assert_eq!(tokens[3], Token::BlockComment("block\ncomment".to_string()));
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_punctuation_splits_words() {
        let tokens = kinds("anyof(header,body){stop;}");
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[3], Token::Comma);
    }

    #[test]
    fn test_number_with_suffix() {
        assert_eq!(kinds("100K"), vec![Token::Number("100K".to_string())]);
        assert_eq!(kinds("42"), vec![Token::Number("42".to_string())]);
        assert_eq!(kinds("4x2"), vec![Token::Identifier("4x2".to_string())]);
    }

    #[test]
    fn test_multiline_string() {
        let tokens = kinds("body :contains text:\r\nline one\r\n..dot\r\n.\r\n;");
        assert_eq!(
            tokens[2],
            Token::MultiLineString("line one\r\n.dot\r\n".to_string())
        );
        assert_eq!(tokens[3], Token::Semicolon);
    }

    #[test]
    fn test_unterminated_input() {
        assert_eq!(kinds("\"open"), vec![Token::QuotedString("open".to_string())]);
        assert_eq!(kinds("[\"a\""), vec![Token::StringList(vec!["a".to_string()])]);
        assert_eq!(kinds("/* open"), vec![Token::BlockComment("open".to_string())]);
    }

    #[test]
    fn test_spans() {
        let spans = tokenize("if  header");
        assert_eq!(spans[1].offset, 4);
        assert_eq!(spans[1].len, 6);
    }

    proptest! {
        #[test]
        fn tokenizing_never_panics(s in "\\PC*") {
            tokenize(&s);
        }
    }
}
