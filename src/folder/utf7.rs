//! The modified UTF-7 used for non-ASCII mailbox names (RFC 3501 §5.1.3).
//!
//! Printable ASCII other than `&` stands for itself, `&-` is a literal `&`,
//! and anything else is UTF-16BE in base64 (with `,` in place of `/`)
//! between `&` and `-`.
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD, STANDARD};
use base64::{alphabet, Engine as _};

const SHIFT_IN: char = '&';
const SHIFT_OUT: char = '-';

const MUTF7: GeneralPurpose = GeneralPurpose::new(&alphabet::IMAP_MUTF7, NO_PAD);

/// Decode a mailbox name.
///
/// Never fails: an escape that is not valid base64 or not valid UTF-16 is
/// copied to the output as it was written.
pub fn decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find(SHIFT_IN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        if let Some(tail) = after.strip_prefix(SHIFT_OUT) {
            out.push(SHIFT_IN);
            rest = tail;
            continue;
        }

        let (run, tail, terminated) = match after.find(SHIFT_OUT) {
            Some(end) => (&after[..end], &after[end + 1..], true),
            None => (after, "", false),
        };

        match decode_run(run) {
            Some(text) => out.push_str(&text),
            None => {
                out.push(SHIFT_IN);
                out.push_str(run);
                if terminated {
                    out.push(SHIFT_OUT);
                }
            }
        }
        rest = tail;
    }

    out.push_str(rest);
    out
}

fn decode_run(run: &str) -> Option<String> {
    if run.is_empty() {
        return None;
    }
    let mut b64 = run.replace(',', "/");
    while b64.len() % 4 != 0 {
        b64.push('=');
    }
    let bytes = STANDARD.decode(b64).ok()?;
    encoding_rs::UTF_16BE
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(|text| text.into_owned())
}

/// Encode a mailbox name. `decode(&encode(s)) == s` for every `s`.
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending: Vec<u16> = Vec::new();

    for ch in s.chars() {
        if ch == SHIFT_IN {
            flush(&mut out, &mut pending);
            out.push(SHIFT_IN);
            out.push(SHIFT_OUT);
        } else if is_direct(ch) {
            flush(&mut out, &mut pending);
            out.push(ch);
        } else {
            let mut buf = [0u16; 2];
            pending.extend_from_slice(ch.encode_utf16(&mut buf));
        }
    }

    flush(&mut out, &mut pending);
    out
}

fn flush(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push(SHIFT_IN);
    out.push_str(&MUTF7.encode(bytes));
    out.push(SHIFT_OUT);
    pending.clear();
}

fn is_direct(ch: char) -> bool {
    (' '..='~').contains(&ch)
}
