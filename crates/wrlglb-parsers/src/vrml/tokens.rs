//! Number tokenization inside a single block body.
//!
//! Every token is parsed on its own; a token that is not a number yields
//! `None` and the caller decides whether to skip it or reject the block.

use std::borrow::Cow;

/// Remove `#` line comments.
pub fn strip_comments(body: &str) -> Cow<'_, str> {
    if !body.contains('#') {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    for line in body.split_inclusive('\n') {
        match line.find('#') {
            Some(pos) => {
                out.push_str(&line[..pos]);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }
    Cow::Owned(out)
}

/// Split a comment-free body into raw tokens on whitespace and commas.
pub fn tokens(body: &str) -> impl Iterator<Item = &str> {
    body.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}

/// Parse a float token: optional sign, digits with an optional decimal
/// point, optional exponent. `inf`/`nan` spellings are not numbers here.
pub fn parse_float(token: &str) -> Option<f32> {
    if !is_float_literal(token) {
        return None;
    }
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parse an index token: a run of digits with an optional `+` or `-` sign.
pub fn parse_index(token: &str) -> Option<i64> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<i64>().ok()
}

fn is_float_literal(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
