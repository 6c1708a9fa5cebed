//! Parser for `.properties` text.
//!
//! Supports the subset of the format that deployment descriptors use:
//! `#` and `!` comment lines, `=`, `:` or whitespace between key and value,
//! backslash line continuations and the `\t \n \r \f \uXXXX` escapes,
//! with `\uXXXX` surrogate pairs combined into one character.

use std::collections::BTreeMap;
use std::str::Chars;

/// Parses properties text into a key/value map. Later duplicates win.
pub fn parse(input: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let mut lines = input.lines();
    while let Some(line) = next_logical_line(&mut lines) {
        let (key, value) = split_entry(&line);
        entries.insert(key, value);
    }
    entries
}

/// Joins continuation lines and skips blanks and comments.
fn next_logical_line<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<String> {
    loop {
        let line = lines.next()?.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = String::from(line);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        return Some(logical);
    }
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                break;
            }
            c if c.is_whitespace() => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let mut rest = line[key_end..].trim_start();
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start();
    }

    (unescape(&line[..key_end]), unescape(rest))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => {
                let escape = chars.as_str();
                let Some(unit) = hex_code_unit(&mut chars) else {
                    // Malformed escapes are kept verbatim.
                    out.push_str("\\u");
                    continue;
                };
                let mut units = vec![unit];
                if (0xD800..=0xDBFF).contains(&unit)
                    && let Some(low) = low_surrogate(&mut chars)
                {
                    units.push(low);
                }
                match char::decode_utf16(units).next() {
                    Some(Ok(decoded)) => out.push(decoded),
                    // Unpaired surrogates are kept verbatim.
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&escape[..4]);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Consumes exactly four ASCII hex digits, leaving `chars` untouched otherwise.
fn hex_code_unit(chars: &mut Chars<'_>) -> Option<u16> {
    let digits = chars.as_str().get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let unit = u16::from_str_radix(digits, 16).ok()?;
    chars.nth(3);
    Some(unit)
}

/// Consumes a `\uDC00`-`\uDFFF` escape directly following a high surrogate.
fn low_surrogate<'a>(chars: &mut Chars<'a>) -> Option<u16> {
    let mut ahead = chars.as_str().strip_prefix("\\u")?.chars();
    let unit = hex_code_unit(&mut ahead).filter(|unit| (0xDC00..=0xDFFF).contains(unit))?;
    *chars = ahead;
    Some(unit)
}
