use std::io::BufRead;

use crate::env::EnvStore;
use crate::error::{Error, ParseError};
use crate::expand::expand;
use crate::model::Env;
use crate::scanner::LineScanner;

/// Parse dotenv text leniently: lines that do not match the grammar
/// contribute nothing. Expansion falls back to the process environment.
pub fn parse<R: BufRead>(reader: R) -> Result<Env, Error> {
    parse_stream(reader, &EnvStore::process_store(), false)
}

/// Parse dotenv text, aborting on the first line that does not match the
/// grammar; the returned [`ParseError`] carries the pairs accumulated before
/// the offending line. Expansion falls back to the process environment.
pub fn strict_parse<R: BufRead>(reader: R) -> Result<Env, Error> {
    parse_stream(reader, &EnvStore::process_store(), true)
}

/// Lenient parse with expansion falling back to the given store.
pub fn parse_with<R: BufRead>(reader: R, store: &EnvStore) -> Result<Env, Error> {
    parse_stream(reader, store, false)
}

/// Strict parse with expansion falling back to the given store.
pub fn strict_parse_with<R: BufRead>(reader: R, store: &EnvStore) -> Result<Env, Error> {
    parse_stream(reader, store, true)
}

/// Lenient parse of an in-memory string.
pub fn parse_str(input: &str) -> Result<Env, Error> {
    parse(input.as_bytes())
}

/// Strict parse of an in-memory string.
pub fn strict_parse_str(input: &str) -> Result<Env, Error> {
    strict_parse(input.as_bytes())
}

fn parse_stream<R: BufRead>(reader: R, store: &EnvStore, strict: bool) -> Result<Env, Error> {
    let mut env = Env::new();
    let mut scanner = LineScanner::new(reader);
    let mut line_num = 0u32;

    while let Some(line) = scanner.next_line()? {
        line_num += 1;
        match match_line(&line) {
            LineMatch::Skip => {}
            LineMatch::Mismatch => {
                if strict {
                    return Err(Error::Parse(ParseError::new(line_num, line, env)));
                }
            }
            LineMatch::Assignment { key, raw } => {
                let (value, quote) = decode_value(raw);
                let value = match quote {
                    Quote::Single => value,
                    Quote::Unquoted | Quote::Double => expand(&value, &env, store),
                };
                env.insert(key.to_owned(), value);
            }
        }
    }

    Ok(env)
}

/// Quoting style of a raw value, derived from its first non-whitespace
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Unquoted,
    Single,
    Double,
}

enum LineMatch<'a> {
    Skip,
    Mismatch,
    Assignment { key: &'a str, raw: &'a str },
}

fn is_hspace(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Classify one terminator-stripped line. The grammar is anchored at column
/// one: indented assignments are mismatches, not values.
fn match_line(line: &str) -> LineMatch<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineMatch::Skip;
    }

    // `export` only counts as the keyword when followed by whitespace;
    // otherwise it is an ordinary key (`export=1`).
    let mut rest = line;
    if let Some(after) = rest.strip_prefix("export")
        && after.starts_with(is_hspace)
    {
        rest = after.trim_start_matches(is_hspace);
    }

    let key_end = rest
        .find(|ch: char| !is_key_char(ch))
        .unwrap_or(rest.len());
    if key_end == 0 {
        return LineMatch::Mismatch;
    }
    let key = &rest[..key_end];
    let rest = &rest[key_end..];

    let value_part = if let Some(after) = rest.strip_prefix(':') {
        // YAML-style assignment: `:` directly after the key, then required
        // whitespace.
        if !after.starts_with(is_hspace) {
            return LineMatch::Mismatch;
        }
        after.trim_start_matches(is_hspace)
    } else {
        let after = rest.trim_start_matches(is_hspace);
        let Some(after) = after.strip_prefix('=') else {
            return LineMatch::Mismatch;
        };
        after.trim_start_matches(is_hspace)
    };

    let raw = match value_part.chars().next() {
        None | Some('#') => "",
        Some(quote @ ('\'' | '"')) => match find_closing_quote(value_part, quote) {
            Some(end) => {
                let tail = value_part[end + 1..].trim_start_matches(is_hspace);
                if tail.is_empty() || tail.starts_with('#') {
                    &value_part[..=end]
                } else {
                    // Non-comment text after the closing quote turns the
                    // whole run into an unquoted value, quotes included.
                    unquoted_run(value_part)
                }
            }
            // An unterminated quoted run degrades to an unquoted one.
            None => unquoted_run(value_part),
        },
        Some(_) => unquoted_run(value_part),
    };

    LineMatch::Assignment { key, raw }
}

fn find_closing_quote(value: &str, quote: char) -> Option<usize> {
    let mut chars = value.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
        } else if ch == quote {
            return Some(idx);
        }
    }
    None
}

/// Cut an unquoted value at the first unescaped `#`; the rest of the line is
/// a comment.
fn unquoted_run(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (idx, &byte) in bytes.iter().enumerate() {
        if byte == b'#' && (idx == 0 || bytes[idx - 1] != b'\\') {
            return &value[..idx];
        }
    }
    value
}

/// Decode a raw value into its literal content and quoting style.
fn decode_value(raw: &str) -> (String, Quote) {
    let trimmed = raw.trim_matches([' ', '\t']);
    match trimmed.chars().next() {
        Some('\'') => (strip_quotes(trimmed, '\'').to_owned(), Quote::Single),
        Some('"') => (unescape_double(strip_quotes(trimmed, '"')), Quote::Double),
        _ => (trimmed.to_owned(), Quote::Unquoted),
    }
}

/// Strip exactly one matching leading and trailing quote character. An
/// unterminated quote keeps the value as-is.
fn strip_quotes(value: &str, quote: char) -> &str {
    if value.len() >= 2 && value.ends_with(quote) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Double-quote escape processing: `\n` and `\r` become real terminators
/// first, then every `\X` collapses to `X` — except `\$`, which stays intact
/// so the expander can see the escape.
fn unescape_double(value: &str) -> String {
    let value = value.replace("\\n", "\n").replace("\\r", "\r");

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('$') => {
                out.push('\\');
                out.push('$');
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
