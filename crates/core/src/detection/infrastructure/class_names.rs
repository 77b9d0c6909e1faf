//! Parsing of the model metadata entries written by Ultralytics ONNX exports.
//!
//! `names` is a Python dict literal such as `{0: 'person', 1: 'bicycle'}`;
//! `imgsz` is a list such as `[640, 640]`.

use std::iter::Peekable;
use std::str::Chars;

use crate::detection::domain::inference_backend::ClassNames;

/// Parse a `names` metadata value. Returns `None` if it is malformed.
///
/// Keys may be bare or quoted integers; values may use single or double
/// quotes with backslash escapes.
pub fn parse_class_names(raw: &str) -> Option<ClassNames> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = body.chars().peekable();
    let mut names = ClassNames::new();

    loop {
        skip_separators(&mut chars);
        if chars.peek().is_none() {
            return Some(names);
        }
        let key = parse_key(&mut chars)?;
        skip_whitespace(&mut chars);
        if chars.next()? != ':' {
            return None;
        }
        skip_whitespace(&mut chars);
        let value = parse_quoted(&mut chars)?;
        names.insert(key, value);
    }
}

/// Parse an `imgsz` metadata value into `(height, width)`.
///
/// Accepts `[h, w]` or a single `n` meaning `n × n`.
pub fn parse_imgsz(raw: &str) -> Option<(u32, u32)> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    let dims: Vec<u32> = inner
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<_>>()?;
    match dims.as_slice() {
        [n] if *n > 0 => Some((*n, *n)),
        [h, w] if *h > 0 && *w > 0 => Some((*h, *w)),
        _ => None,
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn skip_separators(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
}

fn parse_key(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let quote = chars.next_if(|c| *c == '\'' || *c == '"');
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    if let Some(q) = quote {
        if chars.next()? != q {
            return None;
        }
    }
    digits.parse().ok()
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let quote = chars.next_if(|c| *c == '\'' || *c == '"')?;
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => value.push(chars.next()?),
            c if c == quote => return Some(value),
            c => value.push(c),
        }
    }
}
