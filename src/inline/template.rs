//! Template scanning
//!
//! Splits an inline expression into literal text and `${...}` / `$->{...}`
//! placeholders, and splits comma-joined expressions at top level.

use crate::error::{Result, ShardingError};

/// A piece of an inline template
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Split on commas that are not inside a placeholder
pub(crate) fn split_top_level(expression: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in expression.chars() {
        match ch {
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                push_trimmed(&mut result, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_trimmed(&mut result, &current);
    result
}

fn push_trimmed(result: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        result.push(trimmed.to_string());
    }
}

/// Break one template into literal and placeholder segments
pub(crate) fn scan(template: &str) -> Result<Vec<Segment>> {
    let chars: Vec<char> = template.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let open_len = placeholder_open_len(&chars[i..]);
        if open_len == 0 {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let body_start = i + open_len;
        let body_end = find_closing_brace(&chars, body_start).ok_or_else(|| {
            ShardingError::Configuration(format!(
                "Inline expression error: unterminated placeholder in '{}'",
                template
            ))
        })?;
        let body: String = chars[body_start..body_end].iter().collect();
        segments.push(Segment::Placeholder(body));
        i = body_end + 1;
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Length of a placeholder opener at the start of `chars`, or 0
fn placeholder_open_len(chars: &[char]) -> usize {
    match chars {
        ['$', '{', ..] => 2,
        ['$', '-', '>', '{', ..] => 4,
        _ => 0,
    }
}

/// Index of the `}` closing a placeholder whose body starts at `start`
fn find_closing_brace(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        match quote {
            Some(q) => {
                if ch == '\\' {
                    i += 1;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '{' => depth += 1,
                '}' if depth == 0 => return Some(i),
                '}' => depth -= 1,
                _ => {}
            },
        }
        i += 1;
    }
    None
}
