//! Rewrites a token stream into JSON text.
//!
//! The mapping is mostly one-to-one:
//!
//! | source            | JSON            |
//! |-------------------|-----------------|
//! | `name = value`    | `"name": value` |
//! | `[..]` and `(..)` | `[..]`          |
//! | `{..}`            | `{..}`          |
//! | bare names        | strings         |
//! | `'..'` / `".."`   | strings         |
//! | `# comment`       | dropped         |
//!
//! Two things need lookahead. Top-level statements are not separated by
//! commas in the source, so one is inserted between a finished value and
//! the next statement's name. And Python allows a trailing comma before a
//! closer, JSON does not, so a source comma is dropped when the next
//! meaningful token closes the current construct.

use serde_json::{Number, Value};

use crate::token::{next_meaningful, tokenize, Delimiter, Token, TokenKind};
use crate::SchemaError;

/// Whether source whitespace is kept in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rendering {
    /// No whitespace at all.
    #[default]
    Minified,
    /// Source whitespace preserved, output wrapped in `{\n … \n}`.
    Pretty,
}

/// Tokenizes and transcodes `source` into a JSON object text.
pub fn transcode(source: &str, rendering: Rendering) -> Result<String, SchemaError> {
    transcode_tokens(&tokenize(source), rendering)
}

/// Transcodes an existing token stream. See the module docs for the rules.
///
/// # Errors
/// [`SchemaError::Mismatched`], [`SchemaError::UnexpectedCloser`] or
/// [`SchemaError::Unclosed`] when delimiters do not nest.
pub fn transcode_tokens(tokens: &[Token], rendering: Rendering) -> Result<String, SchemaError> {
    let pretty = rendering == Rendering::Pretty;
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 2).sum());
    out.push('{');
    if pretty {
        out.push('\n');
    }

    // The implicit top-level mapping is always at the bottom.
    let mut stack = vec![Delimiter::Mapping];

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Whitespace => {
                if pretty {
                    out.push_str(&token.text);
                }
            }
            TokenKind::Comment => {}
            TokenKind::Name | TokenKind::SingleQuoted | TokenKind::DoubleQuoted => {
                push_string(&mut out, &token.text);
            }
            TokenKind::Number => {
                let innermost = stack.last().copied();
                push_number(&mut out, tokens, i, innermost == Some(Delimiter::Mapping));
            }
            TokenKind::Assign => out.push(':'),
            TokenKind::Open(delimiter) => {
                out.push(open_char(delimiter));
                stack.push(delimiter);
            }
            TokenKind::Close(found) => {
                if stack.len() == 1 {
                    return Err(SchemaError::UnexpectedCloser {
                        found,
                        offset: token.offset,
                    });
                }
                // Length checked above, so there is always something to pop.
                let expected = stack.pop().unwrap_or(Delimiter::Mapping);
                if expected != found {
                    return Err(SchemaError::Mismatched {
                        expected,
                        found,
                        offset: token.offset,
                    });
                }
                out.push(close_char(found));
            }
            TokenKind::Comma => {
                let closer = stack.last().copied().map(TokenKind::Close);
                if let Some(next) = next_meaningful(tokens, i + 1) {
                    if Some(tokens[next].kind) != closer {
                        out.push(',');
                    }
                }
            }
            TokenKind::Other => out.push_str(&token.text),
        }

        if stack.len() == 1 && token.kind.ends_value() {
            let next = next_meaningful(tokens, i + 1).map(|n| tokens[n].kind);
            if next == Some(TokenKind::Name) {
                out.push(',');
            }
        }
    }

    if stack.len() != 1 {
        return Err(SchemaError::Unclosed(stack.len() - 1));
    }

    if pretty {
        out.push('\n');
    }
    out.push('}');
    Ok(out)
}

fn open_char(delimiter: Delimiter) -> char {
    match delimiter {
        Delimiter::List | Delimiter::Tuple => '[',
        Delimiter::Mapping => '{',
    }
}

fn close_char(delimiter: Delimiter) -> char {
    match delimiter {
        Delimiter::List | Delimiter::Tuple => ']',
        Delimiter::Mapping => '}',
    }
}

fn push_string(out: &mut String, text: &str) {
    out.push_str(&Value::String(text.to_owned()).to_string());
}

/// Numbers become JSON numbers, except mapping keys (JSON keys must be
/// strings) and literals JSON cannot represent, which become strings.
fn push_number(out: &mut String, tokens: &[Token], index: usize, in_mapping: bool) {
    let text = tokens[index].text.as_str();

    let is_key = in_mapping
        && next_meaningful(tokens, index + 1).is_some_and(|n| {
            let next = &tokens[n];
            next.kind == TokenKind::Assign || (next.kind == TokenKind::Other && next.text == ":")
        });
    if is_key {
        push_string(out, text);
        return;
    }

    let number = text
        .parse::<i64>()
        .map(Number::from)
        .ok()
        .or_else(|| text.parse::<u64>().map(Number::from).ok())
        .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64));
    match number {
        Some(number) => out.push_str(&number.to_string()),
        None => push_string(out, text),
    }
}
