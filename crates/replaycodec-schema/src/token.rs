//! Tokenizer for declarative-literal schema sources.
//!
//! The grammar is the literal subset of a Python module: `name = value`
//! statements whose values nest lists, tuples, dicts, strings, numbers and
//! bare names. Anything the tokenizer does not recognise becomes a
//! one-character [`TokenKind::Other`] token and is passed through verbatim
//! by the transcoder.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// The three nesting constructs of the source grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `[ ... ]`
    List,
    /// `( ... )`
    Tuple,
    /// `{ ... }`
    Mapping,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Tuple => write!(f, "tuple"),
            Self::Mapping => write!(f, "mapping"),
        }
    }
}

/// Classification of a run of source characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Name,
    Number,
    SingleQuoted,
    DoubleQuoted,
    /// `=`
    Assign,
    Open(Delimiter),
    Close(Delimiter),
    Comma,
    /// `#` up to (not including) the end of the line.
    Comment,
    /// Any other single character.
    Other,
}

impl TokenKind {
    /// Whitespace and comments carry no structure.
    pub fn is_meaningful(self) -> bool {
        !matches!(self, Self::Whitespace | Self::Comment)
    }

    /// Tokens that finish a value: scalars and closing delimiters.
    pub fn ends_value(self) -> bool {
        matches!(
            self,
            Self::Name
                | Self::Number
                | Self::SingleQuoted
                | Self::DoubleQuoted
                | Self::Close(_)
        )
    }
}

/// One token with its decoded text and starting byte offset.
///
/// For strings `text` holds the unescaped contents without quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

/// Splits `source` into tokens. Tokenizing never fails; structural
/// problems are reported by the transcoder.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer {
        chars: source.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Returns the index of the first meaningful token at or after `from`.
pub fn next_meaningful(tokens: &[Token], from: usize) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| t.kind.is_meaningful())
        .map(|i| i + from)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

fn is_number_continue(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

struct Tokenizer<'s> {
    chars: Peekable<CharIndices<'s>>,
}

impl Tokenizer<'_> {
    fn next_token(&mut self) -> Option<Token> {
        let (offset, c) = self.chars.next()?;

        let single = |kind| Token {
            kind,
            text: c.to_string(),
            offset,
        };

        let token = match c {
            c if c.is_whitespace() => {
                self.run(offset, c, TokenKind::Whitespace, char::is_whitespace)
            }
            c if is_name_start(c) => self.run(offset, c, TokenKind::Name, is_name_continue),
            c if is_number_start(c) => {
                self.run(offset, c, TokenKind::Number, is_number_continue)
            }
            '\'' => self.string(offset, '\'', TokenKind::SingleQuoted),
            '"' => self.string(offset, '"', TokenKind::DoubleQuoted),
            '[' => single(TokenKind::Open(Delimiter::List)),
            ']' => single(TokenKind::Close(Delimiter::List)),
            '(' => single(TokenKind::Open(Delimiter::Tuple)),
            ')' => single(TokenKind::Close(Delimiter::Tuple)),
            '{' => single(TokenKind::Open(Delimiter::Mapping)),
            '}' => single(TokenKind::Close(Delimiter::Mapping)),
            '=' => single(TokenKind::Assign),
            ',' => single(TokenKind::Comma),
            '#' => self.comment(offset),
            _ => single(TokenKind::Other),
        };
        Some(token)
    }

    /// Consumes `first` plus every following char accepted by `accept`.
    fn run(
        &mut self,
        offset: usize,
        first: char,
        kind: TokenKind,
        accept: fn(char) -> bool,
    ) -> Token {
        let mut text = first.to_string();
        while let Some(&(_, c)) = self.chars.peek() {
            if !accept(c) {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        Token { kind, text, offset }
    }

    /// Reads up to the closing `delimiter`. A backslash makes the next
    /// character literal. An unterminated string runs to end of input.
    fn string(&mut self, offset: usize, delimiter: char, kind: TokenKind) -> Token {
        let mut text = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = self.chars.next() {
                        text.push(escaped);
                    }
                }
                c if c == delimiter => break,
                c => text.push(c),
            }
        }
        Token { kind, text, offset }
    }

    fn comment(&mut self, offset: usize) -> Token {
        let mut text = String::from("#");
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\r' || c == '\n' {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        Token {
            kind: TokenKind::Comment,
            text,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_assignment_statement() {
        assert_eq!(
            kinds("answer = 42"),
            vec![
                TokenKind::Name,
                TokenKind::Whitespace,
                TokenKind::Assign,
                TokenKind::Whitespace,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            kinds("[({})]"),
            vec![
                TokenKind::Open(Delimiter::List),
                TokenKind::Open(Delimiter::Tuple),
                TokenKind::Open(Delimiter::Mapping),
                TokenKind::Close(Delimiter::Mapping),
                TokenKind::Close(Delimiter::Tuple),
                TokenKind::Close(Delimiter::List),
            ]
        );
    }

    #[test]
    fn test_names_and_numbers() {
        let tokens = tokenize("m_userId -1 3.25 _x9");
        let meaningful: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_meaningful())
            .map(|t| (t.kind, t.text.as_str()))
            .collect();
        assert_eq!(
            meaningful,
            vec![
                (TokenKind::Name, "m_userId"),
                (TokenKind::Number, "-1"),
                (TokenKind::Number, "3.25"),
                (TokenKind::Name, "_x9"),
            ]
        );
    }

    #[test]
    fn test_string_escapes_keep_following_char() {
        let tokens = tokenize(r#"'it\'s' "say \"hi\"" 'back\\slash'"#);
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind.is_meaningful())
            .map(|t| (t.kind, t.text.as_str()))
            .collect();
        assert_eq!(
            strings,
            vec![
                (TokenKind::SingleQuoted, "it's"),
                (TokenKind::DoubleQuoted, "say \"hi\""),
                (TokenKind::SingleQuoted, "back\\slash"),
            ]
        );
    }

    #[test]
    fn test_other_quote_kind_inside_string() {
        let tokens = tokenize(r#"'a "b" c'"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, r#"a "b" c"#);
    }

    #[test]
    fn test_comment_stops_before_newline() {
        let tokens = tokenize("x # note\ny");
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[2].text, "# note");
        assert_eq!(tokens[3].kind, TokenKind::Whitespace);
        assert_eq!(tokens[3].text, "\n");
    }

    #[test]
    fn test_unknown_chars_pass_through() {
        let tokens = tokenize("{0:1}");
        assert_eq!(tokens[2].kind, TokenKind::Other);
        assert_eq!(tokens[2].text, ":");
    }

    #[test]
    fn test_offsets_are_byte_positions() {
        let tokens = tokenize("é = 1");
        // 'é' is not a name start, so it is an Other token of 2 bytes.
        assert_eq!(tokens[0].kind, TokenKind::Other);
        assert_eq!(tokens[1].offset, 2);
    }

    #[test]
    fn test_next_meaningful_skips_whitespace_and_comments() {
        let tokens = tokenize(",  # c\n ]");
        assert_eq!(next_meaningful(&tokens, 1), Some(4));
        assert_eq!(tokens[4].kind, TokenKind::Close(Delimiter::List));
        assert_eq!(next_meaningful(&tokens, 5), None);
    }
}
