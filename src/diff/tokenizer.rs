//! Splitting text into comparison tokens
//!
//! Tokens borrow from the input text; nothing is copied until rendering.
//! Every granularity produces a flat token list plus a list of comparison
//! units. In character and word mode each token is its own unit, in line
//! mode a unit is a line's content together with its terminator.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use unicode_script::{Script, UnicodeScript};

use crate::error::{DiffError, Result, Side};

/// Unit of comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Char,
    Word,
    Line,
}

impl Granularity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Word => "word",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a token represents in its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A single Unicode scalar value (character mode)
    Char,
    Word,
    Whitespace,
    Punctuation,
    LineContent,
    /// `\n` or `\r\n`
    LineTerminator,
}

/// A slice of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset of `text` in the source
    pub offset: usize,
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    pub fn new(text: &'a str, offset: usize, kind: TokenKind) -> Self {
        Self { text, offset, kind }
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// One element of the sequence handed to the aligner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit<'a> {
    /// Text compared for equality
    pub key: &'a str,
    /// Tokens covered by this unit
    pub tokens: Range<usize>,
}

/// Tokenized view of one input
#[derive(Debug, Clone)]
pub struct TokenSeq<'a> {
    source: &'a str,
    granularity: Granularity,
    tokens: Vec<Token<'a>>,
    units: Vec<Unit<'a>>,
}

impl<'a> TokenSeq<'a> {
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn units(&self) -> &[Unit<'a>] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Keys of all units, in order
    pub fn keys(&self) -> Result<Vec<&'a str>> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(self.units.len())
            .map_err(|_| DiffError::allocation("tokenization"))?;
        keys.extend(self.units.iter().map(|unit| unit.key));
        Ok(keys)
    }

    /// Tokens covered by a contiguous range of units
    pub fn tokens_for(&self, units: Range<usize>) -> &[Token<'a>] {
        if units.is_empty() {
            return &[];
        }
        let start = self.units[units.start].tokens.start;
        let end = self.units[units.end - 1].tokens.end;
        &self.tokens[start..end]
    }

    /// Source text covered by a contiguous range of units
    pub fn text_for(&self, units: Range<usize>) -> &'a str {
        match self.tokens_for(units) {
            [] => "",
            [first, .., last] => &self.source[first.offset..last.range().end],
            [only] => only.text,
        }
    }

    /// Number of line-content tokens in the source
    pub fn line_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::LineContent)
            .count()
    }
}

/// Splits text into tokens for one granularity
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    granularity: Granularity,
    strict_line_endings: bool,
}

impl Tokenizer {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            strict_line_endings: false,
        }
    }

    /// Make line terminators part of a line's comparison key
    pub fn strict_line_endings(mut self, strict: bool) -> Self {
        self.strict_line_endings = strict;
        self
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> Result<TokenSeq<'a>> {
        let mut tokens = Vec::new();
        tokens
            .try_reserve(estimate_tokens(text, self.granularity))
            .map_err(|_| DiffError::allocation("tokenization"))?;

        match self.granularity {
            Granularity::Char => split_chars(text, &mut tokens),
            Granularity::Word => split_words(text, &mut tokens)?,
            Granularity::Line => split_lines(text, &mut tokens)?,
        }

        let units = match self.granularity {
            Granularity::Line => line_units(text, &tokens, self.strict_line_endings)?,
            _ => single_units(&tokens)?,
        };

        Ok(TokenSeq {
            source: text,
            granularity: self.granularity,
            tokens,
            units,
        })
    }

    /// Validate `bytes` as UTF-8 and tokenize them
    pub fn tokenize_bytes<'a>(&self, bytes: &'a [u8], side: Side) -> Result<TokenSeq<'a>> {
        self.tokenize(decode(bytes, side)?)
    }
}

/// Validate raw input as UTF-8 without substituting anything
pub fn decode(bytes: &[u8], side: Side) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| DiffError::InvalidEncoding {
        side,
        offset: err.valid_up_to(),
    })
}

fn estimate_tokens(text: &str, granularity: Granularity) -> usize {
    match granularity {
        Granularity::Char => text.chars().count(),
        // whitespace runs separate the words; punctuation grows the vector later
        Granularity::Word => text.split_whitespace().count() * 2 + 1,
        Granularity::Line => 2 * (text.bytes().filter(|&b| b == b'\n').count() + 1),
    }
}

fn split_chars<'a>(text: &'a str, out: &mut Vec<Token<'a>>) {
    out.extend(
        text.char_indices()
            .map(|(i, c)| Token::new(&text[i..i + c.len_utf8()], i, TokenKind::Char)),
    );
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.script() == Script::Inherited
}

/// Scripts that never end a word on their own (digits, combining marks)
fn is_neutral(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

fn push_token<'a>(out: &mut Vec<Token<'a>>, token: Token<'a>) -> Result<()> {
    if out.len() == out.capacity() {
        out.try_reserve(1).map_err(|_| DiffError::allocation("tokenization"))?;
    }
    out.push(token);
    Ok(())
}

fn split_words<'a>(text: &'a str, out: &mut Vec<Token<'a>>) -> Result<()> {
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        let mut end = start + ch.len_utf8();

        let kind = if ch.is_whitespace() {
            while let Some(&(i, c)) = chars.peek() {
                if !c.is_whitespace() {
                    break;
                }
                chars.next();
                end = i + c.len_utf8();
            }
            TokenKind::Whitespace
        } else if is_word_char(ch) {
            let mut run_script = Some(ch.script()).filter(|s| !is_neutral(*s));
            while let Some(&(i, c)) = chars.peek() {
                if !is_word_char(c) {
                    break;
                }
                let script = c.script();
                if !is_neutral(script) {
                    match run_script {
                        Some(current) if current != script => break,
                        Some(_) => {}
                        None => run_script = Some(script),
                    }
                }
                chars.next();
                end = i + c.len_utf8();
            }
            TokenKind::Word
        } else {
            TokenKind::Punctuation
        };

        push_token(out, Token::new(&text[start..end], start, kind))?;
    }

    Ok(())
}

fn split_lines<'a>(text: &'a str, out: &mut Vec<Token<'a>>) -> Result<()> {
    let mut start = 0;

    while start < text.len() {
        match text[start..].find('\n') {
            Some(rel) => {
                let newline = start + rel;
                let content_end = if newline > start && text.as_bytes()[newline - 1] == b'\r' {
                    newline - 1
                } else {
                    newline
                };
                push_token(
                    out,
                    Token::new(&text[start..content_end], start, TokenKind::LineContent),
                )?;
                push_token(
                    out,
                    Token::new(
                        &text[content_end..newline + 1],
                        content_end,
                        TokenKind::LineTerminator,
                    ),
                )?;
                start = newline + 1;
            }
            None => {
                push_token(out, Token::new(&text[start..], start, TokenKind::LineContent))?;
                break;
            }
        }
    }

    Ok(())
}

fn single_units<'a>(tokens: &[Token<'a>]) -> Result<Vec<Unit<'a>>> {
    let mut units = Vec::new();
    units
        .try_reserve_exact(tokens.len())
        .map_err(|_| DiffError::allocation("tokenization"))?;
    units.extend(tokens.iter().enumerate().map(|(i, token)| Unit {
        key: token.text,
        tokens: i..i + 1,
    }));
    Ok(units)
}

fn line_units<'a>(text: &'a str, tokens: &[Token<'a>], strict: bool) -> Result<Vec<Unit<'a>>> {
    let mut units = Vec::new();
    units
        .try_reserve(tokens.len() / 2 + 1)
        .map_err(|_| DiffError::allocation("tokenization"))?;

    let mut i = 0;
    while i < tokens.len() {
        let content = tokens[i];
        let terminator = tokens
            .get(i + 1)
            .filter(|t| t.kind == TokenKind::LineTerminator);
        let end = i + 1 + usize::from(terminator.is_some());

        let key = match terminator {
            Some(term) if strict => &text[content.offset..term.range().end],
            _ => content.text,
        };
        units.push(Unit { key, tokens: i..end });
        i = end;
    }

    Ok(units)
}
