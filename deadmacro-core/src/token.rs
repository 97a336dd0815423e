//! Classified source tokens.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Lexical class of a token, as reported by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Punctuation,
    Identifier,
    Keyword,
    Literal,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Punctuation => write!(f, "PUNCTUATION"),
            Self::Identifier => write!(f, "IDENTIFIER"),
            Self::Keyword => write!(f, "KEYWORD"),
            Self::Literal => write!(f, "LITERAL"),
        }
    }
}

/// Position of a token in its source file (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Arc<Path>,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} line:{} column:{}",
            self.file.display(),
            self.line,
            self.column
        )
    }
}

/// A single classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub location: Location,
    /// First token of a logical source line (after line splicing).
    pub first_on_line: bool,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        spelling: impl Into<String>,
        location: Location,
        first_on_line: bool,
    ) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            location,
            first_on_line,
        }
    }

    #[inline]
    pub fn is(&self, kind: TokenKind, spelling: &str) -> bool {
        self.kind == kind && self.spelling == spelling
    }

    #[inline]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn file(&self) -> &Path {
        &self.location.file
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn column(&self) -> usize {
        self.location.column
    }
}
