//! Logos-based C/C++ tokenizer.
//!
//! This is a lexical classifier, not a preprocessor: it splits a file into
//! Punctuation / Identifier / Keyword / Literal tokens and tags each with its
//! file, line and column. Whitespace, comments and backslash-newline splices
//! are dropped. Directive names (`define`, `ifdef`, `endif`, ...) come out as
//! identifiers, while `if` and `else` are keywords, the same classification
//! libclang's token API uses.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use logos::Logos;

use crate::error::{DeadmacroError, DeadmacroResult, IoResultExt};
use crate::token::{Location, Token, TokenKind};

/// Maximum file size to tokenize (10 MB).
const MAX_FILE_SIZE: u64 = 10_000_000;

/// Produces the token sequence of one source file.
///
/// Implementations must be shareable across scan workers.
pub trait TokenSource: Send + Sync {
    fn tokenize(&self, path: &Path) -> DeadmacroResult<Vec<Token>>;
}

/// Default [`TokenSource`] for C and C++ files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct CTokenizer;

impl CTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl TokenSource for CTokenizer {
    fn tokenize(&self, path: &Path) -> DeadmacroResult<Vec<Token>> {
        let meta = fs::metadata(path).with_path(path)?;
        if meta.len() > MAX_FILE_SIZE {
            return Err(DeadmacroError::tokenize(
                path,
                format!("file exceeds {} byte limit", MAX_FILE_SIZE),
            ));
        }

        let bytes = fs::read(path).with_path(path)?;
        let source = String::from_utf8(bytes)
            .map_err(|e| DeadmacroError::tokenize(path, format!("not valid UTF-8: {}", e)))?;

        tokenize_str(path, &source)
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\x0B\x0C]+")]
enum RawToken {
    #[regex(r"\r?\n")]
    Newline,

    #[regex(r"\\[ \t]*\r?\n")]
    Splice,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Word,

    #[regex(r"\.?[0-9]([0-9A-Za-z_.']|[eEpP][+-])*")]
    Number,

    #[regex(r#"(u8|u|U|L)?"([^"\\\n]|\\(.|\n))*""#)]
    Str,

    #[regex(r"(u8|u|U|L)?'([^'\\\n]|\\(.|\n))+'")]
    Char,

    #[regex(r"##|->|\+\+|--|<<=|>>=|<<|>>|<=|>=|==|!=|&&|\|\||[-+*/%&|\^]=|::|\.\.\.")]
    Operator,

    #[regex(r"[!#%&()*+,\-./:;<=>?@\[\]\^{|}~`\\]")]
    Punct,
}

fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Tokenize in-memory source text, attributing tokens to `path`.
pub fn tokenize_str(path: &Path, source: &str) -> DeadmacroResult<Vec<Token>> {
    let file: Arc<Path> = Arc::from(path);
    let lines = LineIndex::new(source);
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::with_capacity(source.len() / 4);
    let mut at_line_start = true;

    while let Some(raw) = lexer.next() {
        let span = lexer.span();
        let text = source.get(span.clone()).unwrap_or_default();
        let (line, column) = lines.position(span.start);

        let kind = match raw {
            Ok(RawToken::Newline) => {
                at_line_start = true;
                continue;
            }
            Ok(RawToken::Splice | RawToken::LineComment | RawToken::BlockComment) => continue,
            Ok(RawToken::Word) if is_keyword(text) => TokenKind::Keyword,
            Ok(RawToken::Word) => TokenKind::Identifier,
            Ok(RawToken::Number | RawToken::Str | RawToken::Char) => TokenKind::Literal,
            Ok(RawToken::Operator | RawToken::Punct) => TokenKind::Punctuation,
            Err(()) => {
                if text.starts_with("/*") {
                    return Err(DeadmacroError::tokenize_at(
                        path,
                        "unterminated block comment",
                        line,
                        column,
                    ));
                }
                let unprefixed = text.trim_start_matches(['u', '8', 'U', 'L']);
                if unprefixed.starts_with('"') || unprefixed.starts_with('\'') {
                    // Unterminated quote: the rest of the line is one literal.
                    let line_end = source[span.start..]
                        .find('\n')
                        .map_or(source.len(), |i| span.start + i);
                    if line_end > span.end {
                        lexer.bump(line_end - span.end);
                    }
                    let end = line_end.max(span.end);
                    let spelling = source
                        .get(span.start..end)
                        .unwrap_or_default()
                        .trim_end_matches('\r');
                    let location = Location {
                        file: Arc::clone(&file),
                        line,
                        column,
                    };
                    tokens.push(Token::new(TokenKind::Literal, spelling, location, at_line_start));
                    at_line_start = false;
                    continue;
                }
                // Stray characters outside the basic source set.
                TokenKind::Punctuation
            }
        };

        let location = Location {
            file: Arc::clone(&file),
            line,
            column,
        };
        tokens.push(Token::new(kind, text, location, at_line_start));
        at_line_start = false;
    }

    Ok(tokens)
}

/// Byte offsets of every line start, for offset -> (line, column) lookups.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        (line, offset - start + 1)
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        // C
        "auto" | "break" | "case" | "char" | "const" | "continue" | "default" | "do"
            | "double" | "else" | "enum" | "extern" | "float" | "for" | "goto" | "if"
            | "inline" | "int" | "long" | "register" | "restrict" | "return" | "short"
            | "signed" | "sizeof" | "static" | "struct" | "switch" | "typedef" | "union"
            | "unsigned" | "void" | "volatile" | "while" | "_Alignas" | "_Alignof"
            | "_Atomic" | "_Bool" | "_Complex" | "_Generic" | "_Imaginary" | "_Noreturn"
            | "_Static_assert" | "_Thread_local"
            // C++
            | "alignas" | "alignof" | "asm" | "bool" | "catch" | "class" | "const_cast"
            | "constexpr" | "decltype" | "delete" | "dynamic_cast" | "explicit" | "export"
            | "false" | "friend" | "mutable" | "namespace" | "new" | "noexcept" | "nullptr"
            | "operator" | "private" | "protected" | "public" | "reinterpret_cast"
            | "static_assert" | "static_cast" | "template" | "this" | "thread_local"
            | "throw" | "true" | "try" | "typeid" | "typename" | "using" | "virtual"
            | "wchar_t" | "char16_t" | "char32_t"
    )
}
