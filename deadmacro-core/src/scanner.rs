//! Directive-aware token scanner.
//!
//! Walks one file's token stream and decides, token by token, whether the
//! current region is live or suppressed by `#if`/`#ifdef`/`#ifndef`/`#else`/
//! `#endif`. Live `#define NAME` lines are published to the definitions
//! registry and every live identifier to the usages registry.
//!
//! This is a heuristic, not a preprocessor:
//! - `#if` only looks at its first operand: the literal `0` excludes, any
//!   other literal includes, anything else (`defined(X)`, `FOO > 1`) includes
//! - `#elif` is not a directive; its line is scanned as ordinary tokens
//! - macro bodies are not expanded
//!
//! Conditional nesting is an explicit stack of [`Scope`]s, so `#else` and
//! `#endif` always act on the innermost open conditional.

use std::collections::HashMap;

use tracing::debug;

use crate::cancel::ScanCancellation;
use crate::registry::Registries;
use crate::token::{Token, TokenKind};

/// Why a name is in a [`DefinitionTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionEntry {
    /// Supplied up front (`-D NAME`).
    Seeded,
    /// Seen in a live `#define`; `value` is the first body token, if any.
    Defined { token: Token, value: Option<String> },
}

/// Per-file set of macro names considered defined so far.
///
/// Built fresh for every file scan; never shared between workers.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    entries: HashMap<String, DefinitionEntry>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with externally supplied defines.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|name| (name.into(), DefinitionEntry::Seeded))
            .collect();
        Self { entries }
    }

    pub fn define(&mut self, name: &str, token: Token) {
        self.entries.insert(
            name.to_string(),
            DefinitionEntry::Defined { token, value: None },
        );
    }

    /// Attach a body spelling to a `#define`d name. Seeded names are left as is.
    pub fn set_value(&mut self, name: &str, spelling: &str) {
        if let Some(DefinitionEntry::Defined { value, .. }) = self.entries.get_mut(name) {
            *value = Some(spelling.to_string());
        }
    }

    /// Remove `name`; returns whether it was present.
    pub fn undefine(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DefinitionEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One open `#if`/`#ifdef`/`#ifndef` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scope {
    parent_suppressed: bool,
    satisfied: bool,
}

impl Scope {
    #[inline]
    fn suppressed(&self) -> bool {
        self.parent_suppressed || !self.satisfied
    }
}

/// Which part of a directive line the scanner is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    None,
    AfterHash,
    AfterDefine,
    AfterDefineName(String),
    AfterUndef,
    AfterIf,
    AfterIfdef,
    AfterIfndef,
}

/// Counters for one scanned file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub tokens: usize,
    pub definitions: usize,
    pub undefines: usize,
    pub usages: usize,
    /// Conditionals still open at end of input.
    pub open_conditionals: usize,
    pub cancelled: bool,
}

/// Conditional-compilation state machine for a single file.
pub struct ConditionalScanner<'a> {
    registries: &'a Registries,
    cancellation: &'a ScanCancellation,
    table: DefinitionTable,
    scopes: Vec<Scope>,
    state: Directive,
    summary: ScanSummary,
}

impl<'a> ConditionalScanner<'a> {
    pub fn new(
        registries: &'a Registries,
        table: DefinitionTable,
        cancellation: &'a ScanCancellation,
    ) -> Self {
        Self {
            registries,
            cancellation,
            table,
            scopes: Vec::with_capacity(8),
            state: Directive::None,
            summary: ScanSummary::default(),
        }
    }

    /// The file-local definition table in its current state.
    pub fn table(&self) -> &DefinitionTable {
        &self.table
    }

    /// Scan a token sequence to completion or until cancelled.
    pub fn scan<'t, I>(&mut self, tokens: I) -> ScanSummary
    where
        I: IntoIterator<Item = &'t Token>,
    {
        for token in tokens {
            if self.cancellation.is_cancelled() {
                self.summary.cancelled = true;
                break;
            }
            self.summary.tokens += 1;
            self.step(token);
        }

        if !self.summary.cancelled {
            self.end_line();
        }
        self.summary.open_conditionals = self.scopes.len();
        if self.summary.open_conditionals > 0 {
            debug!(
                open = self.summary.open_conditionals,
                "unterminated conditional block at end of input"
            );
        }
        self.summary.clone()
    }

    fn step(&mut self, token: &Token) {
        if token.first_on_line {
            self.end_line();
        }

        match std::mem::replace(&mut self.state, Directive::None) {
            Directive::None => self.plain(token),
            Directive::AfterHash => self.directive_name(token),
            Directive::AfterDefine => {
                if token.is_identifier() {
                    self.define(token);
                }
            }
            Directive::AfterDefineName(name) => match token.kind {
                TokenKind::Identifier | TokenKind::Literal => self.define_value(&name, token),
                TokenKind::Punctuation | TokenKind::Keyword => {
                    self.state = Directive::AfterDefineName(name);
                }
            },
            Directive::AfterUndef => {
                if token.is_identifier() {
                    self.undefine(token);
                }
            }
            Directive::AfterIf => match token.kind {
                TokenKind::Punctuation => self.state = Directive::AfterIf,
                TokenKind::Literal => self.open(token.spelling != "0"),
                TokenKind::Identifier | TokenKind::Keyword => {
                    self.open(true);
                    self.plain(token);
                }
            },
            Directive::AfterIfdef => self.open_on_name(token, true),
            Directive::AfterIfndef => self.open_on_name(token, false),
        }
    }

    /// A token outside directive recognition.
    fn plain(&mut self, token: &Token) {
        if token.first_on_line && token.is(TokenKind::Punctuation, "#") {
            self.state = Directive::AfterHash;
        } else if token.is_identifier() && !self.suppressed() {
            self.record_use(token);
        }
    }

    fn directive_name(&mut self, token: &Token) {
        match (token.kind, token.spelling.as_str()) {
            (TokenKind::Identifier, "define") => self.state = Directive::AfterDefine,
            (TokenKind::Identifier, "undef") => self.state = Directive::AfterUndef,
            (TokenKind::Keyword, "if") => self.state = Directive::AfterIf,
            (TokenKind::Identifier, "ifdef") => self.state = Directive::AfterIfdef,
            (TokenKind::Identifier, "ifndef") => self.state = Directive::AfterIfndef,
            (TokenKind::Keyword, "else") => self.flip(),
            (TokenKind::Identifier, "endif") => self.close(token),
            // #elif, #include, #pragma, ...
            _ => self.plain(token),
        }
    }

    /// Directive line ended; a conditional still waiting for its operand
    /// opens an included scope so its `#endif` stays balanced.
    fn end_line(&mut self) {
        match std::mem::replace(&mut self.state, Directive::None) {
            Directive::AfterIf | Directive::AfterIfdef | Directive::AfterIfndef => self.open(true),
            _ => {}
        }
    }

    fn define(&mut self, token: &Token) {
        if !self.suppressed() {
            self.registries.definitions.set(&token.spelling, token);
            self.table.define(&token.spelling, token.clone());
            self.summary.definitions += 1;
            debug!(event = "D", name = %token.spelling, location = %token.location);
        }
        self.state = Directive::AfterDefineName(token.spelling.clone());
    }

    fn define_value(&mut self, name: &str, token: &Token) {
        if !self.suppressed() {
            self.table.set_value(name, &token.spelling);
            debug!(
                event = "D",
                name = %name,
                kind = %token.kind,
                value = %token.spelling,
                location = %token.location
            );
        }
    }

    fn undefine(&mut self, token: &Token) {
        if !self.suppressed() {
            self.table.undefine(&token.spelling);
            self.summary.undefines += 1;
            debug!(event = "X", name = %token.spelling, location = %token.location);
        }
    }

    /// `#ifdef` / `#ifndef`. The tested name counts as a use either way.
    fn open_on_name(&mut self, token: &Token, want_defined: bool) {
        if token.is_identifier() {
            let defined = self.table.is_defined(&token.spelling);
            self.record_use(token);
            self.open(defined == want_defined);
        } else {
            self.open(true);
        }
    }

    fn record_use(&mut self, token: &Token) {
        self.registries.usages.set(&token.spelling, token);
        self.summary.usages += 1;
        debug!(event = "U", name = %token.spelling, location = %token.location);
    }

    fn open(&mut self, satisfied: bool) {
        let parent_suppressed = self.suppressed();
        self.scopes.push(Scope {
            parent_suppressed,
            satisfied,
        });
    }

    fn flip(&mut self) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.satisfied = !scope.satisfied;
        }
    }

    fn close(&mut self, token: &Token) {
        if self.scopes.pop().is_none() {
            debug!(location = %token.location, "unmatched #endif ignored");
        }
    }

    #[inline]
    fn suppressed(&self) -> bool {
        self.scopes.last().is_some_and(Scope::suppressed)
    }
}
