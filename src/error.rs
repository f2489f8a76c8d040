//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Two families never mix:
//!
//! * **Static diagnostics** (`Lex`, `Parse`, `Resolve`) are *reported* through a
//!   [`Reporter`] and the pass that found them keeps going.
//! * **Runtime errors** (`Runtime`) are *returned* and unwind straight to the
//!   top‑level `interpret` call.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::{debug, info};

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'`, ` at end`, or empty for line‑only reports.
        location: String,
    },

    /// Static‑analysis or resolution failure (scope misuse, unused locals, …).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error, carrying the token nearest to the fault.
    #[error("{message}\n[line {line}]", line = .token.line)]
    Runtime { token: Token, message: String },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders the `where` part of a token‑anchored diagnostic.
fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, anchored at a token.
    pub fn parse_at<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **parser**, anchored at a line only.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse {
            message,
            line,
            location: String::new(),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve_at<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            token: token.clone(),
            message,
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime { token, .. } => Some(token.line),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostic sink
// ─────────────────────────────────────────────────────────────────────────────

/// Receives static diagnostics from the scanner, parser and resolver.
///
/// Passes never stop at the first problem; they hand every error to the
/// reporter and carry on.  The host decides afterwards whether to proceed.
pub trait Reporter {
    fn report(&mut self, error: LoxError);

    /// "error at token" entry point: line and lexeme context plus a message.
    fn parse_error_at(&mut self, token: &Token, message: &str) {
        self.report(LoxError::parse_at(token, message));
    }

    /// "error at line" entry point.
    fn parse_error_at_line(&mut self, line: usize, message: &str) {
        self.report(LoxError::parse(line, message));
    }

    fn resolve_error_at(&mut self, token: &Token, message: &str) {
        self.report(LoxError::resolve_at(token, message));
    }
}

/// In‑memory [`Reporter`] that keeps every diagnostic in arrival order.
///
/// One value per run replaces a process‑wide "had error" flag, so independent
/// interpretations never share state.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, error: LoxError) {
        debug!("Diagnostic reported: {}", error);

        self.errors.push(error);
    }
}
