//! Source text in, program effects out: scan, parse, resolve, and interpret
//! only when no static diagnostic was reported.  Shared by the CLI's
//! subcommands and the prompt.

use std::io;
use std::panic;
use std::thread;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::{Diagnostics, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Native stack for the thread that runs Rox code.  Sized so that
/// [`MAX_CALL_DEPTH`](crate::interpreter::MAX_CALL_DEPTH) nested calls fit
/// even in unoptimised builds.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

/// How far one source text got through the pipeline.
#[derive(Debug)]
pub enum Outcome {
    Completed,

    /// Scanning, parsing or resolving reported errors; nothing was executed.
    StaticErrors(Diagnostics),

    RuntimeError(LoxError),
}

/// Scans, parses and resolves `source` into `interpreter`, collecting every
/// static diagnostic.  The resolver walks whatever the parser recovered, so
/// one pass reports syntax and scope errors together.
pub fn analyze(
    interpreter: &mut Interpreter,
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<Stmt> {
    let tokens = scan_tokens(source, diagnostics);
    let statements = Parser::new(&tokens, diagnostics).parse();

    if diagnostics.had_error() {
        debug!("Resolving after {} earlier diagnostic(s)", diagnostics.len());
    }

    Resolver::new(interpreter, diagnostics).resolve(&statements);

    statements
}

/// Full pipeline for one source text.  Interpretation never starts once a
/// static diagnostic has been reported.
pub fn run(interpreter: &mut Interpreter, source: &str) -> Outcome {
    let mut diagnostics = Diagnostics::new();
    let statements = analyze(interpreter, source, &mut diagnostics);

    if diagnostics.had_error() {
        info!("Not running: {} static error(s)", diagnostics.len());
        return Outcome::StaticErrors(diagnostics);
    }

    info!("Parsed {} statements", statements.len());

    match interpreter.interpret(&statements) {
        Ok(()) => Outcome::Completed,
        Err(error) => Outcome::RuntimeError(error),
    }
}

/// Runs `f` on a fresh thread with a [`STACK_SIZE`] stack and waits for it.
/// A panic inside `f` is resumed on the calling thread.
pub fn with_stack<F, T>(f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handle = thread::Builder::new()
        .name("rox-interpreter".to_string())
        .stack_size(STACK_SIZE)
        .spawn(f)?;

    match handle.join() {
        Ok(value) => Ok(value),
        Err(payload) => panic::resume_unwind(payload),
    }
}
