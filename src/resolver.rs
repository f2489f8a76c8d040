//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (a stack of maps from name to binding state).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return`/`this`, locals that are never read).
//! 3. Tell the interpreter, for *each* variable occurrence, how many scopes
//!    out its binding lives, so runtime lookups go straight to the right scope.
//!    Occurrences found in no scope are left unrecorded and treated as globals.
//!
//! The scopes pushed here must mirror, one for one, the environments the
//! interpreter creates for the same code: one per block, one per call (holding
//! the parameters *and* the top level of the body), and one per class holding
//! `this`.  Errors never stop the walk.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::class::INITIALIZER;
use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenType};
use log::{debug, info};
use std::collections::HashMap;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Are we inside a class body?  Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Lifecycle of a local name within its scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VarState {
    /// Name is in scope but its initializer is still running.
    Declared,
    Defined,
    /// Some expression has read it.
    Read,
}

#[derive(Debug)]
struct Binding {
    token: Token,
    state: VarState,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    reporter: &'a mut dyn Reporter,
    scopes: Vec<HashMap<String, Binding>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver bound to the given interpreter and sink.
    pub fn new(interpreter: &'a mut Interpreter, reporter: &'a mut dyn Reporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.  Always visits the whole program.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // the name is visible *inside* its own body, for recursion
                if let Some(name) = &declaration.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class { name, methods } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(
                        "this".to_string(),
                        Binding {
                            token: Token::new(TokenType::THIS, "this", name.line),
                            state: VarState::Read,
                        },
                    );
                }

                for method in methods {
                    let kind = match &method.name {
                        Some(token) if token.lexeme == INITIALIZER => FunctionType::Initializer,
                        _ => FunctionType::Method,
                    };
                    self.resolve_function(method, kind);
                }

                self.end_scope();

                self.current_class = enclosing_class;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .resolve_error_at(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter
                            .resolve_error_at(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|binding| binding.state == VarState::Declared);

                if in_own_initializer {
                    self.reporter.resolve_error_at(
                        name,
                        "Can't read local variable in its own initializer.",
                    );
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS.  Writing is not reading.
                self.resolve_expr(value);
                self.resolve_local(*id, name, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter
                        .resolve_error_at(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Function(declaration) => {
                self.resolve_function(declaration, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// One fresh scope for a function's parameters + body, matching the single
    /// environment the interpreter creates per call.
    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the innermost scope, reporting every binding nobody read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<Binding> = scope
            .into_values()
            .filter(|binding| binding.state != VarState::Read)
            .collect();
        unused.sort_by(|a, b| {
            (a.token.line, &a.token.lexeme).cmp(&(b.token.line, &b.token.lexeme))
        });

        for binding in unused {
            debug!("Unused local '{}'", binding.token.lexeme);

            self.reporter.resolve_error_at(
                &binding.token,
                &format!("Local variable '{}' is never used.", binding.token.lexeme),
            );
        }
    }

    /// Global declarations are not tracked, so redeclaring a global is fine.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter
                    .resolve_error_at(name, "Already a variable with this name in this scope.");
            }
            scope.insert(
                name.lexeme.clone(),
                Binding {
                    token: name.clone(),
                    state: VarState::Declared,
                },
            );
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(binding) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            if binding.state == VarState::Declared {
                binding.state = VarState::Defined;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at depth `d` if any scope
    /// holds the name; otherwise leave it for global lookup at runtime.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_read: bool) {
        // innermost → outermost
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(binding) = scope.get_mut(&name.lexeme) {
                if is_read {
                    binding.state = VarState::Read;
                }

                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
