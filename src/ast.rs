//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes are plain owned data.  The three expression kinds that refer to a
//! binding (`Variable`, `Assign`, `This`) carry an [`ExprId`]; the resolver
//! keys its scope‑depth table on that id, so two structurally equal
//! expressions at different places in the program never collide.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Identity of a binding‑referencing expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    /// Hands out a process‑unique id.  Ids stay unique across several parses,
    /// which lets one interpreter keep executing code from successive prompt
    /// lines against a single resolution table.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// The parser copies the value out of the token so the AST does not need
/// the token afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Shared function shape used by `fun` declarations, methods and anonymous
/// function literals.  Wrapped in `Rc` so every closure built from it shares
/// the one body instead of cloning the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous literals.
    pub name: Option<Token>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Every kind of *expression* in Rox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Infix binary operator expression, including the comma sequence.
    /// *Example:* `a + b`, `x <= y`, `f(), g()`
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, `,` …
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary { operator: Token, right: Box<Expr> },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        /// The `?` token.
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// Anonymous `fun (params) { body }` literal.
    Function(Rc<FunctionDecl>),
}

/// Every kind of *statement*.  A program is a sequence of these nodes
/// returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops are desugared into this at parse time.
    While { condition: Expr, body: Box<Stmt> },

    /// Named function declaration ‑ the declaration always has a name.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Optional expression to return.  Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
