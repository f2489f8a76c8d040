//! Tree‑walking evaluator.
//!
//! Statements run depth‑first and strictly left to right against one
//! "current" [`Environment`].  Blocks and calls swap in a child scope and
//! always put the previous one back, whether the body finished, returned,
//! or failed.
//!
//! `return` is not an error: [`Interpreter::execute`] yields a [`Flow`] that
//! every enclosing statement forwards until the call that owns it turns the
//! value into its result.  Runtime errors travel separately as `Err` and
//! reach the caller of [`Interpreter::interpret`] untouched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::function::{LoxFunction, NativeFn, NativeFunction};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested calls (functions and class constructors) a
/// program may build before it fails with "Stack overflow.".
///
/// Every call costs several native frames, so hosts must run the interpreter
/// on a thread with a large stack; see [`crate::driver::with_stack`].
pub const MAX_CALL_DEPTH: usize = 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell through to the next statement.
    Normal,

    /// A `return` is unwinding to the innermost call.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Scope depth per resolved expression; absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    /// Calls currently on the stack.
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with native functions such
    /// as `clock` already defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Same as [`Interpreter::new`] but `print` writes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            call_depth: 0,
        };

        interpreter.define_native("clock", 0, clock);

        interpreter
    }

    /// Registers a host function in the global scope.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction::new(name, arity, func);
        self.globals
            .borrow_mut()
            .define(name, Value::NativeFunction(Rc::new(native)));
    }

    /// Records that the expression `id` refers to a binding `depth` scopes out.
    /// Called by the resolver.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Expression {} resolved at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Depth recorded for `id`, or `None` when it is looked up as a global.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Runs a resolved program.  Stops at, and returns, the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(error) = self.execute(stmt) {
                debug!("Runtime error: {}", error);

                self.environment = Rc::clone(&self.globals);
                self.output.flush()?;

                return Err(error);
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, scope.into_ref())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                let name = function.name().unwrap_or_default().to_string();

                debug!("Function '{}' defined with {} parameters", name, function.arity());

                self.environment
                    .borrow_mut()
                    .define(&name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                // Bind the name first so method bodies can refer to the class.
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let methods: HashMap<String, LoxFunction> = methods
                    .iter()
                    .map(|method| {
                        let function = LoxFunction::new(
                            Rc::clone(method),
                            Rc::clone(&self.environment),
                            method.name.as_ref().map(|t| t.lexeme.as_str()) == Some(INITIALIZER),
                        );
                        (function.name().unwrap_or_default().to_string(), function)
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme.clone(), methods);

                info!("Class '{}' defined", name.lexeme);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` inside `environment`, restoring the current scope on
    /// every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(distance, &name.lexeme, value.clone());
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    is_truthy(&left)
                } else {
                    !is_truthy(&left)
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::Function(declaration) => {
                let function =
                    LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);
                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.borrow().get_at(distance, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::COMMA => Ok(right),

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (l @ Value::String(_), r) | (l, r @ Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", l, r)))
                }
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                let quotient = a / b;
                if quotient.is_infinite() {
                    return Err(LoxError::runtime(operator, "Divide by zero."));
                }
                Ok(Value::Number(quotient))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Invokes a callable (native function, user function or class).
    fn invoke_callable(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                check_arity(paren, native.arity, arguments.len())?;

                let result = native
                    .call(&arguments)
                    .map_err(|message| LoxError::runtime(paren, message))?;

                debug!("Native function '{}' returned: {}", native.name, result);
                Ok(result)
            }

            Value::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;

                self.enter_call(paren)?;
                let result = self.call_function(&function, arguments);
                self.call_depth -= 1;
                result
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), arguments.len())?;

                self.enter_call(paren)?;
                let result = self.instantiate(class, arguments);
                self.call_depth -= 1;
                result
            }

            _ => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Counts one more nested call, refusing past [`MAX_CALL_DEPTH`].
    /// Every success must be paired with a decrement once the call returns.
    fn enter_call(&mut self, paren: &Token) -> Result<()> {
        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        Ok(())
    }

    /// Runs a user function.  Arity has already been checked by the caller.
    pub fn call_function(&mut self, function: &LoxFunction, arguments: Vec<Value>) -> Result<Value> {
        debug!(
            "Calling function '{}'",
            function.name().unwrap_or("<anonymous>")
        );

        let mut environment = Environment::with_enclosing(Rc::clone(function.closure()));
        for (param, argument) in function.declaration().params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow = self.execute_block(&function.declaration().body, environment.into_ref())?;

        // An initializer yields its instance no matter how the body ended.
        if function.is_initializer() {
            return Ok(function.closure().borrow().get_at(0, "this"));
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }

    fn instantiate(&mut self, class: Rc<LoxClass>, arguments: Vec<Value>) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name());

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&class))));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            let bound = initializer.bind(Rc::clone(&instance));
            self.call_function(&bound, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// Everything is truthy except `nil` and `false`.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Bool(false))
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }
    Ok(())
}

/// `clock()`: milliseconds since the Unix epoch.
fn clock(_arguments: &[Value]) -> std::result::Result<Value, String> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}
