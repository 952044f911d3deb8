//! Tree-walking evaluator: runtime values, lexical environments and the
//! statement/expression dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{BinOp, Expr, LogicalOp, Stmt, UnaryOp};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Number(f64),
    Bool(bool),
    Str(String),
    Function(Rc<Function>),
}

/// A user-defined function together with the environment in force where it
/// was declared.
#[derive(Clone)]
pub struct Function {
    name: String,
    params: Vec<String>,
    body: Stmt,
    closure: Rc<Env>,
}

// The closure chain can point back at the function itself (direct
// recursion), so the derived impl would never terminate.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl Value {
    /// Only `nil` and `false` are falsy; `0`, the empty string and every
    /// function are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The piece a value contributes to string concatenation, following
    /// the print formatting rules.  Functions do not concatenate.
    fn concat_piece(&self) -> Option<String> {
        match self {
            Value::Nil | Value::Number(_) | Value::Bool(_) => Some(self.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Function(_) => None,
        }
    }
}

/// Cross-type comparison is always unequal, never an error.  Functions
/// compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            // Integral numbers print without a fractional part, others as
            // the shortest decimal.
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "<fn {}>", func.name),
        }
    }
}

#[derive(Debug)]
pub enum RuntimeError {
    OperandMustBeNumber,
    OperandsMustBeNumbers,
    UndefinedVariable(String),
    ArityMismatch { expected: usize, got: usize },
    NotCallable(String),
    ReturnOutsideFunction,
    Io(io::Error),
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::OperandMustBeNumber => write!(f, "Operand must be a number."),
            RuntimeError::OperandsMustBeNumbers => write!(f, "Operands must be numbers."),
            RuntimeError::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'.", name)
            }
            RuntimeError::ArityMismatch { expected, got } => {
                write!(f, "Expected {} args but got {}.", expected, got)
            }
            RuntimeError::NotCallable(what) => {
                write!(f, "Attempt to call non-function '{}'.", what)
            }
            RuntimeError::ReturnOutsideFunction => write!(f, "'return' outside of function."),
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> RuntimeError {
        RuntimeError::Io(e)
    }
}

/// A name-to-value mapping chained up to the global scope.
#[derive(Debug)]
struct Env {
    enclosing: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    fn new() -> Rc<Env> {
        Self::with_enclosing(None)
    }

    fn with_enclosing(enclosing: Option<Rc<Env>>) -> Rc<Env> {
        Rc::new(Env {
            enclosing,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Binds a name in this environment.  Redeclaration replaces the
    /// innermost binding.
    fn define(&self, name: &str, val: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), val);
    }

    /// Rebinds the nearest enclosing occurrence of `name`.
    fn assign(&self, name: &str, val: Value) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), val);
            return Ok(());
        }
        match self.enclosing.as_ref() {
            Some(enclosing) => enclosing.assign(name, val),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }

    fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(v) => Some(v.clone()),
            None => self.enclosing.as_ref().and_then(|e| e.get(name)),
        }
    }
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Env>,
    returning: Option<Value>,
    call_depth: usize,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        Evaluator {
            output,
            globals: Env::new(),
            returning: None,
            call_depth: 0,
        }
    }

    /// Runs a program in the global environment and returns the value of
    /// its last statement.  The environment persists across calls, so a
    /// later program can use definitions made by an earlier one.
    pub fn eval_program(&mut self, stmts: &[Stmt]) -> Result<Value, RuntimeError> {
        self.eval_stmts(stmts, self.globals.clone())
    }

    fn eval_stmts(&mut self, stmts: &[Stmt], env: Rc<Env>) -> Result<Value, RuntimeError> {
        let mut last = Value::Nil;
        for stmt in stmts {
            last = self.eval_stmt(stmt, env.clone())?;
            if self.returning.is_some() {
                break;
            }
        }
        Ok(last)
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expr(e) => self.eval_expr(e, env),
            Stmt::Print(e) => {
                let v = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", v)?;
                Ok(Value::Nil)
            }
            Stmt::VarDecl(name, init) => {
                let val = match init {
                    Some(e) => self.eval_expr(e, env.clone())?,
                    None => Value::Nil,
                };
                env.define(name, val.clone());
                Ok(val)
            }
            Stmt::FunDecl(name, params, body) => {
                let func = Value::Function(Rc::new(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: (**body).clone(),
                    closure: env.clone(),
                }));
                env.define(name, func.clone());
                Ok(func)
            }
            Stmt::Block(stmts) => self.eval_stmts(stmts, Env::with_enclosing(Some(env))),
            Stmt::If(cond, then_branch, else_branch) => {
                if self.eval_expr(cond, env.clone())?.is_truthy() {
                    self.eval_stmt(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch, env)
                } else {
                    Ok(Value::Nil)
                }
            }
            Stmt::While(cond, body) => {
                while self.eval_expr(cond, env.clone())?.is_truthy() {
                    self.eval_stmt(body, env.clone())?;
                    if self.returning.is_some() {
                        break;
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::Return(e) => {
                if self.call_depth == 0 {
                    return Err(RuntimeError::ReturnOutsideFunction);
                }
                let val = match e {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                self.returning = Some(val);
                Ok(Value::Nil)
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Nil => Ok(Value::Nil),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expr::Unary(UnaryOp::Not, e) => {
                let v = self.eval_expr(e, env)?;
                Ok(Value::Bool(!v.is_truthy()))
            }
            Expr::Unary(UnaryOp::Neg, e) => match self.eval_expr(e, env)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::OperandMustBeNumber),
            },
            Expr::Binary(BinOp::Add, lhs, rhs) => {
                let l = self.eval_expr(lhs, env.clone())?;
                let r = self.eval_expr(rhs, env)?;
                match (&l, &r) {
                    (Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln + rn)),
                    (Value::Str(_), _) | (_, Value::Str(_)) => {
                        match (l.concat_piece(), r.concat_piece()) {
                            (Some(ls), Some(rs)) => Ok(Value::Str(ls + &rs)),
                            _ => Err(RuntimeError::OperandsMustBeNumbers),
                        }
                    }
                    _ => Err(RuntimeError::OperandsMustBeNumbers),
                }
            }
            Expr::Binary(BinOp::Equal, lhs, rhs) => {
                let l = self.eval_expr(lhs, env.clone())?;
                let r = self.eval_expr(rhs, env)?;
                Ok(Value::Bool(l == r))
            }
            Expr::Binary(BinOp::NotEqual, lhs, rhs) => {
                let l = self.eval_expr(lhs, env.clone())?;
                let r = self.eval_expr(rhs, env)?;
                Ok(Value::Bool(l != r))
            }
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = self.numeric_operands(lhs, rhs, env)?;
                let val = match op {
                    BinOp::Sub => Value::Number(l - r),
                    BinOp::Mul => Value::Number(l * r),
                    // IEEE-754 division: dividing by zero yields an
                    // infinity or NaN, not an error.
                    BinOp::Div => Value::Number(l / r),
                    // Remainder keeps the sign of the dividend.
                    BinOp::Rem => Value::Number(l % r),
                    BinOp::Less => Value::Bool(l < r),
                    BinOp::LessEqual => Value::Bool(l <= r),
                    BinOp::Greater => Value::Bool(l > r),
                    BinOp::GreaterEqual => Value::Bool(l >= r),
                    BinOp::Add | BinOp::Equal | BinOp::NotEqual => unreachable!("handled above"),
                };
                Ok(val)
            }
            Expr::Logical(LogicalOp::And, lhs, rhs) => {
                let l = self.eval_expr(lhs, env.clone())?;
                if !l.is_truthy() {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
            Expr::Logical(LogicalOp::Or, lhs, rhs) => {
                let l = self.eval_expr(lhs, env.clone())?;
                if l.is_truthy() {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
            Expr::Group(e) => self.eval_expr(e, env),
            Expr::Assign(name, rhs) => {
                let val = self.eval_expr(rhs, env.clone())?;
                env.assign(name, val.clone())?;
                Ok(val)
            }
            Expr::Call(callee, args) => self.eval_call(callee, args, env),
        }
    }

    fn numeric_operands(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        env: Rc<Env>,
    ) -> Result<(f64, f64), RuntimeError> {
        let l = self.eval_expr(lhs, env.clone())?;
        let r = self.eval_expr(rhs, env)?;
        match (l, r) {
            (Value::Number(l), Value::Number(r)) => Ok((l, r)),
            _ => Err(RuntimeError::OperandsMustBeNumbers),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        env: Rc<Env>,
    ) -> Result<Value, RuntimeError> {
        // The native clock is recognized by name at the call site only; it
        // is not a binding and ignores its arguments.
        if let Expr::Var(name) = callee {
            if name == "clock" {
                return Ok(Value::Number(clock_now()));
            }
        }

        let target = self.eval_expr(callee, env.clone())?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env.clone())?);
        }

        let func = match target {
            Value::Function(func) => func,
            other => return Err(RuntimeError::NotCallable(other.to_string())),
        };
        if values.len() != func.params.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: func.params.len(),
                got: values.len(),
            });
        }

        // Parameters live in a fresh scope chained to the closure, not to
        // the caller.
        let call_env = Env::with_enclosing(Some(func.closure.clone()));
        for (param, val) in func.params.iter().zip(values) {
            call_env.define(param, val);
        }

        self.call_depth += 1;
        let body_result = self.eval_stmt(&func.body, call_env);
        self.call_depth -= 1;
        body_result?;

        Ok(self.returning.take().unwrap_or(Value::Nil))
    }
}

/// Seconds since the Unix epoch.
fn clock_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs_f64()
}
