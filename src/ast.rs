//! Abstract syntax tree and its canonical textual rendering.

use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expr(Box<Expr>),
    Print(Box<Expr>),
    VarDecl(String, Option<Box<Expr>>),
    FunDecl(String, Vec<String>, Box<Stmt>),
    Block(Vec<Stmt>),
    If(Box<Expr>, Box<Stmt>, Option<Box<Stmt>>),
    While(Box<Expr>, Box<Stmt>),
    Return(Option<Box<Expr>>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Nil,
    Number(f64),
    Str(String),
    Bool(bool),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Group(Box<Expr>),
    Assign(String, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        })
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::Less => "<",
            BinOp::LessEqual => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEqual => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

/// Number literals render with at least one fractional digit so that
/// `5` and `5.0` read back the same way.
fn fmt_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil => f.write_str("nil"),
            Expr::Number(n) => fmt_number(f, *n),
            Expr::Str(s) => f.write_str(s),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Var(name) => f.write_str(name),
            Expr::Unary(op, e) => write!(f, "({} {})", op, e),
            Expr::Binary(op, l, r) => write!(f, "({} {} {})", op, l, r),
            Expr::Logical(op, l, r) => write!(f, "({} {} {})", op, l, r),
            Expr::Group(e) => write!(f, "(group {})", e),
            Expr::Assign(name, e) => write!(f, "(= {} {})", name, e),
            Expr::Call(callee, args) => {
                write!(f, "(call {}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(e) => write!(f, "{}", e),
            Stmt::Print(e) => write!(f, "(print {})", e),
            Stmt::VarDecl(name, None) => write!(f, "(var {})", name),
            Stmt::VarDecl(name, Some(init)) => write!(f, "(var {} = {})", name, init),
            Stmt::FunDecl(name, params, body) => {
                write!(f, "(fun {} (", name)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(p)?;
                }
                write!(f, ") {})", body)
            }
            // Blocks share the program rendering.
            Stmt::Block(stmts) => {
                f.write_str("(program")?;
                for stmt in stmts {
                    write!(f, " {}", stmt)?;
                }
                f.write_str(")")
            }
            Stmt::If(cond, then_branch, None) => write!(f, "(if {} {})", cond, then_branch),
            Stmt::If(cond, then_branch, Some(else_branch)) => {
                write!(f, "(if {} {} {})", cond, then_branch, else_branch)
            }
            Stmt::While(cond, body) => write!(f, "(while {} {})", cond, body),
            Stmt::Return(None) => f.write_str("(return)"),
            Stmt::Return(Some(e)) => write!(f, "(return {})", e),
        }
    }
}

/// Renders a whole program.  A single-statement program prints as that
/// statement alone.
pub fn render_program(stmts: &[Stmt]) -> String {
    if stmts.len() == 1 {
        return stmts[0].to_string();
    }
    let mut out = String::from("(program");
    for stmt in stmts {
        out.push(' ');
        out.push_str(&stmt.to_string());
    }
    out.push(')');
    out
}
