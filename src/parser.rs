//! Recursive-descent parser with precedence climbing.
//!
//! Consumes the token vector produced by the scanner and builds the AST.
//! Unlike the scanner, the parser stops at the first error.

use crate::ast::{BinOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::diag::ParseError;
use crate::token::{Literal, Token, TokenKind};

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        // The scanner guarantees a trailing Eof; restore it for token
        // vectors built by hand.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, ""));
        }
        Parser { tokens, pos: 0 }
    }

    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut prg = vec![];
        while !self.check(TokenKind::Eof) {
            prg.push(self.statement()?);
        }
        Ok(prg)
    }

    /// Parses a single expression.  Mostly useful for tests and tools.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.expression()
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Return => self.return_stmt(),
            TokenKind::Fun => self.fun_decl(),
            TokenKind::For => self.for_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::LeftBrace => Ok(Stmt::Block(self.block()?)),
            TokenKind::Var => self.var_decl(),
            TokenKind::Print => {
                self.advance();
                let expr = Box::new(self.expression()?);
                self.consume(TokenKind::Semicolon, "';' after value.")?;
                Ok(Stmt::Print(expr))
            }
            _ => {
                let expr = Box::new(self.expression()?);
                // The trailing semicolon of an expression statement is
                // optional.
                if self.check(TokenKind::Semicolon) {
                    self.advance();
                }
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Current token is `return`.
    fn return_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.consume(TokenKind::Semicolon, "';' after return value.")?;
        Ok(Stmt::Return(value))
    }

    /// Current token is `var`.
    fn var_decl(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.identifier("variable name after 'var'.")?;
        let init = if self.check(TokenKind::Equal) {
            self.advance();
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "';' after variable declaration.")?;
        Ok(Stmt::VarDecl(name, init))
    }

    /// Current token is `fun`.
    fn fun_decl(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.identifier("function name after 'fun'.")?;
        self.consume(TokenKind::LeftParen, "'(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.identifier("parameter name.")?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.consume(TokenKind::RightParen, "')' after parameters.")?;
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.expected("function body to be a block."));
        }
        let body = Stmt::Block(self.block()?);
        Ok(Stmt::FunDecl(name, params, Box::new(body)))
    }

    /// Current token is `for`.  The loop desugars to `while`: the
    /// initializer and increment only add block layers when present, and
    /// a missing condition defaults to `true`.
    fn for_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.consume(TokenKind::LeftParen, "'(' after 'for'.")?;

        let initializer = match self.peek().kind {
            TokenKind::Var => Some(self.var_decl()?),
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            _ => {
                let expr = Box::new(self.expression()?);
                self.consume(TokenKind::Semicolon, "';' after loop initializer.")?;
                Some(Stmt::Expr(expr))
            }
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Bool(true)
        } else {
            self.expression()?
        };
        self.consume(TokenKind::Semicolon, "';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "')' after for clauses.")?;

        let body = self.statement()?;
        if matches!(body, Stmt::VarDecl(..)) {
            return Err(ParseError::ForBodyNotBlock);
        }

        let body = match increment {
            Some(inc) => Stmt::Block(vec![body, Stmt::Expr(Box::new(inc))]),
            None => body,
        };
        let loop_stmt = Stmt::While(Box::new(condition), Box::new(body));
        Ok(match initializer {
            Some(init) => Stmt::Block(vec![init, loop_stmt]),
            None => loop_stmt,
        })
    }

    /// Current token is `if`.
    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.consume(TokenKind::LeftParen, "'(' after 'if'.")?;
        let cond = Box::new(self.expression()?);
        self.consume(TokenKind::RightParen, "')' after condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    /// Current token is `while`.
    fn while_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        self.consume(TokenKind::LeftParen, "'(' after 'while'.")?;
        let cond = Box::new(self.expression()?);
        self.consume(TokenKind::RightParen, "')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(cond, body))
    }

    /// Current token is `{`.
    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.advance();
        let mut stmts = vec![];
        loop {
            match self.peek().kind {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(self.expected("'}'.")),
                _ => stmts.push(self.statement()?),
            }
        }
        Ok(stmts)
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.or_expr()?;
        if self.check(TokenKind::Equal) {
            self.advance();
            let rhs = self.assignment()?;
            if let Expr::Var(name) = lhs {
                Ok(Expr::Assign(name, Box::new(rhs)))
            } else {
                Err(ParseError::InvalidAssignmentTarget)
            }
        } else {
            Ok(lhs)
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_expr()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            expr = Expr::Logical(LogicalOp::Or, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.check(TokenKind::And) {
            self.advance();
            let rhs = self.equality()?;
            expr = Expr::Logical(LogicalOp::And, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinOp::Equal,
                TokenKind::BangEqual => BinOp::NotEqual,
                _ => break,
            };
            self.advance();
            expr = Expr::Binary(op, Box::new(expr), Box::new(self.comparison()?));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEqual => BinOp::LessEqual,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEqual => BinOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            expr = Expr::Binary(op, Box::new(expr), Box::new(self.term()?));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            expr = Expr::Binary(op, Box::new(expr), Box::new(self.factor()?));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Mod => BinOp::Rem,
                _ => break,
            };
            self.advance();
            expr = Expr::Binary(op, Box::new(expr), Box::new(self.unary()?));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.call(),
        };
        self.advance();
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    /// Postfix call: `primary ( '(' arguments? ')' )*`.  The callee is a
    /// full expression, so chains like `f()()` call through the returned
    /// value.
    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.check(TokenKind::LeftParen) {
            self.advance();
            let mut args = vec![];
            if !self.check(TokenKind::RightParen) {
                loop {
                    args.push(self.expression()?);
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
            }
            self.consume(TokenKind::RightParen, "')' after arguments.")?;
            expr = Expr::Call(Box::new(expr), args);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                let value = match token.literal {
                    Some(Literal::Number(n)) => n,
                    _ => unreachable!("number token without payload"),
                };
                Ok(Expr::Number(value))
            }
            TokenKind::String => {
                let token = self.advance();
                let value = match token.literal {
                    Some(Literal::Str(s)) => s,
                    _ => unreachable!("string token without payload"),
                };
                Ok(Expr::Str(value))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Var(token.lexeme))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                Ok(Expr::Group(Box::new(expr)))
            }
            _ => Err(self.expected("expression.")),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes and returns the current token.  The Eof sentinel is never
    /// consumed, so `peek` stays valid.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind, what: &'static str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(what))
        }
    }

    fn identifier(&mut self, what: &'static str) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().lexeme)
        } else {
            Err(self.expected(what))
        }
    }

    fn expected(&self, what: &'static str) -> ParseError {
        let found = match self.peek().kind {
            TokenKind::Eof => None,
            _ => Some(self.peek().lexeme.clone()),
        };
        ParseError::expected(what, found)
    }
}
