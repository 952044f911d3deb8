//! Lexical analyzer.

use std::iter::Peekable;
use std::str::Chars;

use crate::diag::{LexError, LexErrorKind, Position};
use crate::token::{Literal, Token, TokenKind};

/// Turns source text into a sequence of tokens.
///
/// Lexical errors are recorded and the scan keeps going, so a single pass
/// can report every offending character.  The token stream always ends
/// with an `Eof` sentinel.
#[derive(Debug)]
pub struct Scanner<'s> {
    input: Peekable<Chars<'s>>,
    line: Position,
    errors: Vec<LexError>,

    // Buffer used when scanning longer tokens.  Allocated here to reuse memory.
    buf: String,
}

impl<'s> Scanner<'s> {
    /// Creates a new scanner operating on `source`.
    pub fn new(source: &'s str) -> Scanner<'s> {
        Scanner {
            input: source.chars().peekable(),
            line: 1,
            errors: Vec::new(),
            buf: String::new(),
        }
    }

    /// Scans the whole input and returns the tokens together with every
    /// lexical error encountered along the way.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, ""));
        (tokens, self.errors)
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let ch = self.input.next()?;
            match ch {
                '\n' => self.line += 1,
                ' ' | '\t' | '\r' => (),
                '+' => return Some(Token::new(TokenKind::Plus, "+")),
                '-' => return Some(Token::new(TokenKind::Minus, "-")),
                '*' => return Some(Token::new(TokenKind::Star, "*")),
                '%' => return Some(Token::new(TokenKind::Mod, "%")),
                ';' => return Some(Token::new(TokenKind::Semicolon, ";")),
                ',' => return Some(Token::new(TokenKind::Comma, ",")),
                '.' => return Some(Token::new(TokenKind::Dot, ".")),
                ':' => return Some(Token::new(TokenKind::Colon, ":")),
                '(' => return Some(Token::new(TokenKind::LeftParen, "(")),
                ')' => return Some(Token::new(TokenKind::RightParen, ")")),
                '{' => return Some(Token::new(TokenKind::LeftBrace, "{")),
                '}' => return Some(Token::new(TokenKind::RightBrace, "}")),
                '[' => return Some(Token::new(TokenKind::LeftBracket, "[")),
                ']' => return Some(Token::new(TokenKind::RightBracket, "]")),
                '/' => {
                    if self.input.peek() == Some(&'/') {
                        self.skip_line_comment();
                    } else {
                        return Some(Token::new(TokenKind::Slash, "/"));
                    }
                }
                '=' => {
                    return Some(self.one_or_two_chars(
                        TokenKind::Equal,
                        "=",
                        TokenKind::EqualEqual,
                        "==",
                    ));
                }
                '!' => {
                    return Some(self.one_or_two_chars(
                        TokenKind::Bang,
                        "!",
                        TokenKind::BangEqual,
                        "!=",
                    ));
                }
                '>' => {
                    return Some(self.one_or_two_chars(
                        TokenKind::Greater,
                        ">",
                        TokenKind::GreaterEqual,
                        ">=",
                    ));
                }
                '<' => {
                    if self.input.peek() == Some(&'|') {
                        self.input.next();
                        self.skip_block_comment();
                    } else {
                        return Some(self.one_or_two_chars(
                            TokenKind::Less,
                            "<",
                            TokenKind::LessEqual,
                            "<=",
                        ));
                    }
                }
                '"' => {
                    if let Some(token) = self.scan_string() {
                        return Some(token);
                    }
                }
                '0'..='9' => return Some(self.scan_number(ch)),
                'a'..='z' | 'A'..='Z' | '_' => return Some(self.scan_identifier(ch)),
                _ => self.errors.push(LexError {
                    line: self.line,
                    kind: LexErrorKind::UnexpectedCharacter(ch),
                }),
            }
        }
    }

    /// Consumes a trailing `=` into the two-character operator, otherwise
    /// yields the single-character one.
    fn one_or_two_chars(
        &mut self,
        single: TokenKind,
        single_lexeme: &str,
        double: TokenKind,
        double_lexeme: &str,
    ) -> Token {
        if self.input.peek() == Some(&'=') {
            self.input.next();
            Token::new(double, double_lexeme)
        } else {
            Token::new(single, single_lexeme)
        }
    }

    fn skip_line_comment(&mut self) {
        // The newline is left in place so the main loop counts it.
        while let Some(ch) = self.input.peek() {
            if *ch == '\n' {
                break;
            }
            self.input.next();
        }
    }

    /// Skips a `<| ... |>` block comment.  The line counter is not touched
    /// inside; an unterminated comment swallows the rest of the input.
    fn skip_block_comment(&mut self) {
        while let Some(ch) = self.input.next() {
            if ch == '|' && self.input.peek() == Some(&'>') {
                self.input.next();
                return;
            }
        }
    }

    /// Scans a string literal.  Returns `None` when the input ends before
    /// the closing quote, in which case an error has been recorded.
    fn scan_string(&mut self) -> Option<Token> {
        self.buf.clear();
        loop {
            match self.input.next() {
                Some('"') => break,
                Some(ch) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    self.buf.push(ch);
                }
                None => {
                    self.errors.push(LexError {
                        line: self.line,
                        kind: LexErrorKind::UnterminatedString,
                    });
                    return None;
                }
            }
        }
        let lexeme = format!("\"{}\"", self.buf);
        Some(Token::with_literal(
            TokenKind::String,
            lexeme,
            Literal::Str(self.buf.clone()),
        ))
    }

    fn scan_number(&mut self, first_digit: char) -> Token {
        self.buf.clear();
        self.buf.push(first_digit);
        self.consume_digits();
        // A dot only belongs to the number when a digit follows it.
        if self.input.peek() == Some(&'.') && self.second_char().is_some_and(|c| c.is_ascii_digit())
        {
            self.buf.push('.');
            self.input.next();
            self.consume_digits();
        }

        let value = self
            .buf
            .parse::<f64>()
            .expect("digit run is a valid number literal");
        Token::with_literal(TokenKind::Number, self.buf.clone(), Literal::Number(value))
    }

    fn consume_digits(&mut self) {
        while let Some(ch) = self.input.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.buf.push(*ch);
            self.input.next();
        }
    }

    /// Looks one character past the peeked one.
    fn second_char(&self) -> Option<char> {
        let mut lookahead = self.input.clone();
        lookahead.next();
        lookahead.next()
    }

    fn scan_identifier(&mut self, first_char: char) -> Token {
        self.buf.clear();
        self.buf.push(first_char);
        while let Some(ch) = self.input.peek() {
            if !(ch.is_ascii_alphanumeric() || *ch == '_') {
                break;
            }
            self.buf.push(*ch);
            self.input.next();
        }

        match TokenKind::keyword(&self.buf) {
            Some(kind) => Token::new(kind, self.buf.clone()),
            None => Token::new(TokenKind::Identifier, self.buf.clone()),
        }
    }
}
