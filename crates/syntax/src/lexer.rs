// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand-written lexer. Never panics on malformed input: an unrecognized
//! byte is reported as a `Syntax` diagnostic and skipped so the remainder
//! of the source still lexes.

use crate::diagnostic::{Category, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                        kind: TokenKind::Eof,
                        span: Span::point(start),
                });
                break;
            };
            let kind = match c {
                '"' => self.lex_string(),
                c if c.is_ascii_digit() => self.lex_number(),
                c if is_ident_start(c) => self.lex_ident_or_keyword(),
                _ => self.lex_punct(),
            };
            if let Some(kind) = kind {
                let span = Span::new(start, self.pos - start);
                tokens.push(Token { kind, span });
            }
        }
        (tokens, self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        Some(match text {
                "use" => TokenKind::Use,
                "as" => TokenKind::As,
                "type" => TokenKind::Type,
                "in" => TokenKind::In,
                "out" => TokenKind::Out,
                "if" => TokenKind::If,
                "then" => TokenKind::Then,
                "else" => TokenKind::Else,
                "branch" => TokenKind::Branch,
                "when" => TokenKind::When,
                "otherwise" => TokenKind::Otherwise,
                "with" => TokenKind::With,
                "true" => TokenKind::Bool(true),
                "false" => TokenKind::Bool(false),
                "not" => TokenKind::Not,
                _ => TokenKind::Ident(text.to_string()),
        })
    }

    fn lex_number(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        // Duration suffixes (100ms, 5s, 30min) used by `with` option values.
        if matches!(self.peek(), Some('m') | Some('s') | Some('h')) {
            while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                self.bump();
            }
            let text = &self.source[start..self.pos];
            return Some(TokenKind::Ident(text.to_string()));
        }
        let text = &self.source[start..self.pos];
        if is_float {
            match text.parse::<f64>() {
                Ok(f) => Some(TokenKind::Float(f)),
                Err(_) => {
                    self.diagnostics.push(Diagnostic::error(
                            "E020",
                            Category::Syntax,
                            format!("invalid float literal `{text}`"),
                            Span::new(start, self.pos - start),
                    ));
                    None
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Some(TokenKind::Int(i)),
                Err(_) => {
                    self.diagnostics.push(Diagnostic::error(
                            "E020",
                            Category::Syntax,
                            format!("invalid integer literal `{text}`"),
                            Span::new(start, self.pos - start),
                    ));
                    None
                }
            }
        }
    }

    fn lex_string(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    self.diagnostics.push(Diagnostic::error(
                            "E020",
                            Category::Syntax,
                            "unterminated string literal",
                            Span::new(start, self.pos - start),
                    ));
                    break;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some('$') => text.push('$'),
                        Some(other) => text.push(other),
                        None => {}
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        Some(TokenKind::Str(text))
    }

    fn lex_punct(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        let c = self.bump()?;
        let kind = match c {
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '@' => TokenKind::At,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::EqEq
                } else if self.peek() == Some('>') {
                    self.bump();
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::NotEq
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' if self.peek() == Some('&') => {
                self.bump();
                TokenKind::AndAnd
            }
            '?' if self.peek() == Some('?') => {
                self.bump();
                TokenKind::QuestionQuestion
            }
            other => {
                self.diagnostics.push(Diagnostic::error(
                        "E020",
                        Category::Syntax,
                        format!("unexpected character `{other}`"),
                        Span::new(start, self.pos - start),
                ));
                return None;
            }
        };
        Some(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
