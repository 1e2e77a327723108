// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recursive-descent parser over grammar. Two entry points:
//! `Parser::parse` is strict (returns the first accumulated diagnostic
//! set as soon as parsing ends), `Parser::parse_with_recovery` resumes
//! after the next statement boundary so a single compile can report more
//! than one syntax error.

use crate::ast::*;
use crate::diagnostic::{Category, Diagnostic};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    recover: bool,
}

impl Parser {
    /// Strict parse: any diagnostic (from lexing or parsing) fails the
    /// whole compile.
    pub fn parse(source: &str) -> Result<Pipeline, Vec<Diagnostic>> {
        let (pipeline, diagnostics) = Self::run(source, false);
        if diagnostics.iter().any(Diagnostic::is_fatal) {
            Err(diagnostics)
        } else {
            pipeline.ok_or(diagnostics)
        }
    }

    /// Recovering parse: resumes after the next statement boundary on a
    /// syntax error so multiple diagnostics can be collected per compile.
    pub fn parse_with_recovery(source: &str) -> (Option<Pipeline>, Vec<Diagnostic>) {
        Self::run(source, true)
    }

    fn run(source: &str, recover: bool) -> (Option<Pipeline>, Vec<Diagnostic>) {
        let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
        let mut parser = Parser {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            recover,
        };
        let pipeline = parser.parse_pipeline();
        diagnostics.extend(parser.diagnostics);
        (Some(pipeline), diagnostics)
    }

    // --- token stream helpers ---

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error(&mut self, code: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(
                code,
                Category::Syntax,
                message,
                self.peek_span(),
        ));
    }

    fn expect(&mut self, kind: &TokenKind, code: &str) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            self.error(
                code,
                format!("unexpected token, expected {kind:?}, found {:?}", self.peek()),
            );
            false
        }
    }

    fn expect_ident(&mut self) -> String {
        if let TokenKind::Ident(name) = self.peek().clone() {
            self.bump();
            name
        } else {
            self.error("E021", format!("expected identifier, found {:?}", self.peek()));
            String::new()
        }
    }

    fn peek_ident(&self) -> Option<String> {
        if let TokenKind::Ident(name) = self.peek() {
            Some(name.clone())
        } else {
            None
        }
    }

    /// Skips tokens until a likely statement boundary (`use`, `type`,
    /// `in`, `out`, or `Ident '='`) or end of file.
    fn recover_to_statement_boundary(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Eof
                | TokenKind::Use
                | TokenKind::Type
                | TokenKind::In
                | TokenKind::Out => return,
                TokenKind::Ident(_) => {
                    let save = self.pos;
                    self.bump();
                    if self.check(&TokenKind::Eq) {
                        self.pos = save;
                        return;
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    // --- top level ---

    fn parse_pipeline(&mut self) -> Pipeline {
        let start = self.peek_span();
        let mut items = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            match self.parse_item() {
                Some(item) => items.push(item),
                None => {
                    if !self.recover {
                        break;
                    }
                    if self.pos == before {
                        self.bump();
                    }
                    self.recover_to_statement_boundary();
                }
            }
        }
        let span = start.merge(self.peek_span());
        Pipeline { items, span }
    }

    fn parse_item(&mut self) -> Option<Item> {
        match self.peek() {
            TokenKind::Use => self.parse_use().map(Item::Use),
            TokenKind::Type => self.parse_typedef().map(Item::TypeDef),
            TokenKind::In => self.parse_input().map(Item::Input),
            TokenKind::Out => self.parse_output().map(Item::Output),
            TokenKind::Ident(_) => self.parse_assignment().map(Item::Assignment),
            _ => {
                self.error("E021", format!("unexpected token {:?}", self.peek()));
                None
            }
        }
    }

    fn parse_use(&mut self) -> Option<UseDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::Use, "E021");
        let mut namespace = self.expect_ident();
        while self.check(&TokenKind::Dot) {
            self.bump();
            namespace.push('.');
            namespace.push_str(&self.expect_ident());
        }
        let alias = if self.check(&TokenKind::As) {
            self.bump();
            Some(self.expect_ident())
        } else {
            None
        };
        let span = start.merge(self.peek_span());
        Some(UseDecl {
                namespace,
                alias,
                span,
        })
    }

    fn parse_typedef(&mut self) -> Option<TypeDefDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::Type, "E021");
        let name = self.expect_ident();
        self.expect(&TokenKind::Eq, "E021");
        let ty = self.parse_type_expr();
        let span = start.merge(self.peek_span());
        Some(TypeDefDecl { name, ty, span })
    }

    fn parse_input(&mut self) -> Option<InputDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::In, "E021");
        let name = self.expect_ident();
        self.expect(&TokenKind::Colon, "E021");
        let ty = self.parse_type_expr();
        let mut examples = Vec::new();
        while self.check(&TokenKind::At) {
            self.bump();
            let annotation = self.expect_ident();
            self.expect(&TokenKind::LParen, "E021");
            if annotation == "example" {
                if let Some(lit) = self.parse_literal() {
                    examples.push(lit);
                }
            }
            self.expect(&TokenKind::RParen, "E021");
        }
        let span = start.merge(self.peek_span());
        Some(InputDecl {
                name,
                ty,
                examples,
                span,
        })
    }

    fn parse_output(&mut self) -> Option<OutputDecl> {
        let start = self.peek_span();
        self.expect(&TokenKind::Out, "E021");
        let name = self.expect_ident();
        let span = start.merge(self.peek_span());
        Some(OutputDecl { name, span })
    }

    fn parse_assignment(&mut self) -> Option<Assignment> {
        let start = self.peek_span();
        let name = self.expect_ident();
        self.expect(&TokenKind::Eq, "E021");
        let expr = self.parse_expr();
        let span = start.merge(self.peek_span());
        Some(Assignment { name, expr, span })
    }

    fn parse_literal(&mut self) -> Option<Literal> {
        match self.peek().clone() {
            TokenKind::Int(i) => {
                self.bump();
                Some(Literal::Int(i))
            }
            TokenKind::Float(f) => {
                self.bump();
                Some(Literal::Float(f))
            }
            TokenKind::Str(s) => {
                self.bump();
                Some(Literal::Str(s))
            }
            TokenKind::Bool(b) => {
                self.bump();
                Some(Literal::Bool(b))
            }
            _ => {
                self.error("E021", "expected a literal");
                None
            }
        }
    }

    // --- type expressions ---

    fn parse_type_expr(&mut self) -> TypeExpr {
        let lhs = self.parse_type_atom();
        if self.check(&TokenKind::Pipe) {
            let mut members = vec![lhs.clone()];
            let start = lhs.span;
            while self.check(&TokenKind::Pipe) {
                self.bump();
                members.push(self.parse_type_atom());
            }
            let span = start.merge(self.peek_span());
            return TypeExpr {
                kind: TypeExprKind::Union(members),
                span,
            };
        }
        lhs
    }

    fn parse_type_atom(&mut self) -> TypeExpr {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::LBrace => {
                self.bump();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::RBrace) && !self.at_eof() {
                    let name = self.expect_ident();
                    self.expect(&TokenKind::Colon, "E021");
                    let ty = self.parse_type_expr();
                    fields.push((name, ty));
                    if self.check(&TokenKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace, "E021");
                TypeExpr {
                    kind: TypeExprKind::Record(fields),
                    span: start.merge(self.peek_span()),
                }
            }
            TokenKind::Ident(name) => {
                self.bump();
                match name.as_str() {
                    "String" => self.atom(TypeExprKind::String, start),
                    "Int" => self.atom(TypeExprKind::Int, start),
                    "Float" => self.atom(TypeExprKind::Float, start),
                    "Boolean" => self.atom(TypeExprKind::Boolean, start),
                    "List" => {
                        self.expect(&TokenKind::Lt, "E021");
                        let elem = self.parse_type_expr();
                        self.expect(&TokenKind::Gt, "E021");
                        self.atom(TypeExprKind::List(Box::new(elem)), start)
                    }
                    "Map" => {
                        self.expect(&TokenKind::Lt, "E021");
                        let key = self.parse_type_expr();
                        self.expect(&TokenKind::Comma, "E021");
                        let value = self.parse_type_expr();
                        self.expect(&TokenKind::Gt, "E021");
                        self.atom(TypeExprKind::Map(Box::new(key), Box::new(value)), start)
                    }
                    "Optional" => {
                        self.expect(&TokenKind::Lt, "E021");
                        let inner = self.parse_type_expr();
                        self.expect(&TokenKind::Gt, "E021");
                        self.atom(TypeExprKind::Optional(Box::new(inner)), start)
                    }
                    _ => self.atom(TypeExprKind::Ref(name), start),
                }
            }
            _ => {
                self.error("E021", "expected a type expression");
                TypeExpr {
                    kind: TypeExprKind::Ref(String::new()),
                    span: start,
                }
            }
        }
    }

    fn atom(&mut self, kind: TypeExprKind, start: Span) -> TypeExpr {
        TypeExpr {
            kind,
            span: start.merge(self.peek_span()),
        }
    }

    // --- expressions: precedence climbing ---

    pub fn parse_expr(&mut self) -> Expr {
        self.parse_guard()
    }

    fn parse_guard(&mut self) -> Expr {
        let expr = self.parse_coalesce();
        if self.check(&TokenKind::When) {
            self.bump();
            let cond = self.parse_coalesce();
            let span = expr.span.merge(cond.span);
            return Expr {
                kind: ExprKind::Guard {
                    expr: Box::new(expr),
                    cond: Box::new(cond),
                },
                span,
            };
        }
        expr
    }

    fn parse_coalesce(&mut self) -> Expr {
        let mut lhs = self.parse_or();
        while self.check(&TokenKind::QuestionQuestion) {
            self.bump();
            let rhs = self.parse_or();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Coalesce(Box::new(lhs), Box::new(rhs)),
                span,
            };
        }
        lhs
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.check(&TokenKind::OrOr) {
            self.bump();
            let rhs = self.parse_and();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::BoolBinary {
                    op: BoolOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_comparison();
        while self.check(&TokenKind::AndAnd) {
            self.bump();
            let rhs = self.parse_comparison();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::BoolBinary {
                    op: BoolOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        lhs
    }

    fn parse_comparison(&mut self) -> Expr {
        let lhs = self.parse_merge();
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::GtEq,
            _ => return lhs,
        };
        self.bump();
        let rhs = self.parse_merge();
        let span = lhs.span.merge(rhs.span);
        Expr {
            kind: ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        }
    }

    fn parse_merge(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        while self.check(&TokenKind::Plus) {
            self.bump();
            let rhs = self.parse_additive();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Merge(Box::new(lhs), Box::new(rhs)),
                span,
            };
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        while self.check(&TokenKind::Minus) {
            self.bump();
            let rhs = self.parse_multiplicative();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Arith {
                    op: ArithOp::Sub,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary();
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Arith {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.peek_span();
        if self.check(&TokenKind::Not) {
            self.bump();
            let expr = self.parse_unary();
            let span = start.merge(expr.span);
            return Expr {
                kind: ExprKind::Not(Box::new(expr)),
                span,
            };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let start = self.peek_span();
        let mut expr = if let Some(first) = self.peek_ident() {
            self.bump();
            let mut path = vec![first];
            while self.check(&TokenKind::Dot) {
                // Only fold into the qualified path if the token after the
                // dot is an identifier; otherwise let the generic postfix
                // loop below handle it as ordinary field access.
                if let TokenKind::Ident(_) = &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind {
                    self.bump();
                    path.push(self.expect_ident());
                } else {
                    break;
                }
            }
            if self.check(&TokenKind::LParen) {
                self.bump();
                let args = self.parse_args();
                self.expect(&TokenKind::RParen, "E021");
                let options = self.parse_with_clause();
                Expr {
                    kind: ExprKind::Call {
                        module: path.join("."),
                        args,
                        options,
                    },
                    span: start.merge(self.peek_span()),
                }
            } else {
                let mut e = Expr {
                    kind: ExprKind::Var(path[0].clone()),
                    span: start,
                };
                for seg in &path[1..] {
                    e = Expr {
                        span: e.span.merge(start),
                        kind: ExprKind::Field(Box::new(e), seg.clone()),
                    };
                }
                e
            }
        } else {
            self.parse_primary()
        };

        loop {
            if self.check(&TokenKind::Dot) {
                self.bump();
                let field = self.expect_ident();
                let span = expr.span.merge(self.peek_span());
                expr = Expr {
                    kind: ExprKind::Field(Box::new(expr), field),
                    span,
                };
            } else if self.check(&TokenKind::LBracket) {
                self.bump();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.at_eof() {
                    fields.push(self.expect_ident());
                    if self.check(&TokenKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "E021");
                let span = expr.span.merge(self.peek_span());
                expr = Expr {
                    kind: ExprKind::Project(Box::new(expr), fields),
                    span,
                };
            } else {
                break;
            }
        }
        expr
    }

    fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_eof() {
            args.push(self.parse_expr());
            if self.check(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        args
    }

    fn parse_with_clause(&mut self) -> Vec<OptionArg> {
        if !self.check(&TokenKind::With) {
            return Vec::new();
        }
        self.bump();
        let mut options = Vec::new();
        loop {
            let start = self.peek_span();
            let name = self.expect_ident();
            self.expect(&TokenKind::Colon, "E021");
            let value = self.parse_option_value(&name);
            let span = start.merge(self.peek_span());
            options.push(OptionArg { name, value, span });
            if self.check(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        options
    }

    fn parse_option_value(&mut self, name: &str) -> OptionValue {
        match name {
            "throttle" => {
                // `count/duration`, e.g. `100/1min`.
                let count = match self.peek().clone() {
                    TokenKind::Int(i) => {
                        self.bump();
                        i
                    }
                    _ => {
                        self.error("E013", "expected an integer throttle count");
                        0
                    }
                };
                self.expect(&TokenKind::Slash, "E021");
                let per = self.parse_duration_token();
                OptionValue::Rate { count, per }
            }
            "retry" | "concurrency" => match self.peek().clone() {
                TokenKind::Int(i) => {
                    self.bump();
                    OptionValue::Int(i)
                }
                _ => {
                    self.error("E013", format!("`{name}` expects an integer"));
                    OptionValue::Int(0)
                }
            },
            "timeout" | "delay" | "cache" => OptionValue::Duration(self.parse_duration_token()),
            "lazy" => match self.peek().clone() {
                TokenKind::Bool(b) => {
                    self.bump();
                    OptionValue::Bool(b)
                }
                _ => {
                    self.error("E013", "`lazy` expects a boolean");
                    OptionValue::Bool(false)
                }
            },
            "cache_backend" => match self.peek().clone() {
                TokenKind::Str(s) => {
                    self.bump();
                    OptionValue::Str(s)
                }
                _ => {
                    self.error("E013", "`cache_backend` expects a string literal");
                    OptionValue::Str(String::new())
                }
            },
            "backoff" | "on_error" | "priority" => match self.peek().clone() {
                TokenKind::Ident(id) => {
                    self.bump();
                    OptionValue::Ident(id)
                }
                TokenKind::Int(i) => {
                    self.bump();
                    OptionValue::Int(i)
                }
                _ => {
                    self.error("E013", format!("invalid value for `{name}`"));
                    OptionValue::Ident(String::new())
                }
            },
            "fallback" => OptionValue::Expr(Box::new(self.parse_expr())),
            _ => OptionValue::Expr(Box::new(self.parse_expr())),
        }
    }

    fn parse_duration_token(&mut self) -> std::time::Duration {
        match self.peek().clone() {
            TokenKind::Ident(text) => {
                self.bump();
                parse_duration(&text).unwrap_or_else(|| {
                        self.error("E013", format!("invalid duration literal `{text}`"));
                        std::time::Duration::ZERO
                })
            }
            _ => {
                self.error("E013", "expected a duration literal (e.g. `100ms`, `5s`)");
                std::time::Duration::ZERO
            }
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::Int(i) => {
                self.bump();
                Expr {
                    kind: ExprKind::IntLit(i),
                    span: start,
                }
            }
            TokenKind::Float(f) => {
                self.bump();
                Expr {
                    kind: ExprKind::FloatLit(f),
                    span: start,
                }
            }
            TokenKind::Bool(b) => {
                self.bump();
                Expr {
                    kind: ExprKind::BoolLit(b),
                    span: start,
                }
            }
            TokenKind::Str(text) => {
                self.bump();
                self.build_string_literal(&text, start)
            }
            TokenKind::Minus => {
                self.bump();
                let inner = self.parse_unary();
                let span = start.merge(inner.span);
                match inner.kind {
                    ExprKind::IntLit(i) => Expr {
                        kind: ExprKind::IntLit(-i),
                        span,
                    },
                    ExprKind::FloatLit(f) => Expr {
                        kind: ExprKind::FloatLit(-f),
                        span,
                    },
                    _ => Expr {
                        kind: ExprKind::Arith {
                            op: ArithOp::Sub,
                            lhs: Box::new(Expr {
                                    kind: ExprKind::IntLit(0),
                                    span: start,
                            }),
                            rhs: Box::new(inner),
                        },
                        span,
                    },
                }
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.at_eof() {
                    items.push(self.parse_expr());
                    if self.check(&TokenKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket, "E021");
                Expr {
                    kind: ExprKind::ListLit(items),
                    span: start.merge(self.peek_span()),
                }
            }
            TokenKind::LBrace => {
                self.bump();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::RBrace) && !self.at_eof() {
                    let name = self.expect_ident();
                    self.expect(&TokenKind::Colon, "E021");
                    let value = self.parse_expr();
                    fields.push((name, value));
                    if self.check(&TokenKind::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace, "E021");
                Expr {
                    kind: ExprKind::RecordLit(fields),
                    span: start.merge(self.peek_span()),
                }
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr();
                self.expect(&TokenKind::RParen, "E021");
                expr
            }
            TokenKind::Pipe => self.parse_lambda(),
            TokenKind::If => self.parse_if(),
            TokenKind::Branch => self.parse_branch(),
            _ => {
                self.error("E021", format!("unexpected token {:?}", self.peek()));
                Expr {
                    kind: ExprKind::Var(String::new()),
                    span: start,
                }
            }
        }
    }

    fn parse_lambda(&mut self) -> Expr {
        let start = self.peek_span();
        self.expect(&TokenKind::Pipe, "E021");
        let mut params = Vec::new();
        while !self.check(&TokenKind::Pipe) && !self.at_eof() {
            params.push(self.expect_ident());
            if self.check(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::Pipe, "E021");
        let body = self.parse_expr();
        let span = start.merge(body.span);
        Expr {
            kind: ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        }
    }

    fn parse_if(&mut self) -> Expr {
        let start = self.peek_span();
        self.expect(&TokenKind::If, "E021");
        let cond = self.parse_expr();
        self.expect(&TokenKind::Then, "E021");
        let then_branch = self.parse_expr();
        self.expect(&TokenKind::Else, "E021");
        let else_branch = self.parse_expr();
        let span = start.merge(else_branch.span);
        Expr {
            kind: ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        }
    }

    fn parse_branch(&mut self) -> Expr {
        let start = self.peek_span();
        self.expect(&TokenKind::Branch, "E021");
        let mut arms = Vec::new();
        while self.check(&TokenKind::When) {
            self.bump();
            let cond = self.parse_expr();
            self.expect(&TokenKind::FatArrow, "E021");
            let value = self.parse_expr();
            arms.push((cond, value));
        }
        self.expect(&TokenKind::Otherwise, "E021");
        self.expect(&TokenKind::FatArrow, "E021");
        let otherwise = self.parse_expr();
        let span = start.merge(otherwise.span);
        Expr {
            kind: ExprKind::Branch {
                arms,
                otherwise: Box::new(otherwise),
            },
            span,
        }
    }

    /// Splits a lexed string literal's raw text on `${...}` markers and
    /// recursively parses each interpolated segment as an expression.
    fn build_string_literal(&mut self, text: &str, span: Span) -> Expr {
        if !text.contains("${") {
            return Expr {
                kind: ExprKind::StringLit(text.to_string()),
                span,
            };
        }
        let mut parts = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            if start > 0 {
                parts.push(InterpPart::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                self.error("E021", "unterminated interpolation in string literal");
                break;
            };
            let inner_source = &after[..end];
            let (tokens, mut diags) = Lexer::new(inner_source).tokenize();
            let mut sub = Parser {
                tokens,
                pos: 0,
                diagnostics: Vec::new(),
                recover: false,
            };
            let inner_expr = sub.parse_expr();
            diags.extend(sub.diagnostics);
            self.diagnostics.extend(diags);
            parts.push(InterpPart::Expr(inner_expr));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            parts.push(InterpPart::Literal(rest.to_string()));
        }
        Expr {
            kind: ExprKind::Interpolate(parts),
            span,
        }
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
