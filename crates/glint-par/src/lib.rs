//! glint-par - recursive-descent/Pratt parser for the front-end pipeline.
//!
//! Turns a [`glint_lex`] token stream into an [`ast::Item`] tree. Parsing is
//! error-tolerant: a malformed construct reports through the
//! [`glint_util::Handler`] and the parser resynchronizes at the next
//! statement or item boundary rather than aborting the whole parse.

pub mod ast;
mod expr;
mod items;
mod pattern;
mod stmt;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::*;

use expr::bp;
use glint_lex::Token;
use glint_util::{DiagnosticBuilder, Handler, Span};

/// Recursive-descent parser over a token stream.
///
/// Holds a cursor into a flattened `Vec<TokenWithSpan>` rather than
/// re-reading from the lexer, so lookahead is just indexing.
pub struct Parser<'a> {
    tokens: Vec<TokenWithSpan>,
    position: usize,
    source: &'a str,
    handler: &'a mut Handler,
    struct_lit_allowed: bool,
}

impl<'a> Parser<'a> {
    /// Build a parser from bare tokens, e.g. from an iterator over
    /// [`glint_lex::Lexer`]. Spans are unavailable in this form and default
    /// to [`Span::DUMMY`].
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|token| TokenWithSpan::new(token, Span::DUMMY))
            .collect();

        Self {
            tokens,
            position: 0,
            source: "",
            handler,
            struct_lit_allowed: true,
        }
    }

    /// Build a parser from tokens that already carry spans.
    pub fn from_tokens(tokens: Vec<TokenWithSpan>, handler: &'a mut Handler, source: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            source,
            handler,
            struct_lit_allowed: true,
        }
    }

    /// Parse every top-level item, resynchronizing past malformed ones.
    pub fn parse(&mut self) -> Ast {
        let mut items = Vec::new();

        while !self.is_at_end() {
            if let Some(item) = self.parse_item() {
                items.push(item);
            } else {
                self.recover_to_sync_point();
            }
        }

        items
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn current_token(&self) -> Token {
        self.tokens.get(self.position).map(|t| t.token.clone()).unwrap_or(Token::Eof)
    }

    pub fn peek_token(&self) -> Token {
        self.tokens.get(self.position + 1).map(|t| t.token.clone()).unwrap_or(Token::Eof)
    }

    pub fn current_span(&self) -> Span {
        self.tokens.get(self.position).map(|t| t.span).unwrap_or(Span::DUMMY)
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len() || self.current_token() == Token::Eof
    }

    pub fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    pub fn match_token(&mut self, expected: Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: Token) -> Option<()> {
        if self.match_token(expected.clone()) {
            Some(())
        } else {
            self.error(format!("expected {:?}, found {:?}", expected, self.current_token()));
            None
        }
    }

    /// Span covering from `start` through the token just consumed.
    pub fn span_from_start(&self, start: Span) -> Span {
        let end = if self.position > 0 {
            self.tokens.get(self.position - 1).map(|t| t.span.end).unwrap_or(start.end)
        } else {
            start.end
        };
        Span::new(start.start, end, start.line, start.column)
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        let span = self.current_span();
        DiagnosticBuilder::error(msg.into()).span(span).emit(self.handler);
    }

    /// Skip tokens until a plausible item boundary, for top-level recovery.
    pub fn recover_to_sync_point(&mut self) {
        while !self.is_at_end() {
            match self.current_token() {
                Token::Semicolon => {
                    self.advance();
                    return;
                },
                Token::Fn
                | Token::Struct
                | Token::Enum
                | Token::Trait
                | Token::Impl
                | Token::Use
                | Token::Const
                | Token::Static
                | Token::Mod
                | Token::RBrace => return,
                _ => self.advance(),
            }
        }
    }

    /// Skip tokens until a plausible statement boundary, for block recovery.
    pub fn recover_to_stmt_sync(&mut self) {
        while !self.is_at_end() {
            match self.current_token() {
                Token::Semicolon => {
                    self.advance();
                    return;
                },
                Token::RBrace | Token::Let | Token::If | Token::While | Token::For | Token::Return | Token::Break | Token::Continue => return,
                _ => self.advance(),
            }
        }
    }

    fn can_start_expr(&self) -> bool {
        !self.is_at_end()
            && !matches!(
                self.current_token(),
                Token::Semicolon | Token::RBrace | Token::RParen | Token::RBracket | Token::Comma
            )
    }

    /// Runs `f` with struct-literal braces temporarily allowed or forbidden,
    /// restoring the previous setting afterward. `if`/`while`/`for`
    /// conditions and `match` scrutinees forbid it so the opening `{` of the
    /// body isn't swallowed as a struct literal; parenthesized or bracketed
    /// subexpressions re-allow it.
    fn with_struct_lit_allowed<T>(&mut self, allowed: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let prev = self.struct_lit_allowed;
        self.struct_lit_allowed = allowed;
        let result = f(self);
        self.struct_lit_allowed = prev;
        result
    }

    pub(crate) fn enter_no_struct_literal(&mut self) -> bool {
        std::mem::replace(&mut self.struct_lit_allowed, false)
    }

    pub(crate) fn restore_struct_literal(&mut self, prev: bool) {
        self.struct_lit_allowed = prev;
    }

    /// Parse a full expression at the loosest binding power.
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_with_min_bp(bp::MIN)
    }

    /// Pratt-parse an expression, stopping before any infix operator whose
    /// left binding power is weaker than `min_bp`.
    pub fn parse_expr_with_min_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let start_span = self.current_span();
        let mut lhs = self.parse_prefix()?;

        loop {
            if matches!(self.current_token(), Token::DotDot | Token::DotDotEq) {
                if bp::MIN + 1 < min_bp {
                    break;
                }
                let inclusive = self.current_token() == Token::DotDotEq;
                self.advance();
                let end = if self.can_start_expr() {
                    Some(Box::new(self.parse_expr_with_min_bp(bp::MIN + 2)?))
                } else {
                    None
                };
                lhs = Expr::Range(RangeExpr {
                    start: Some(Box::new(lhs)),
                    end,
                    inclusive,
                });
                continue;
            }

            let Some((left_bp, right_bp)) = self.infix_binding_power() else { break };
            if left_bp < min_bp {
                break;
            }
            let Some(op) = self.token_to_binop(&self.current_token()) else { break };
            self.advance();
            let rhs = self.parse_expr_with_min_bp(right_bp)?;
            let span = self.span_from_start(start_span);
            lhs = Expr::Binary(BinaryExpr {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            });
        }

        Some(lhs)
    }

    fn infix_binding_power(&self) -> Option<(u8, u8)> {
        let left = match self.current_token() {
            Token::OrOr => bp::LOGICAL_OR,
            Token::AndAnd => bp::LOGICAL_AND,
            Token::EqEq | Token::NotEq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => bp::COMPARISON,
            Token::Pipe => bp::BITWISE_OR,
            Token::Caret => bp::BITWISE_XOR,
            Token::Ampersand => bp::BITWISE_AND,
            Token::Shl | Token::Shr => bp::SHIFT,
            Token::Plus | Token::Minus => bp::ADDITIVE,
            Token::Star | Token::Slash | Token::Percent => bp::MULTIPLICATIVE,
            _ => return None,
        };
        Some((left, left + 1))
    }

    fn token_to_binop(&self, token: &Token) -> Option<BinOp> {
        Some(match token {
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Percent => BinOp::Mod,
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::Gt => BinOp::Gt,
            Token::LtEq => BinOp::Le,
            Token::GtEq => BinOp::Ge,
            Token::AndAnd => BinOp::And,
            Token::OrOr => BinOp::Or,
            Token::Ampersand => BinOp::BitAnd,
            Token::Pipe => BinOp::BitOr,
            Token::Caret => BinOp::BitXor,
            Token::Shl => BinOp::Shl,
            Token::Shr => BinOp::Shr,
            _ => return None,
        })
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        let atom = self.parse_prefix_atom()?;
        self.parse_postfix(atom)
    }

    fn parse_prefix_atom(&mut self) -> Option<Expr> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                Some(Expr::Literal(Literal::Int(n as i64)))
            },
            Token::Float(f) => {
                self.advance();
                Some(Expr::Literal(Literal::Float(f)))
            },
            Token::String(s) => {
                self.advance();
                Some(Expr::Literal(Literal::String(s)))
            },
            Token::Char(c) => {
                self.advance();
                Some(Expr::Literal(Literal::Char(c)))
            },
            Token::True => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(true)))
            },
            Token::False => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(false)))
            },
            Token::Minus => self.parse_unary(UnOp::Neg),
            Token::Bang => self.parse_unary(UnOp::Not),
            Token::Tilde => self.parse_unary(UnOp::BitNot),
            Token::Star => self.parse_unary(UnOp::Deref),
            Token::Ampersand => self.parse_unary_ref(),
            Token::Await => {
                self.advance();
                let inner = self.parse_expr_with_min_bp(bp::MAX)?;
                Some(Expr::Await(Box::new(inner)))
            },
            Token::Return => {
                self.advance();
                let value = if self.can_start_expr() { Some(Box::new(self.parse_expr()?)) } else { None };
                Some(Expr::Return(value))
            },
            Token::Break => {
                self.advance();
                let value = if self.can_start_expr() { Some(Box::new(self.parse_expr()?)) } else { None };
                Some(Expr::Break(value, None))
            },
            Token::Continue => {
                self.advance();
                Some(Expr::Continue(None))
            },
            Token::LParen => self.parse_paren_or_tuple(),
            Token::LBracket => self.parse_array_literal(),
            Token::LBrace => self.parse_block().map(Expr::Block),
            Token::If => self.parse_if_expr(),
            Token::Match => self.parse_match_expr(),
            Token::Loop => self.parse_loop_expr(),
            Token::While => self.parse_while_expr(),
            Token::For => self.parse_for_expr(),
            Token::Async => self.parse_async_expr(),
            Token::Pipe | Token::OrOr => self.parse_closure(),
            Token::Fn => self.parse_closure_fn(),
            Token::Ident(_) | Token::Self_ | Token::SelfUpper | Token::Super | Token::Crate => self.parse_path_or_struct_expr(),
            _ => {
                self.error(format!("expected expression, found {:?}", self.current_token()));
                None
            },
        }
    }

    fn parse_unary(&mut self, op: UnOp) -> Option<Expr> {
        let start = self.current_span();
        self.advance();
        let inner = self.parse_expr_with_min_bp(bp::MAX)?;
        let span = self.span_from_start(start);
        Some(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(inner),
            span,
        }))
    }

    fn parse_unary_ref(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance();
        let mutable = self.match_token(Token::Mut);
        let inner = self.parse_expr_with_min_bp(bp::MAX)?;
        let span = self.span_from_start(start);
        Some(Expr::Unary(UnaryExpr {
            op: UnOp::Ref(mutable),
            expr: Box::new(inner),
            span,
        }))
    }

    fn parse_paren_or_tuple(&mut self) -> Option<Expr> {
        self.advance();

        if self.match_token(Token::RParen) {
            return Some(Expr::Literal(Literal::Unit));
        }

        let first = self.with_struct_lit_allowed(true, |p| p.parse_expr())?;

        if self.match_token(Token::Comma) {
            let mut items = vec![first];
            while self.current_token() != Token::RParen && !self.is_at_end() {
                let Some(item) = self.with_struct_lit_allowed(true, |p| p.parse_expr()) else { break };
                items.push(item);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
            Some(Expr::Tuple(items))
        } else {
            self.expect(Token::RParen)?;
            Some(first)
        }
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        self.advance();
        let mut items = Vec::new();

        if !self.match_token(Token::RBracket) {
            loop {
                let Some(item) = self.with_struct_lit_allowed(true, |p| p.parse_expr()) else { break };
                items.push(item);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RBracket)?;
        }

        Some(Expr::Array(items))
    }

    fn parse_closure(&mut self) -> Option<Expr> {
        let params = if self.match_token(Token::OrOr) {
            Vec::new()
        } else {
            self.expect(Token::Pipe)?;
            let mut params = Vec::new();
            if self.current_token() != Token::Pipe {
                loop {
                    let mutable = self.match_token(Token::Mut);
                    let name = self.parse_ident()?;
                    let ty = if self.match_token(Token::Colon) { self.parse_type()? } else { Type::Inferred };
                    params.push(Param { name, ty, mutable });
                    if !self.match_token(Token::Comma) {
                        break;
                    }
                }
            }
            self.expect(Token::Pipe)?;
            params
        };

        let ret_type = self.parse_return_type();

        let body = if self.current_token() == Token::LBrace {
            Expr::Block(self.parse_block()?)
        } else {
            self.parse_expr_with_min_bp(bp::MIN)?
        };

        Some(Expr::Closure(ClosureExpr {
            params,
            ret_type,
            body: Box::new(body),
            move_kw: false,
        }))
    }

    fn parse_closure_fn(&mut self) -> Option<Expr> {
        self.advance();
        let params = self.parse_params()?;
        let ret_type = self.parse_return_type();
        let body = self.parse_block()?;
        Some(Expr::Closure(ClosureExpr {
            params,
            ret_type,
            body: Box::new(Expr::Block(body)),
            move_kw: false,
        }))
    }

    /// Parse a path, then decide between a plain path, a call, a struct
    /// literal, or (for multi-segment paths) an enum variant construction
    /// based on what follows it.
    fn parse_path_or_struct_expr(&mut self) -> Option<Expr> {
        let mut segments = self.parse_path().segments;
        if segments.is_empty() {
            self.error("expected expression");
            return None;
        }

        if segments.len() == 1 {
            let seg = segments.remove(0);
            let path = Path { segments: vec![PathSegment { ident: seg.ident, args: None }] };

            if self.current_token() == Token::LParen {
                let args = self.parse_call_args()?;
                return Some(Expr::Call(CallExpr {
                    func: Box::new(Expr::Path(path)),
                    args,
                    span: Span::DUMMY,
                    generics: seg.args,
                }));
            }

            if self.struct_lit_allowed && self.current_token() == Token::LBrace {
                let (fields, base) = self.parse_struct_fields_body()?;
                return Some(Expr::StructLiteral(Box::new(StructLiteralExpr {
                    path,
                    generics: seg.args,
                    fields,
                    base,
                })));
            }

            return Some(Expr::Path(path));
        }

        let last = segments.pop().unwrap();
        let prefix = Path { segments };

        if self.current_token() == Token::LParen {
            let args = self.parse_call_args()?;
            return Some(Expr::EnumVariant(Box::new(EnumVariantExpr {
                path: prefix,
                variant: last.ident,
                generics: last.args,
                data: EnumVariantData::Tuple(args),
            })));
        }

        if self.struct_lit_allowed && self.current_token() == Token::LBrace {
            let (fields, _base) = self.parse_struct_fields_body()?;
            return Some(Expr::EnumVariant(Box::new(EnumVariantExpr {
                path: prefix,
                variant: last.ident,
                generics: last.args,
                data: EnumVariantData::Struct(fields),
            })));
        }

        Some(Expr::EnumVariant(Box::new(EnumVariantExpr {
            path: prefix,
            variant: last.ident,
            generics: last.args,
            data: EnumVariantData::Unit,
        })))
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.match_token(Token::RParen) {
            loop {
                let Some(arg) = self.with_struct_lit_allowed(true, |p| p.parse_expr()) else { break };
                args.push(arg);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        Some(args)
    }

    fn parse_struct_fields_body(&mut self) -> Option<(Vec<StructField>, Option<Expr>)> {
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        let mut base = None;

        while !self.is_at_end() && self.current_token() != Token::RBrace {
            if self.match_token(Token::DotDot) {
                base = self.with_struct_lit_allowed(true, |p| p.parse_expr());
                break;
            }

            let name = self.parse_ident()?;
            let (expr, is_shorthand) = if self.match_token(Token::Colon) {
                (self.with_struct_lit_allowed(true, |p| p.parse_expr())?, false)
            } else {
                (Expr::Path(Path { segments: vec![PathSegment { ident: name, args: None }] }), true)
            };

            fields.push(StructField { name, expr, is_shorthand });

            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.expect(Token::RBrace)?;
        Some((fields, base))
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Option<Expr> {
        loop {
            match self.current_token() {
                Token::Dot => {
                    self.advance();

                    if self.match_token(Token::Await) {
                        expr = Expr::Await(Box::new(expr));
                        continue;
                    }

                    if let Token::Number(n) = self.current_token() {
                        self.advance();
                        let span = self.current_span();
                        expr = Expr::Field(FieldExpr {
                            object: Box::new(expr),
                            field: glint_util::Symbol::intern(&n.to_string()),
                            span,
                        });
                        continue;
                    }

                    let name = self.parse_ident()?;
                    let generics = if self.current_token() == Token::ColonColon && self.peek_token() == Token::Lt {
                        self.advance();
                        self.advance();
                        let mut types = Vec::new();
                        while self.current_token() != Token::Gt && !self.is_at_end() {
                            let Some(ty) = self.parse_type() else { break };
                            types.push(ty);
                            if !self.match_token(Token::Comma) {
                                break;
                            }
                        }
                        self.expect(Token::Gt)?;
                        Some(types)
                    } else {
                        None
                    };

                    if self.current_token() == Token::LParen {
                        let call_args = self.parse_call_args()?;
                        expr = Expr::MethodCall(MethodCallExpr {
                            receiver: Box::new(expr),
                            method: name,
                            args: generics,
                            call_args,
                        });
                    } else {
                        let span = self.current_span();
                        expr = Expr::Field(FieldExpr {
                            object: Box::new(expr),
                            field: name,
                            span,
                        });
                    }
                },
                Token::LParen => {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call(CallExpr {
                        func: Box::new(expr),
                        args,
                        span: Span::DUMMY,
                        generics: None,
                    });
                },
                Token::LBracket => {
                    self.advance();
                    let index = self.with_struct_lit_allowed(true, |p| p.parse_expr())?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                    });
                },
                Token::As => {
                    self.advance();
                    let ty = self.parse_type()?;
                    expr = Expr::Cast(Box::new(expr), ty);
                },
                _ => break,
            }
        }

        Some(expr)
    }
}
