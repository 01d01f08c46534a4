//! Pattern parsing - wildcard, identifier, literal, tuple, struct, enum patterns

use crate::ast::*;
use crate::Parser;
use glint_lex::Token;

impl<'a> Parser<'a> {
    /// Parse a pattern, including top-level or-patterns (`pat | pat | pat`).
    pub fn parse_pattern(&mut self) -> Option<Pattern> {
        self.match_token(Token::Pipe);
        let first = self.parse_pattern_range()?;

        if self.current_token() != Token::Pipe {
            return Some(first);
        }

        let mut alts = vec![first];
        while self.match_token(Token::Pipe) {
            alts.push(self.parse_pattern_range()?);
        }
        Some(Pattern::Or(alts))
    }

    /// Parse a pattern that may be the low end of a range pattern (`lo..hi`, `lo...hi`).
    fn parse_pattern_range(&mut self) -> Option<Pattern> {
        let low = self.parse_pattern_primary()?;

        if self.match_token(Token::DotDot) || self.match_token(Token::DotDotDot) {
            let high = self.parse_pattern_primary()?;
            return Some(Pattern::Range(Box::new(low), Box::new(high)));
        }

        Some(low)
    }

    fn parse_pattern_primary(&mut self) -> Option<Pattern> {
        match self.current_token() {
            Token::Ampersand => {
                self.advance();
                let mutable = self.match_token(Token::Mut);
                let inner = self.parse_pattern_primary()?;
                Some(Pattern::Ref(
                    Box::new(inner),
                    if mutable {
                        Mutability::Mutable
                    } else {
                        Mutability::Immutable
                    },
                ))
            },
            Token::Mut => {
                self.advance();
                let inner = self.parse_pattern_primary()?;
                Some(match inner {
                    Pattern::Ident(name, _) => Pattern::Ident(name, Mutability::Mutable),
                    other => Pattern::Mut(Box::new(other)),
                })
            },
            Token::Underscore => {
                self.advance();
                Some(Pattern::Wildcard)
            },
            Token::LBracket => {
                self.advance();

                let mut patterns = Vec::new();
                if !self.match_token(Token::RBracket) {
                    loop {
                        if let Some(pat) = self.parse_pattern_range() {
                            patterns.push(pat);
                        }
                        if !self.match_token(Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RBracket)?;
                }
                Some(Pattern::Slice(patterns))
            },
            Token::Number(n) => {
                self.advance();
                Some(Pattern::Literal(Literal::Int(n as i64)))
            },
            Token::True => {
                self.advance();
                Some(Pattern::Literal(Literal::Bool(true)))
            },
            Token::False => {
                self.advance();
                Some(Pattern::Literal(Literal::Bool(false)))
            },
            Token::String(s) => {
                self.advance();
                Some(Pattern::Literal(Literal::String(s)))
            },
            Token::Char(c) => {
                self.advance();
                Some(Pattern::Literal(Literal::Char(c)))
            },
            Token::LParen => {
                self.advance();

                if self.match_token(Token::RParen) {
                    return Some(Pattern::Tuple(Vec::new()));
                }

                let mut patterns = Vec::new();
                loop {
                    if let Some(pat) = self.parse_pattern() {
                        patterns.push(pat);
                    }
                    if !self.match_token(Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RParen)?;
                Some(Pattern::Tuple(patterns))
            },
            Token::Ident(_) | Token::Self_ | Token::SelfUpper => {
                let path = self.parse_path();

                if self.match_token(Token::LParen) {
                    let mut patterns = Vec::new();
                    while !self.is_at_end() && self.current_token() != Token::RParen {
                        if let Some(pat) = self.parse_pattern() {
                            patterns.push(pat);
                        }
                        if !self.match_token(Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RParen)?;
                    Some(Pattern::TupleStruct(path, patterns))
                } else if self.match_token(Token::LBrace) {
                    let mut fields = Vec::new();
                    while !self.is_at_end() && self.current_token() != Token::RBrace {
                        if self.match_token(Token::DotDot) {
                            break;
                        }

                        let field = self.parse_ident()?;
                        let pattern = if self.match_token(Token::Colon) {
                            self.parse_pattern()?
                        } else {
                            Pattern::Ident(field, Mutability::Immutable)
                        };
                        fields.push(FieldPattern { field, pattern });

                        if !self.match_token(Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RBrace)?;
                    Some(Pattern::Struct(path, fields))
                } else if path.segments.len() == 1 && path.segments[0].args.is_none() {
                    let ident = path.segments[0].ident;
                    if matches!(ident.as_str(), "self" | "Self") {
                        Some(Pattern::Path(path))
                    } else {
                        Some(Pattern::Ident(ident, Mutability::Immutable))
                    }
                } else {
                    Some(Pattern::Path(path))
                }
            },
            _ => {
                self.error("expected pattern");
                None
            },
        }
    }
}
