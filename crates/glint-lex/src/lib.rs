//! glint-lex - tokenizer for the front-end pipeline.
//!
//! Turns source text into a flat stream of [`Token`]s with byte-offset
//! spans. Carried only for its token shapes: tokenizing and parsing are
//! out of scope for the analyzer proper, see DESIGN.md.

pub mod cursor;
#[cfg(test)]
mod edge_cases;
mod lexer;
pub mod token;
pub mod unicode;

pub use lexer::Lexer;
pub use token::Token;

use glint_util::Span;

/// A token paired with the span of source it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenWithSpan {
    pub token: Token,
    pub span: Span,
}

/// Tokenizes an entire source string, including the trailing [`Token::Eof`].
pub fn tokenize(source: &str, handler: &mut glint_util::Handler) -> Vec<TokenWithSpan> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();

    loop {
        let start = lexer.position();
        let (line, column) = (lexer.line(), lexer.column());
        let token = lexer.next_token();
        let end = lexer.position();
        let span = Span::new(start, end, line, column);
        let is_eof = token == Token::Eof;
        tokens.push(TokenWithSpan { token, span });
        if is_eof {
            break;
        }
    }

    tokens
}
