//! Module providing Token struct for lexing chemical formulas

/// Represents Tokens in a chemical formula
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Element(String),
    Count(f64),
    LeftParen,
    RightParen,
    Eof,
}
