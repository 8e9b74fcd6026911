//! Module for parsing chemical formulas and computing molecular weights

use crate::metabolic_model::formula::lexer::LexerError;
use crate::metabolic_model::formula::parser::ParseError;
use indexmap::IndexMap;
use thiserror::Error;

mod elements;
mod lexer;
pub mod parser;
mod token;

/// Parse a chemical formula into element counts
///
/// # Examples
/// ```rust
/// use gapfillrs_core::metabolic_model::formula::parse_formula;
/// let counts = parse_formula("C6H12O6").unwrap();
/// assert_eq!(counts["H"], 12.);
/// ```
pub fn parse_formula(input: &str) -> Result<IndexMap<String, f64>, FormulaError> {
    let mut lexer = lexer::Lexer::new(input);
    let tokens = lexer.scan_tokens()?.iter().cloned().collect();
    let mut parser = parser::FormulaParser::new(tokens);
    Ok(parser.parse()?)
}

/// Molecular weight (g/mol) of a chemical formula
pub fn molecular_weight(formula: &str) -> Result<f64, FormulaError> {
    let counts = parse_formula(formula.trim())?;
    counts.iter().try_fold(0., |weight, (element, n)| {
        elements::atomic_weight(element)
            .map(|w| weight + w * n)
            .ok_or_else(|| FormulaError::UnknownElement(element.clone()))
    })
}

/// Enum representing possible formula errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Lexing Error
    #[error("Error occurred during lexing of formula: {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing of formula: {0}")]
    ParsingError(#[from] ParseError),
    /// The formula mentions something that is not an element (e.g. an R group)
    #[error("Unknown element {0}")]
    UnknownElement(String),
}
