use crate::metabolic_model::formula::token::Token;

use indexmap::IndexMap;
use thiserror::Error;
/*
Formula Grammar:
formula -> group* ;
group -> (ELEMENT | "(" formula ")") COUNT? ;

e.g. C6H12O6, Ca(OH)2
 */

/// Chemical formula parser, producing element counts
pub struct FormulaParser {
    /// Vector of tokens from the formula string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl FormulaParser {
    /// Create a new FormulaParser
    pub fn new(tokens: Vec<Token>) -> FormulaParser {
        FormulaParser { tokens, current: 0 }
    }

    /// Parse the token vector into a map of element symbol to count
    pub fn parse(&mut self) -> Result<IndexMap<String, f64>, ParseError> {
        let counts = self.formula()?;
        if !self.is_at_end() {
            return Err(ParseError::UnbalancedParenthesis);
        }
        if counts.is_empty() {
            return Err(ParseError::EmptyFormula);
        }
        Ok(counts)
    }

    fn formula(&mut self) -> Result<IndexMap<String, f64>, ParseError> {
        let mut counts = IndexMap::new();
        while !self.is_at_end() && self.peek() != &Token::RightParen {
            for (element, n) in self.group()? {
                *counts.entry(element).or_insert(0.) += n;
            }
        }
        Ok(counts)
    }

    fn group(&mut self) -> Result<IndexMap<String, f64>, ParseError> {
        let mut counts = match self.advance() {
            Token::Element(symbol) => {
                let mut counts = IndexMap::new();
                counts.insert(symbol, 1.);
                counts
            }
            Token::LeftParen => {
                let inner = self.formula()?;
                match self.advance() {
                    Token::RightParen => inner,
                    _ => return Err(ParseError::UnbalancedParenthesis),
                }
            }
            Token::Count(_) => return Err(ParseError::DanglingCount),
            Token::RightParen | Token::Eof => return Err(ParseError::UnbalancedParenthesis),
        };
        if let Token::Count(n) = self.peek() {
            let n = *n;
            self.advance();
            counts.values_mut().for_each(|v| *v *= n);
        }
        Ok(counts)
    }

    // region parsing helper functions
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&Token::Eof)
    }

    fn is_at_end(&self) -> bool {
        self.peek() == &Token::Eof
    }
    // endregion parsing helper functions
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Formula has unbalanced parenthesis")]
    UnbalancedParenthesis,
    #[error("Formula has a count without an element")]
    DanglingCount,
    #[error("Formula contains no elements")]
    EmptyFormula,
}
