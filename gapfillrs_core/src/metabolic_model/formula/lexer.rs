//! Lex a chemical formula string into a series of tokens for later parsing

use std::collections::VecDeque;

use thiserror::Error;

use crate::metabolic_model::formula::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: VecDeque<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: VecDeque::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<&VecDeque<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push_back(Token::Eof);
        Ok(&self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            'A'..='Z' => self.read_element(),
            '0'..='9' => self.read_count()?,
            ' ' | '\t' => {}
            other => return Err(LexerError::InvalidCharacter(other)),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    /// An element symbol is an uppercase letter followed by lowercase letters
    fn read_element(&mut self) {
        while self.peek().is_ascii_lowercase() {
            self.advance();
        }
        let symbol: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Element(symbol));
    }

    fn read_count(&mut self) -> Result<(), LexerError> {
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let count = text
            .parse::<f64>()
            .map_err(|_| LexerError::InvalidCount(text))?;
        self.add_token(Token::Count(count));
        Ok(())
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexerError {
    #[error("Invalid character `{0}` in formula")]
    InvalidCharacter(char),
    #[error("Invalid element count `{0}`")]
    InvalidCount(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glucose() {
        let mut lexer = Lexer::new("C6H12O6");
        let tokens = lexer.scan_tokens().unwrap();
        let expected: VecDeque<Token> = vec![
            Token::Element("C".to_string()),
            Token::Count(6.),
            Token::Element("H".to_string()),
            Token::Count(12.),
            Token::Element("O".to_string()),
            Token::Count(6.),
            Token::Eof,
        ]
        .into();
        assert_eq!(tokens, &expected);
    }

    #[test]
    fn test_two_letter_elements() {
        let mut lexer = Lexer::new("MgCl2");
        let tokens = lexer.scan_tokens().unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Token::Element("Mg".to_string()));
        assert_eq!(tokens[1], Token::Element("Cl".to_string()));
        assert_eq!(tokens[2], Token::Count(2.));
    }

    #[test]
    fn test_grouping() {
        let mut lexer = Lexer::new("Ca(OH)2");
        let tokens = lexer.scan_tokens().unwrap();
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[1], Token::LeftParen);
        assert_eq!(tokens[4], Token::RightParen);
    }

    #[test]
    fn test_invalid_character() {
        let mut lexer = Lexer::new("C6H12O6*");
        assert_eq!(
            lexer.scan_tokens().unwrap_err(),
            LexerError::InvalidCharacter('*')
        );
    }
}
