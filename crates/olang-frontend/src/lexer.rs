// lexer.rs

use crate::errors::LexerError;
use crate::span::Span;
use crate::token::{Token, TokenType};

/// Hand-written single-pass lexer for O source text.
#[derive(Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
    errors: Vec<(LexerError, Span)>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            errors: Vec::new(),
        }
    }

    /// Take all collected errors, leaving the internal list empty.
    pub fn take_errors(&mut self) -> Vec<(LexerError, Span)> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;

            let Some(c) = self.advance() else {
                return self.make_token(TokenType::Eof);
            };

            return match c {
                '(' => self.make_token(TokenType::LParen),
                ')' => self.make_token(TokenType::RParen),
                '[' => self.make_token(TokenType::LBracket),
                ']' => self.make_token(TokenType::RBracket),
                ',' => self.make_token(TokenType::Comma),
                '.' => self.make_token(TokenType::Dot),
                ':' => {
                    if self.match_char('=') {
                        self.make_token(TokenType::ColonEq)
                    } else {
                        self.make_token(TokenType::Colon)
                    }
                }
                '=' => {
                    if self.match_char('>') {
                        self.make_token(TokenType::FatArrow)
                    } else {
                        self.error(LexerError::UnexpectedCharacter {
                            ch: '=',
                            span: self.current_span().into(),
                        });
                        continue;
                    }
                }
                c if c.is_ascii_digit() => self.number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
                c => {
                    self.error(LexerError::UnexpectedCharacter {
                        ch: c,
                        span: self.current_span().into(),
                    });
                    continue;
                }
            };
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                // Line comment
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A dot only continues the literal when a digit follows; otherwise it
        // is member access on an integer literal.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            return self.make_token(TokenType::RealLiteral);
        }
        self.make_token(TokenType::IntLiteral)
    }

    fn identifier(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        match TokenType::keyword_type(text) {
            Some(ty) => self.make_token(ty),
            None => self.make_token(TokenType::Identifier),
        }
    }

    fn make_token(&self, ty: TokenType) -> Token {
        Token::new(ty, &self.source[self.start..self.current], self.current_span())
    }

    fn current_span(&self) -> Span {
        Span::new(self.start, self.current, self.start_line, self.start_column)
    }

    fn error(&mut self, err: LexerError) {
        let span = self.current_span();
        self.errors.push((err, span));
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let ty = tok.ty;
            out.push(ty);
            if ty == TokenType::Eof {
                break;
            }
        }
        out
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = lex_all("class Main extends Base is end");
        assert_eq!(
            tokens,
            vec![
                TokenType::KwClass,
                TokenType::Identifier,
                TokenType::KwExtends,
                TokenType::Identifier,
                TokenType::KwIs,
                TokenType::KwEnd,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn assignment_and_arrow() {
        let tokens = lex_all("x := 1 method f : Integer => y");
        assert!(tokens.contains(&TokenType::ColonEq));
        assert!(tokens.contains(&TokenType::FatArrow));
    }

    #[test]
    fn int_then_member_access_is_not_a_real() {
        let mut lexer = Lexer::new("1.Plus(2)");
        assert_eq!(lexer.next_token().ty, TokenType::IntLiteral);
        assert_eq!(lexer.next_token().ty, TokenType::Dot);
        assert_eq!(lexer.next_token().ty, TokenType::Identifier);
    }

    #[test]
    fn real_literal() {
        let mut lexer = Lexer::new("3.14");
        let tok = lexer.next_token();
        assert_eq!(tok.ty, TokenType::RealLiteral);
        assert_eq!(tok.lexeme, "3.14");
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex_all("var x // trailing words\n : Integer(1)");
        assert_eq!(tokens[0], TokenType::KwVar);
        assert_eq!(tokens[2], TokenType::Colon);
    }

    #[test]
    fn line_and_column_tracking() {
        let mut lexer = Lexer::new("class\n  Main");
        let _class = lexer.next_token();
        let main = lexer.next_token();
        assert_eq!(main.span.line, 2);
        assert_eq!(main.span.column, 3);
    }

    #[test]
    fn unexpected_character_is_collected() {
        let mut lexer = Lexer::new("var $ x");
        let _ = lex_drain(&mut lexer);
        assert!(lexer.has_errors());
    }

    fn lex_drain(lexer: &mut Lexer) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.ty == TokenType::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }
}
