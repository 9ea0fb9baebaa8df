use crate::ast::{Node, Value};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use std::ops::Range;

/// Parser for the KV3-like configuration format
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
        }
    }

    /// Parse a complete document: a root object of `key = value` pairs.
    ///
    /// Empty or whitespace-only input yields an empty root object so a
    /// brand-new document opens without an error.
    pub fn parse_document(&mut self) -> ParseResult<Node> {
        let mut children = Vec::new();

        while !self.is_at_end() {
            children.push(self.parse_pair()?);
        }

        Ok(Node::new("", Value::Object(children)))
    }

    /// Parse one `key = value` pair.
    fn parse_pair(&mut self) -> ParseResult<Node> {
        let key = self.expect_key()?;
        self.expect(Token::Equals)?;
        let value = self.parse_value()?;
        Ok(Node::new(key, value))
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        match self.peek() {
            Some((Token::String(_), _)) => Ok(Value::String(self.expect_string()?)),
            Some((Token::Number(text), span)) => {
                let pos = span.start;
                let raw = text.to_string();
                let n = raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    pos,
                    text: raw.clone(),
                })?;
                // Overflowing literals parse to infinity, which would not
                // survive a serialize/reparse cycle.
                if !n.is_finite() {
                    return Err(ParseError::InvalidNumber { pos, text: raw });
                }
                self.advance();
                Ok(Value::Number(n))
            }
            Some((Token::True, _)) => {
                self.advance();
                Ok(Value::Boolean(true))
            }
            Some((Token::False, _)) => {
                self.advance();
                Ok(Value::Boolean(false))
            }
            // Bare identifiers in value position are treated as strings, the
            // way the format treats enum-like values.
            Some((Token::Ident(i), _)) => {
                let val = i.to_string();
                self.advance();
                Ok(Value::String(val))
            }
            Some((Token::LBracket, _)) => self.parse_array(),
            Some((Token::LBrace, _)) => self.parse_object(),
            Some((Token::Error, span)) => Err(ParseError::lexer_error(span.start)),
            Some((tok, span)) => Err(ParseError::unexpected_token(
                span.start,
                "value",
                Self::format_token(Some(tok)),
            )),
            None => Err(ParseError::unexpected_eof(self.eof_pos())),
        }
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        self.expect(Token::LBracket)?;

        let mut items = Vec::new();
        while !self.check(Token::RBracket) {
            if self.is_at_end() {
                return Err(ParseError::unexpected_eof(self.eof_pos()));
            }
            items.push(self.parse_value()?);
            // Commas between elements are optional separators.
            self.match_token(Token::Comma);
        }

        self.expect(Token::RBracket)?;
        Ok(Value::Array(items))
    }

    fn parse_object(&mut self) -> ParseResult<Value> {
        self.expect(Token::LBrace)?;

        let mut children = Vec::new();
        while !self.check(Token::RBrace) {
            if self.is_at_end() {
                return Err(ParseError::unexpected_eof(self.eof_pos()));
            }
            children.push(self.parse_pair()?);
        }

        self.expect(Token::RBrace)?;
        Ok(Value::Object(children))
    }

    /// Keys are bare identifiers or quoted strings.
    fn expect_key(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(i), _)) => {
                let key = i.to_string();
                self.advance();
                Ok(key)
            }
            Some((Token::String(_), _)) => self.expect_string(),
            Some((Token::Error, span)) => Err(ParseError::lexer_error(span.start)),
            Some((tok, span)) => Err(ParseError::unexpected_token(
                span.start,
                "key",
                Self::format_token(Some(tok)),
            )),
            None => Err(ParseError::unexpected_eof(self.eof_pos())),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::String(raw), span)) => {
                let pos = span.start;
                let decoded = Self::unescape(&raw[1..raw.len() - 1], pos)?;
                self.advance();
                Ok(decoded)
            }
            _ => Err(ParseError::unexpected_token(
                self.peek_span().start,
                "string literal",
                Self::format_token(self.peek().map(|(t, _)| t)),
            )),
        }
    }

    fn unescape(raw: &str, pos: usize) -> ParseResult<String> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => return Err(ParseError::invalid_escape(pos, other)),
                None => return Err(ParseError::unexpected_eof(pos)),
            }
        }
        Ok(out)
    }

    // Helper methods

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.peek_span().start,
                Self::format_token(Some(&token)),
                Self::format_token(self.peek().map(|(t, _)| t)),
            ))
        }
    }

    fn peek_span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or_else(|| {
                let end = self.eof_pos();
                end..end
            })
    }

    fn eof_pos(&self) -> usize {
        self.tokens.last().map(|(_, span)| span.end).unwrap_or(0)
    }

    fn format_token(token: Option<&Token>) -> String {
        match token {
            None => "end of file".to_string(),
            Some(Token::Ident(s)) => format!("identifier '{}'", s),
            Some(Token::String(s)) => format!("string {}", s),
            Some(Token::Number(n)) => format!("number {}", n),
            Some(Token::LBrace) => "'{'".to_string(),
            Some(Token::RBrace) => "'}'".to_string(),
            Some(Token::LBracket) => "'['".to_string(),
            Some(Token::RBracket) => "']'".to_string(),
            Some(Token::Equals) => "'='".to_string(),
            Some(Token::Comma) => "','".to_string(),
            Some(Token::True) => "'true'".to_string(),
            Some(Token::False) => "'false'".to_string(),
            Some(Token::Error) => "unrecognized input".to_string(),
        }
    }
}

/// Parse source text into the root node of a document.
pub fn parse(source: &str) -> ParseResult<Node> {
    let mut parser = Parser::new(source);
    parser.parse_document()
}
