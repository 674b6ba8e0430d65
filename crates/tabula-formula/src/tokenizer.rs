//! Formula tokenizer
//!
//! Splits formula text into a lazy stream of tokens. The tokenizer is a
//! single-pass iterator; tokenizing again means creating a new one.

use crate::error::{FormulaError, FormulaResult};

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Integer or floating point literal
    Number,
    /// Quoted string literal, quotes included in the lexeme
    String,
    /// Function name, cell reference or boolean literal
    Identifier,
    /// Operator symbol
    Operator,
    LeftParen,
    RightParen,
    /// Argument separator (`,`)
    Separator,
    /// End of input
    End,
}

/// A token borrowed from the formula text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    /// Byte offset of the token in the formula text
    pub position: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, lexeme: &'a str, position: usize) -> Self {
        Self {
            kind,
            lexeme,
            position,
        }
    }

    /// Whether a number token uses the integer form (no fraction, no exponent)
    pub fn is_integer_literal(&self) -> bool {
        self.kind == TokenKind::Number && self.lexeme.bytes().all(|b| b.is_ascii_digit())
    }

    /// Contents of a string token with quotes removed and `""` unescaped
    pub fn string_value(&self) -> String {
        let inner = self
            .lexeme
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(self.lexeme);
        inner.replace("\"\"", "\"")
    }
}

/// Lazy tokenizer over formula text (without the leading `=`)
///
/// Yields exactly one [`TokenKind::End`] token, then `None`. After an error
/// the iterator is exhausted.
///
/// ```rust
/// use tabula_formula::tokenizer::{TokenKind, Tokenizer};
///
/// let kinds: Vec<_> = Tokenizer::new("SUM(A1:A3) * 2")
///     .map(|t| t.unwrap().kind)
///     .collect();
/// assert_eq!(kinds.len(), 9);
/// assert_eq!(kinds[0], TokenKind::Identifier);
/// assert_eq!(kinds[8], TokenKind::End);
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            finished: false,
        }
    }

    fn scan_token(&mut self) -> FormulaResult<Token<'a>> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(c) = self.peek_char() else {
            self.finished = true;
            return Ok(Token::new(TokenKind::End, "", start));
        };

        match c {
            '(' => return Ok(self.single(TokenKind::LeftParen)),
            ')' => return Ok(self.single(TokenKind::RightParen)),
            ',' => return Ok(self.single(TokenKind::Separator)),
            '+' | '-' | '*' | '/' | '^' | '&' | ':' => return Ok(self.single(TokenKind::Operator)),
            _ => {}
        }

        // Comparison operators, longest match first
        if matches!(c, '<' | '>' | '=' | '!') {
            self.advance();
            let two = matches!(
                (c, self.peek_char()),
                ('<', Some('=')) | ('<', Some('>')) | ('>', Some('=')) | ('=', Some('=')) | ('!', Some('='))
            );
            if two {
                self.advance();
            } else if c == '!' {
                return Err(FormulaError::parsing(start, "invalid character '!'"));
            }
            return Ok(self.token_from(TokenKind::Operator, start));
        }

        if c == '"' {
            return self.scan_string();
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(FormulaError::parsing(
            start,
            format!("invalid character '{}'", c),
        ))
    }

    fn scan_string(&mut self) -> FormulaResult<Token<'a>> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    // Escaped quote ("")
                    if self.peek_char() == Some('"') {
                        self.advance();
                    } else {
                        return Ok(self.token_from(TokenKind::String, start));
                    }
                }
                Some(_) => self.advance(),
                None => {
                    return Err(FormulaError::parsing(start, "unterminated string literal"));
                }
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token<'a>> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            if self.skip_digits() == 0 {
                return Err(self.malformed_number(start));
            }
        }

        // "1.2.3", "12abc"
        if self
            .peek_char()
            .map_or(false, |c| c == '.' || c == '_' || c.is_ascii_alphanumeric())
        {
            return Err(self.malformed_number(start));
        }

        Ok(self.token_from(TokenKind::Number, start))
    }

    fn scan_identifier(&mut self) -> Token<'a> {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        self.token_from(TokenKind::Identifier, start)
    }

    fn malformed_number(&mut self, start: usize) -> FormulaError {
        while self
            .peek_char()
            .map_or(false, |c| c == '.' || c == '_' || c.is_ascii_alphanumeric())
        {
            self.advance();
        }
        FormulaError::parsing(
            start,
            format!("malformed number '{}'", &self.input[start..self.pos]),
        )
    }

    // === Helper methods ===

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.pos;
        self.advance();
        self.token_from(kind, start)
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token::new(kind, &self.input[start..self.pos], start)
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos - start
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = FormulaResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.scan_token();
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

/// Tokenize a whole formula body eagerly
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token<'_>>> {
    Tokenizer::new(input).collect()
}
