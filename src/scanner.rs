//! Streaming lexer for Rox source text.
//!
//! [`Scanner`] walks the source bytes once and yields `Result<Token>` items:
//! a token for every lexeme, a [`LoxError::Lex`] for every character it
//! cannot place, and finally exactly one `EOF` token.  It is a
//! [`FusedIterator`], so draining it past the end is harmless.
//!
//! Whitespace and `//` comments produce nothing.  Comments are skipped in bulk
//! with `memchr`; keywords are looked up in a compile‑time `phf` map.  Every
//! lexeme boundary falls on an ASCII byte, which makes slicing the `&str`
//! by byte index safe even when the text contains multibyte characters.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Reporter, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Kind of a token that is always exactly one byte long.
#[inline]
fn punctuator(b: u8) -> Option<TokenType> {
    let tt = match b {
        b'(' => TokenType::LEFT_PAREN,
        b')' => TokenType::RIGHT_PAREN,
        b'{' => TokenType::LEFT_BRACE,
        b'}' => TokenType::RIGHT_BRACE,
        b',' => TokenType::COMMA,
        b'.' => TokenType::DOT,
        b'-' => TokenType::MINUS,
        b'+' => TokenType::PLUS,
        b';' => TokenType::SEMICOLON,
        b'*' => TokenType::STAR,
        b'?' => TokenType::QUESTION,
        b':' => TokenType::COLON,
        _ => return None,
    };
    Some(tt)
}

/// One‑pass lexer over a borrowed source.  Emitted tokens own their lexemes.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next byte to examine.
    curr: usize,
    line: usize,
    /// Set once the `EOF` token has gone out.
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            bytes: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    /// Consumes one byte.  Callers check [`Self::is_at_end`] first.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.bytes.get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.bytes.get(self.curr + 1).copied().unwrap_or(0)
    }

    /// `long` if the next byte is `expected` (consuming it), else `short`.
    #[inline(always)]
    fn pick(&mut self, expected: u8, long: TokenType, short: TokenType) -> TokenType {
        if self.peek() == expected && !self.is_at_end() {
            self.curr += 1;
            long
        } else {
            short
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.curr]
    }

    /// Scans from `self.start`.  `Ok(None)` means whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b = self.advance();

        if let Some(tt) = punctuator(b) {
            return Ok(Some(tt));
        }

        let tt = match b {
            b'!' => self.pick(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.pick(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.pick(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.pick(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.peek() == b'/' => {
                // The newline itself is left for the main loop to count.
                self.curr = match memchr(b'\n', &self.bytes[self.curr..]) {
                    Some(offset) => self.curr + offset,
                    None => self.bytes.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Swallow UTF‑8 continuation bytes so one character is one error.
                while !self.is_at_end() && self.peek() & 0b1100_0000 == 0b1000_0000 {
                    self.curr += 1;
                }

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", self.lexeme()),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// String literal; may span lines.  The opening quote is already consumed.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1;

        let text = &self.source[self.start + 1..self.curr - 1];
        Ok(TokenType::STRING(text.to_owned()))
    }

    /// `123` or `3.14`; a trailing `.` is not part of the number.
    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;
            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        // Only ASCII digits and at most one interior dot were consumed.
        TokenType::NUMBER(self.lexeme().parse().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(tt)) => {
                    debug!("Scanned {} on line {}", tt.name(), self.line);
                    return Some(Ok(Token::new(tt, self.lexeme(), self.line)));
                }
                Ok(None) => {}
                Err(error) => return Some(Err(error)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scans all of `source`, routing lexical errors to `reporter` and returning
/// the tokens that did scan (always ending with `EOF`).
pub fn scan_tokens(source: &str, reporter: &mut dyn Reporter) -> Vec<Token> {
    let mut tokens = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(error) => reporter.report(error),
        }
    }

    info!("Scanned {} token(s)", tokens.len());

    tokens
}
