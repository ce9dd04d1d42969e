//! Lexer (tokenizer) for JavaScript/TypeScript.
//!
//! The lexer converts source text into a stream of tokens without building
//! an AST. It tracks just enough context to tell code apart from strings,
//! templates, regular expressions and comments:
//! - regex vs division, from the previous significant token
//! - template nesting, via a stack of open `{` / `${` contexts
//!
//! Anything else it does not understand (decorators, JSX text, TypeScript
//! syntax) becomes `Unknown` or ordinary tokens instead of an error. Only
//! unterminated constructs are fatal, since from that point on nothing can
//! be told apart reliably.

use std::fmt;

use thiserror::Error;

use crate::span::Span;
use crate::token::{Keyword, Punct, Token, TokenKind, PUNCTUATORS};

/// Why lexing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedTemplate,
    UnterminatedComment,
    UnterminatedRegex,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedTemplate => write!(f, "unterminated template literal"),
            Self::UnterminatedComment => write!(f, "unterminated comment"),
            Self::UnterminatedRegex => write!(f, "unterminated regular expression"),
        }
    }
}

/// A source the lexer rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct LexError {
    pub kind: LexErrorKind,
    /// Byte offset where the offending construct starts.
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Template,
}

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Source code as bytes (for fast indexing).
    bytes: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Whether a `/` at the current position starts a regex literal.
    allow_regex: bool,
    /// Whether the previous token was `.` or `?.`, making the next word a property name.
    after_member_access: bool,
    /// Open `{` and `${` contexts, innermost last.
    braces: Vec<Brace>,
    /// Comment spans seen so far, in source order.
    comments: Vec<Span>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            token_start: 0,
            allow_regex: true,
            after_member_access: false,
            braces: Vec::new(),
            comments: Vec::new(),
        };
        if source.starts_with("#!") {
            lexer.skip_line_comment();
        }
        lexer
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Comment spans (including a leading hashbang) seen so far.
    pub fn comments(&self) -> &[Span] {
        &self.comments
    }

    /// Consume the lexer, returning the collected comment spans.
    pub fn into_comments(self) -> Vec<Span> {
        self.comments
    }

    /// Get the next token.
    ///
    /// # Errors
    /// Returns an error on an unterminated string, template, comment or regex.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;
        self.token_start = self.pos;

        if self.is_eof() {
            if self.braces.contains(&Brace::Template) {
                return Err(self.error_at(LexErrorKind::UnterminatedTemplate, self.pos));
            }
            return Ok(self.make_token(TokenKind::Eof));
        }

        let ch = self.current();
        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | b'\\' => self.scan_word(),
            0x80..=0xff => self.scan_word(),
            b'0'..=b'9' => self.scan_number(),
            b'.' if self.peek_char().is_ascii_digit() => self.scan_number(),
            b'"' | b'\'' => self.scan_string(ch)?,
            b'`' => {
                self.advance();
                self.scan_template_part(true)?
            }
            b'#' if is_ident_start(self.peek_char()) => {
                self.advance();
                self.scan_word();
                TokenKind::PrivateName
            }
            b'/' if self.allow_regex => self.scan_regex()?,
            b'{' => {
                self.advance();
                self.braces.push(Brace::Block);
                TokenKind::Punct(Punct::LBrace)
            }
            b'}' => {
                self.advance();
                match self.braces.pop() {
                    Some(Brace::Template) => self.scan_template_part(false)?,
                    _ => TokenKind::Punct(Punct::RBrace),
                }
            }
            _ => self.scan_punct(),
        };

        self.allow_regex = kind.allows_regex_after();
        self.after_member_access = matches!(
            kind,
            TokenKind::Punct(Punct::Dot | Punct::QuestionDot)
        );

        Ok(self.make_token(kind))
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_char(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(0)
    }

    fn current_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::from(self.token_start..self.pos))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn error_at(&self, kind: LexErrorKind, offset: usize) -> LexError {
        LexError {
            kind,
            offset: offset as u32,
        }
    }

    // === Trivia ===

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => self.advance(),
                b'/' if self.peek_char() == b'/' => self.skip_line_comment(),
                b'/' if self.peek_char() == b'*' => self.skip_block_comment()?,
                0x80..=0xff => match self.current_char() {
                    Some(c) if is_unicode_space(c) => self.advance_n(c.len_utf8()),
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        let start = self.pos;
        while !self.is_eof() && !matches!(self.current(), b'\n' | b'\r') {
            self.advance();
        }
        self.comments.push(Span::from(start..self.pos));
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        match self.source[start + 2..].find("*/") {
            Some(offset) => {
                self.pos = start + 2 + offset + 2;
                self.comments.push(Span::from(start..self.pos));
                Ok(())
            }
            None => {
                self.pos = self.bytes.len();
                Err(self.error_at(LexErrorKind::UnterminatedComment, start))
            }
        }
    }

    // === Words and literals ===

    fn scan_word(&mut self) -> TokenKind {
        let start = self.pos;
        loop {
            match self.current() {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$' => self.advance(),
                b'\\' => {
                    // \uXXXX or \u{...}
                    self.advance();
                    if self.current() == b'u' {
                        self.advance();
                        if self.current() == b'{' {
                            while !self.is_eof() && self.current() != b'}' {
                                self.advance();
                            }
                            self.advance();
                        } else {
                            let mut n = 0;
                            while n < 4 && self.current().is_ascii_hexdigit() {
                                self.advance();
                                n += 1;
                            }
                        }
                    }
                }
                0x80..=0xff => match self.current_char() {
                    Some(c) if !is_unicode_space(c) => self.advance_n(c.len_utf8()),
                    _ => break,
                },
                _ => break,
            }
        }

        if self.pos == start {
            self.advance();
            return TokenKind::Unknown;
        }
        if self.after_member_access {
            return TokenKind::Identifier;
        }
        match Keyword::lookup(&self.source[start..self.pos]) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.current() == b'0' && matches!(self.peek_char(), b'x' | b'X' | b'o' | b'O' | b'b' | b'B') {
            self.advance_n(2);
            while self.current().is_ascii_alphanumeric() || self.current() == b'_' {
                self.advance();
            }
            return TokenKind::Number;
        }

        self.scan_digits();
        if self.current() == b'.' {
            self.advance();
            self.scan_digits();
        }
        if matches!(self.current(), b'e' | b'E') {
            let sign = usize::from(matches!(self.peek_char(), b'+' | b'-'));
            if self
                .bytes
                .get(self.pos + 1 + sign)
                .is_some_and(u8::is_ascii_digit)
            {
                self.advance_n(1 + sign);
                self.scan_digits();
            }
        }
        if self.current() == b'n' {
            self.advance();
        }
        TokenKind::Number
    }

    fn scan_digits(&mut self) {
        while self.current().is_ascii_digit() || self.current() == b'_' {
            self.advance();
        }
    }

    fn scan_string(&mut self, quote: u8) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        loop {
            match self.current() {
                _ if self.is_eof() => {
                    return Err(self.error_at(LexErrorKind::UnterminatedString, start));
                }
                b'\\' => {
                    self.advance();
                    // Line continuation: a backslash followed by CRLF escapes both.
                    if self.current() == b'\r' && self.peek_char() == b'\n' {
                        self.advance();
                    }
                    if !self.is_eof() {
                        self.advance();
                    }
                }
                b'\n' | b'\r' => {
                    return Err(self.error_at(LexErrorKind::UnterminatedString, start));
                }
                c if c == quote => {
                    self.advance(); // Skip closing quote
                    return Ok(TokenKind::String);
                }
                _ => self.advance(),
            }
        }
    }

    /// Scan template characters after `` ` `` (head) or after the `}` closing a substitution.
    fn scan_template_part(&mut self, head: bool) -> Result<TokenKind, LexError> {
        while !self.is_eof() {
            match self.current() {
                b'`' => {
                    self.advance();
                    return Ok(if head {
                        TokenKind::NoSubstitutionTemplate
                    } else {
                        TokenKind::TemplateTail
                    });
                }
                b'$' if self.peek_char() == b'{' => {
                    self.advance_n(2);
                    self.braces.push(Brace::Template);
                    return Ok(if head {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    });
                }
                b'\\' => self.advance_n(2),
                _ => self.advance(),
            }
        }

        self.pos = self.bytes.len();
        Err(self.error_at(LexErrorKind::UnterminatedTemplate, self.token_start))
    }

    fn scan_regex(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.advance(); // Skip opening /

        let mut in_class = false;
        loop {
            match self.current() {
                _ if self.is_eof() => {
                    return Err(self.error_at(LexErrorKind::UnterminatedRegex, start));
                }
                b'\n' | b'\r' => {
                    return Err(self.error_at(LexErrorKind::UnterminatedRegex, start));
                }
                b'/' if !in_class => break,
                b'[' => {
                    in_class = true;
                    self.advance();
                }
                b']' => {
                    in_class = false;
                    self.advance();
                }
                b'\\' => {
                    self.advance();
                    if !matches!(self.current(), b'\n' | b'\r') {
                        self.advance();
                    }
                }
                _ => self.advance(),
            }
        }
        self.advance(); // Skip closing /

        // Flags
        while self.current().is_ascii_alphabetic() {
            self.advance();
        }
        Ok(TokenKind::Regex)
    }

    fn scan_punct(&mut self) -> TokenKind {
        let rest = &self.bytes[self.pos..];
        for (text, punct) in PUNCTUATORS {
            if !rest.starts_with(text.as_bytes()) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            if *punct == Punct::QuestionDot && rest.get(2).is_some_and(u8::is_ascii_digit) {
                continue;
            }
            self.advance_n(text.len());
            return TokenKind::Punct(*punct);
        }

        match self.current_char() {
            Some(c) => self.advance_n(c.len_utf8()),
            None => self.advance(),
        }
        TokenKind::Unknown
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b'$' | b'\\') || b >= 0x80
}

fn is_unicode_space(c: char) -> bool {
    matches!(
        c,
        '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
