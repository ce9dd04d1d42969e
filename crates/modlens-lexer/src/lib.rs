//! modlens-lexer: permissive JavaScript/TypeScript tokenizer.
//!
//! Not a parser. The lexer only separates code from strings, templates,
//! regular expressions and comments, which is what the analyzer needs to
//! tell a real `import`/`export` keyword apart from the same text inside a
//! string or a comment.
//!
//! # Example
//!
//! ```
//! use modlens_lexer::{keyword_spans, Keyword};
//!
//! let spans = keyword_spans("// import a\nimport b from 'c'", Keyword::Import).unwrap();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].start, 12);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod lexer;
mod span;
mod token;

pub use lexer::{LexError, LexErrorKind, Lexer};
pub use span::Span;
pub use token::{Keyword, Punct, Token, TokenKind};

/// Every token and comment of a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    /// Significant tokens in source order, without the trailing `Eof`.
    pub tokens: Vec<Token>,
    /// Comment spans in source order.
    pub comments: Vec<Span>,
}

/// Tokenize a whole source file.
///
/// # Errors
/// Returns the first unterminated construct.
pub fn tokenize(source: &str) -> Result<Tokens, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    Ok(Tokens {
        tokens,
        comments: lexer.into_comments(),
    })
}

/// Spans of every `keyword` token in `source`.
///
/// # Errors
/// Returns the first unterminated construct.
pub fn keyword_spans(source: &str, keyword: Keyword) -> Result<Vec<Span>, LexError> {
    Ok(tokenize(source)?
        .tokens
        .into_iter()
        .filter(|token| token.kind == TokenKind::Keyword(keyword))
        .map(|token| token.span)
        .collect())
}

/// Spans of every comment in `source`, hashbang included.
///
/// # Errors
/// Returns the first unterminated construct.
pub fn comment_spans(source: &str) -> Result<Vec<Span>, LexError> {
    tokenize(source).map(|tokens| tokens.comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_spans_skip_strings_and_comments() {
        let source = r#"
const a = "import foo from 'x'";
// export const b = 1
/* import c from "d" */
const t = `export ${a}`;
export const real = 1;
"#;
        assert!(keyword_spans(source, Keyword::Import).unwrap().is_empty());
        let exports = keyword_spans(source, Keyword::Export).unwrap();
        assert_eq!(exports.len(), 1);
        assert_eq!(&source[exports[0].range()], "export");
        assert!(source[exports[0].start as usize..].starts_with("export const real"));
    }

    #[test]
    fn test_comment_spans() {
        let source = "a(); // one\n/* two */ b();";
        let spans = comment_spans(source).unwrap();
        let texts: Vec<&str> = spans.iter().map(|s| &source[s.range()]).collect();
        assert_eq!(texts, vec!["// one", "/* two */"]);
    }

    #[test]
    fn test_tokenize_rejects_unterminated() {
        let err = tokenize("import a from 'b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.offset, 14);
    }

    #[test]
    fn test_typescript_and_decorators_are_tolerated() {
        let source = "@Component({})\nexport class A<T extends B> implements C { x!: T }";
        assert_eq!(keyword_spans(source, Keyword::Export).unwrap().len(), 1);
    }
}
