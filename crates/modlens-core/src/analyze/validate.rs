//! Keyword-span validation of pattern candidates.

use std::fmt;
use std::ops::Range;

use modlens_lexer::{Keyword, Span};

use crate::error::Error;

/// A record that covers a byte range of the source.
pub trait Located {
    fn range(&self) -> Range<usize>;
}

/// Locates real `import`/`export` keywords in source text.
///
/// Implementations must not report keywords that appear inside strings,
/// template literals or comments.
pub trait KeywordValidator: Send + Sync + fmt::Debug {
    /// Spans of every `keyword` token, sorted by start.
    ///
    /// # Errors
    /// Returns [`Error::ParseDegraded`] when the source cannot be tokenized.
    fn keyword_spans(&self, source: &str, keyword: Keyword) -> Result<Vec<Span>, Error>;
}

/// Validator backed by the `modlens-lexer` tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerValidator;

impl KeywordValidator for LexerValidator {
    fn keyword_spans(&self, source: &str, keyword: Keyword) -> Result<Vec<Span>, Error> {
        Ok(modlens_lexer::keyword_spans(source, keyword)?)
    }
}

/// Keep the candidates that enclose a keyword span.
///
/// `None` means tokenizing failed; every candidate is kept.
pub(crate) fn retain_validated<T: Located>(candidates: Vec<T>, spans: Option<&[Span]>) -> Vec<T> {
    let Some(spans) = spans else {
        return candidates;
    };
    candidates
        .into_iter()
        .filter(|candidate| {
            let range = candidate.range();
            let first = spans.partition_point(|span| (span.start as usize) < range.start);
            spans
                .get(first)
                .is_some_and(|span| span.end as usize <= range.end)
        })
        .collect()
}

/// Run `validator` over `source` and filter `candidates` with the result.
pub(crate) fn validate<T: Located>(
    validator: &dyn KeywordValidator,
    source: &str,
    keyword: Keyword,
    candidates: Vec<T>,
) -> Vec<T> {
    if candidates.is_empty() {
        return candidates;
    }
    match validator.keyword_spans(source, keyword) {
        Ok(spans) => retain_validated(candidates, Some(&spans)),
        Err(e) => {
            tracing::debug!(error = %e, "keyword validation skipped");
            retain_validated(candidates, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Candidate(Range<usize>);

    impl Located for Candidate {
        fn range(&self) -> Range<usize> {
            self.0.clone()
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl KeywordValidator for Failing {
        fn keyword_spans(&self, _: &str, _: Keyword) -> Result<Vec<Span>, Error> {
            Err(Error::other("no tokens"))
        }
    }

    #[test]
    fn test_retain_validated_requires_enclosed_keyword() {
        let spans = [Span::new(0, 6), Span::new(20, 26)];
        let kept = retain_validated(
            vec![Candidate(0..10), Candidate(8..18), Candidate(19..30), Candidate(21..30)],
            Some(&spans),
        );
        let ranges: Vec<_> = kept.into_iter().map(|c| c.0).collect();
        assert_eq!(ranges, [0..10, 19..30]);
    }

    #[test]
    fn test_retain_validated_without_spans_keeps_all() {
        let kept = retain_validated(vec![Candidate(0..1), Candidate(5..9)], None);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_lexer_validator_skips_comments_and_strings() {
        let source = "// import a from 'a'\nconst s = 'import b from \"b\"'\nimport c from 'c'";
        let spans = LexerValidator.keyword_spans(source, Keyword::Import).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(&source[spans[0].range()], "import");
        assert_eq!(spans[0].start as usize, source.rfind("import").unwrap());
    }

    #[test]
    fn test_validate_degrades_to_unfiltered() {
        let kept = validate(&Failing, "x", Keyword::Export, vec![Candidate(0..1)]);
        assert_eq!(kept.len(), 1);
    }
}
