//! Static import/export analysis.
//!
//! Each finder runs regular-expression passes over the source to collect
//! candidate records, then drops candidates that do not enclose a real
//! `import`/`export` keyword token (see [`KeywordValidator`]). When the
//! source cannot be tokenized the candidates are returned unfiltered.
//!
//! All offsets are byte offsets; `code == source[start..end]` for every
//! record.

mod exports;
mod graph;
mod imports;
mod patterns;
mod validate;

use std::sync::Arc;

use modlens_lexer::Keyword;

pub use exports::{ExportKind, ExportRecord};
pub use imports::{
    parse_static_import, parse_type_import, DynamicImport, ImportKind, ParsedStaticImport,
    StaticImport,
};
pub use validate::{KeywordValidator, LexerValidator, Located};

/// Filter `candidates` down to those enclosing one of `keyword_spans`.
///
/// `None` keeps every candidate.
pub fn retain_validated<T: Located>(
    candidates: Vec<T>,
    keyword_spans: Option<&[modlens_lexer::Span]>,
) -> Vec<T> {
    validate::retain_validated(candidates, keyword_spans)
}

/// Import/export finder with a pluggable keyword validator.
#[derive(Debug, Clone)]
pub struct Analyzer {
    validator: Option<Arc<dyn KeywordValidator>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(LexerValidator)
    }
}

impl Analyzer {
    #[must_use]
    pub fn new(validator: impl KeywordValidator + 'static) -> Self {
        Self {
            validator: Some(Arc::new(validator)),
        }
    }

    /// An analyzer that keeps every pattern candidate.
    #[must_use]
    pub fn unvalidated() -> Self {
        Self { validator: None }
    }

    fn validated<T: Located>(&self, code: &str, keyword: Keyword, candidates: Vec<T>) -> Vec<T> {
        match &self.validator {
            Some(validator) => validate::validate(validator.as_ref(), code, keyword, candidates),
            None => candidates,
        }
    }

    #[must_use]
    pub fn find_static_imports(&self, code: &str) -> Vec<StaticImport> {
        self.validated(code, Keyword::Import, imports::static_candidates(code))
    }

    #[must_use]
    pub fn find_dynamic_imports(&self, code: &str) -> Vec<DynamicImport> {
        self.validated(code, Keyword::Import, imports::dynamic_candidates(code))
    }

    /// `import type` declarations plus static imports with inline `type`
    /// entries. Parse them with [`parse_type_import`].
    #[must_use]
    pub fn find_type_imports(&self, code: &str) -> Vec<StaticImport> {
        self.validated(code, Keyword::Import, imports::type_candidates(code))
    }

    /// Value exports in source order. Of two adjacent records with the same
    /// kind and name only the later is kept.
    #[must_use]
    pub fn find_exports(&self, code: &str) -> Vec<ExportRecord> {
        let mut records = self.validated(code, Keyword::Export, exports::export_candidates(code));
        records.sort_by_key(|record| (record.start, record.end));
        exports::collapse_duplicates(records)
    }

    /// Type-only exports: declarations first, then `export type { .. }` lists.
    #[must_use]
    pub fn find_type_exports(&self, code: &str) -> Vec<ExportRecord> {
        let records =
            self.validated(code, Keyword::Export, exports::type_export_candidates(code));
        exports::collapse_duplicates(records)
    }

    /// Every exported name, in source order.
    #[must_use]
    pub fn find_export_names(&self, code: &str) -> Vec<String> {
        self.find_exports(code)
            .into_iter()
            .flat_map(|record| record.names)
            .collect()
    }
}

/// [`Analyzer::find_static_imports`] with the default analyzer.
#[must_use]
pub fn find_static_imports(code: &str) -> Vec<StaticImport> {
    Analyzer::default().find_static_imports(code)
}

/// [`Analyzer::find_dynamic_imports`] with the default analyzer.
#[must_use]
pub fn find_dynamic_imports(code: &str) -> Vec<DynamicImport> {
    Analyzer::default().find_dynamic_imports(code)
}

/// [`Analyzer::find_type_imports`] with the default analyzer.
#[must_use]
pub fn find_type_imports(code: &str) -> Vec<StaticImport> {
    Analyzer::default().find_type_imports(code)
}

/// [`Analyzer::find_exports`] with the default analyzer.
#[must_use]
pub fn find_exports(code: &str) -> Vec<ExportRecord> {
    Analyzer::default().find_exports(code)
}

/// [`Analyzer::find_type_exports`] with the default analyzer.
#[must_use]
pub fn find_type_exports(code: &str) -> Vec<ExportRecord> {
    Analyzer::default().find_type_exports(code)
}

/// [`Analyzer::find_export_names`] with the default analyzer.
#[must_use]
pub fn find_export_names(code: &str) -> Vec<String> {
    Analyzer::default().find_export_names(code)
}
