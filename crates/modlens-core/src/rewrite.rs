//! Rewrite import specifiers in source text to resolved locations.

use std::collections::BTreeMap;
use std::ops::Range;

use futures::future::try_join_all;

use crate::analyze::Analyzer;
use crate::config::ResolveOptions;
use crate::error::Error;
use crate::resolver::Resolver;

/// A quoted specifier in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Site {
    range: Range<usize>,
    specifier: String,
}

/// Specifier sites of static imports, literal dynamic imports and
/// `export .. from` re-exports, ordered by position.
fn specifier_sites(analyzer: &Analyzer, code: &str) -> Vec<Site> {
    let mut sites: Vec<Site> = analyzer
        .find_static_imports(code)
        .into_iter()
        .map(|import| Site {
            range: import.specifier_range,
            specifier: import.specifier,
        })
        .collect();
    sites.extend(analyzer.find_dynamic_imports(code).into_iter().filter_map(|import| {
        let range = import.literal_specifier_range()?;
        Some(Site {
            specifier: code[range.clone()].to_string(),
            range,
        })
    }));
    sites.extend(analyzer.find_exports(code).into_iter().filter_map(|export| {
        Some(Site {
            range: export.specifier_range?,
            specifier: export.specifier?,
        })
    }));
    sites.sort_by_key(|site| site.range.start);
    sites.dedup_by_key(|site| site.range.start);
    sites
}

fn splice(code: &str, sites: &[Site], resolved: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    for site in sites {
        let Some(replacement) = resolved.get(&site.specifier) else {
            continue;
        };
        out.push_str(&code[last..site.range.start]);
        out.push_str(replacement);
        last = site.range.end;
    }
    out.push_str(&code[last..]);
    out
}

fn distinct(sites: &[Site]) -> Vec<String> {
    let mut specifiers: Vec<String> = sites.iter().map(|site| site.specifier.clone()).collect();
    specifiers.sort();
    specifiers.dedup();
    specifiers
}

/// Replace every import specifier in `code` with its resolved location.
///
/// Each distinct specifier is resolved once, and replacements go by
/// position, so a specifier that is a substring of another is left alone.
/// Dynamic imports with a computed argument are not touched. The first
/// resolution failure is returned.
pub fn resolve_imports_sync(
    code: &str,
    resolver: &Resolver,
    options: &ResolveOptions,
) -> Result<String, Error> {
    let sites = specifier_sites(&Analyzer::default(), code);
    if sites.is_empty() {
        return Ok(code.to_string());
    }
    let resolved = distinct(&sites)
        .into_iter()
        .map(|specifier| {
            let url = resolver.resolve_sync(&specifier, options)?;
            Ok((specifier, url))
        })
        .collect::<Result<BTreeMap<_, _>, Error>>()?;
    Ok(splice(code, &sites, &resolved))
}

/// Async form of [`resolve_imports_sync`]; specifiers resolve concurrently.
pub async fn resolve_imports(
    code: &str,
    resolver: &Resolver,
    options: &ResolveOptions,
) -> Result<String, Error> {
    let sites = specifier_sites(&Analyzer::default(), code);
    if sites.is_empty() {
        return Ok(code.to_string());
    }
    let resolved = try_join_all(distinct(&sites).into_iter().map(|specifier| async move {
        let url = resolver.resolve(&specifier, options).await?;
        Ok::<_, Error>((specifier, url))
    }))
    .await?;
    Ok(splice(code, &sites, &resolved.into_iter().collect()))
}
