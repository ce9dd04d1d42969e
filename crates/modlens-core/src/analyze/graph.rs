//! Export names through `export * from` chains.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::Mutex;

use super::{Analyzer, ExportKind, ExportRecord};
use crate::config::ResolveOptions;
use crate::error::Error;
use crate::resolver::Resolver;
use crate::utils::{load_url, load_url_sync};

/// What a module contributes: its own names, and the specifiers of
/// anonymous star re-exports still to follow.
fn split_exports(records: Vec<ExportRecord>) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut stars = Vec::new();
    for record in records {
        match (record.kind, record.name, record.specifier) {
            (ExportKind::Star, None, Some(specifier)) => stars.push(specifier),
            _ => names.extend(record.names),
        }
    }
    (names, stars)
}

fn is_file_url(url: &str) -> bool {
    url.starts_with("file:")
}

impl Analyzer {
    /// Names exported by `specifier`, including everything reachable through
    /// `export * from` re-exports.
    ///
    /// Each module is read once; cyclic re-exports terminate. Re-exports of
    /// builtins and remote modules contribute nothing.
    pub fn resolve_module_export_names_sync(
        &self,
        resolver: &Resolver,
        specifier: &str,
        options: &ResolveOptions,
    ) -> Result<BTreeSet<String>, Error> {
        let mut visited = HashSet::new();
        let mut names = BTreeSet::new();
        self.collect_sync(resolver, specifier, options, &mut visited, &mut names)?;
        Ok(names)
    }

    fn collect_sync(
        &self,
        resolver: &Resolver,
        specifier: &str,
        options: &ResolveOptions,
        visited: &mut HashSet<String>,
        names: &mut BTreeSet<String>,
    ) -> Result<(), Error> {
        let url = resolver.resolve_sync(specifier, options)?;
        if !is_file_url(&url) {
            tracing::debug!(%specifier, %url, "skipping non-file module");
            return Ok(());
        }
        if !visited.insert(url.clone()) {
            tracing::trace!(%url, "already visited");
            return Ok(());
        }

        let code = load_url_sync(&url)?;
        let (own, stars) = split_exports(self.find_exports(&code));
        names.extend(own);

        let from_here = options.clone().with_anchors([url.as_str()]);
        for star in stars {
            self.collect_sync(resolver, &star, &from_here, visited, names)?;
        }
        Ok(())
    }

    /// Async form of [`Analyzer::resolve_module_export_names_sync`]. Star
    /// re-exports of one module are followed concurrently.
    pub async fn resolve_module_export_names(
        &self,
        resolver: &Resolver,
        specifier: &str,
        options: &ResolveOptions,
    ) -> Result<BTreeSet<String>, Error> {
        let visited = Arc::new(Mutex::new(HashSet::new()));
        self.collect(resolver, specifier.to_string(), options.clone(), visited)
            .await
    }

    fn collect<'a>(
        &'a self,
        resolver: &'a Resolver,
        specifier: String,
        options: ResolveOptions,
        visited: Arc<Mutex<HashSet<String>>>,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, Error>> {
        async move {
            let mut names = BTreeSet::new();
            let url = resolver.resolve(&specifier, &options).await?;
            if !is_file_url(&url) {
                tracing::debug!(%specifier, %url, "skipping non-file module");
                return Ok(names);
            }
            if !visited.lock().await.insert(url.clone()) {
                tracing::trace!(%url, "already visited");
                return Ok(names);
            }

            let code = load_url(&url).await?;
            let (own, stars) = split_exports(self.find_exports(&code));
            names.extend(own);

            let from_here = options.with_anchors([url.as_str()]);
            let nested = try_join_all(stars.into_iter().map(|star| {
                self.collect(resolver, star, from_here.clone(), Arc::clone(&visited))
            }))
            .await?;
            names.extend(nested.into_iter().flatten());
            Ok(names)
        }
        .boxed()
    }
}
