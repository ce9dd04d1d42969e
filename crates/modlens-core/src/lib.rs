//! modlens-core: Node-compatible module resolution and static import/export
//! analysis.
//!
//! # Example
//!
//! ```no_run
//! use modlens_core::{find_exports, ResolveOptions, Resolver};
//!
//! let resolver = Resolver::default();
//! let url = resolver.resolve_sync("./src/index", &ResolveOptions::default())?;
//! let code = modlens_core::utils::load_url_sync(&url)?;
//! for export in find_exports(&code) {
//!     println!("{:?} {:?}", export.kind, export.names);
//! }
//! # Ok::<(), modlens_core::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod analyze;
pub mod builtins;
pub mod cjs;
pub mod config;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod rewrite;
pub mod subpath;
pub mod syntax;
pub mod utils;

pub use analyze::{
    find_dynamic_imports, find_export_names, find_exports, find_static_imports,
    find_type_exports, find_type_imports, parse_static_import, parse_type_import, Analyzer,
    DynamicImport, ExportKind, ExportRecord, ImportKind, KeywordValidator, LexerValidator,
    ParsedStaticImport, StaticImport,
};
pub use builtins::BuiltinModules;
pub use cjs::CommonJsContext;
pub use config::{ResolveOptions, ResolverConfig};
pub use error::{Error, ErrorCode};
pub use manifest::{ExportsNode, PackageManifest};
pub use resolver::{ModuleResolve, NodeModuleResolve, Resolver};
pub use rewrite::{resolve_imports, resolve_imports_sync};
pub use subpath::{parse_manifest_path, resolve_subpath, ManifestPath};
pub use syntax::{
    detect_syntax, has_cjs_syntax, has_esm_syntax, is_valid_node_import,
    is_valid_node_import_sync, NodeImportOptions, SyntaxDetection, SyntaxOptions,
};
