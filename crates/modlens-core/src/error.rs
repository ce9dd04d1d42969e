use std::fmt;
use std::path::PathBuf;

use modlens_lexer::LexError;
use thiserror::Error;

/// Core error type for modlens operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No anchor and no extension variant resolved the specifier.
    #[error("Cannot find module '{specifier}' imported from {}", .anchors.join(", "))]
    NotFound {
        specifier: String,
        anchors: Vec<String>,
    },

    /// A single resolution attempt found nothing at the target location.
    #[error("Cannot find module '{target}' imported from {base}")]
    ModuleNotFound { target: String, base: String },

    #[error("Directory import '{path}' is not supported resolving ES modules imported from {base}")]
    UnsupportedDirImport { path: String, base: String },

    #[error("Package subpath '{subpath}' is not defined by \"exports\" in {} imported from {base}", .manifest.display())]
    PackagePathNotExported {
        subpath: String,
        manifest: PathBuf,
        base: String,
    },

    #[error("Unsupported protocol '{protocol}' in '{specifier}': only file, data, node, http and https URLs can be resolved")]
    InvalidProtocol { specifier: String, protocol: String },

    #[error("Invalid module specifier '{specifier}': {reason}")]
    InvalidSpecifier { specifier: String, reason: String },

    #[error("Invalid package target '{target}' for key '{key}' in {}", .manifest.display())]
    InvalidPackageTarget {
        target: String,
        key: String,
        manifest: PathBuf,
    },

    #[error("Invalid package config {}: {reason}", .manifest.display())]
    InvalidPackageConfig { manifest: PathBuf, reason: String },

    #[error("Package import specifier '{specifier}' is not defined imported from {base}")]
    PackageImportNotDefined { specifier: String, base: String },

    #[error("Tokenizer rejected source: {0}")]
    ParseDegraded(#[from] LexError),

    #[error("No package manifest at {}", .path.display())]
    ManifestAbsent { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub(crate) fn invalid_specifier(specifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpecifier {
            specifier: specifier.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } | Self::ModuleNotFound { .. } => ErrorCode::ModuleNotFound,
            Self::UnsupportedDirImport { .. } => ErrorCode::UnsupportedDirImport,
            Self::PackagePathNotExported { .. } => ErrorCode::PackagePathNotExported,
            Self::InvalidProtocol { .. } => ErrorCode::UnsupportedUrlScheme,
            Self::InvalidSpecifier { .. } => ErrorCode::InvalidModuleSpecifier,
            Self::InvalidPackageTarget { .. } => ErrorCode::InvalidPackageTarget,
            Self::InvalidPackageConfig { .. } => ErrorCode::InvalidPackageConfig,
            Self::PackageImportNotDefined { .. } => ErrorCode::PackageImportNotDefined,
            Self::ParseDegraded(_) => ErrorCode::ParseDegraded,
            Self::ManifestAbsent { .. } => ErrorCode::ManifestAbsent,
            Self::Io(_) => ErrorCode::Io,
            Self::Other(_) => ErrorCode::Internal,
        }
    }

    /// Whether the resolver may try the next anchor or extension after this error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code().is_not_found()
    }
}

/// Error codes, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ModuleNotFound,
    UnsupportedDirImport,
    PackagePathNotExported,
    UnsupportedUrlScheme,
    InvalidModuleSpecifier,
    InvalidPackageTarget,
    InvalidPackageConfig,
    PackageImportNotDefined,
    ParseDegraded,
    ManifestAbsent,
    Io,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleNotFound => "ERR_MODULE_NOT_FOUND",
            Self::UnsupportedDirImport => "ERR_UNSUPPORTED_DIR_IMPORT",
            Self::PackagePathNotExported => "ERR_PACKAGE_PATH_NOT_EXPORTED",
            Self::UnsupportedUrlScheme => "ERR_UNSUPPORTED_ESM_URL_SCHEME",
            Self::InvalidModuleSpecifier => "ERR_INVALID_MODULE_SPECIFIER",
            Self::InvalidPackageTarget => "ERR_INVALID_PACKAGE_TARGET",
            Self::InvalidPackageConfig => "ERR_INVALID_PACKAGE_CONFIG",
            Self::PackageImportNotDefined => "ERR_PACKAGE_IMPORT_NOT_DEFINED",
            Self::ParseDegraded => "ERR_PARSE_DEGRADED",
            Self::ManifestAbsent => "ERR_MANIFEST_ABSENT",
            Self::Io => "ERR_IO",
            Self::Internal => "ERR_INTERNAL",
        }
    }

    /// Not-found class codes are retried across anchors and extensions.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound | Self::UnsupportedDirImport | Self::PackagePathNotExported
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
