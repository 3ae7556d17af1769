//! Code-list resolution for select fields.
//!
//! A select field references an externally maintained code list by URI.
//! Resolvers turn that URI into an ordered list of [`CodeEntry`] values.
//! Resolution never fails loudly: every resolver returns a
//! [`CodeListResolution`], and an unreachable registry degrades a single
//! field instead of aborting the conversion.

mod genericode;
mod xrepository;

pub use genericode::{canonical_uri, parse_genericode, GenericodeFileResolver};
pub use xrepository::XRepositoryResolver;

use serde::Serialize;

/// One entry of a code list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    /// Machine value; some registry rows carry none.
    pub code: Option<String>,
    /// Human-readable label.
    pub label: String,
}

impl CodeEntry {
    #[must_use]
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            label: label.into(),
        }
    }
}

/// Outcome of resolving a code-list URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeListResolution {
    /// The list was found; it may legitimately be empty.
    Resolved(Vec<CodeEntry>),
    /// The list could not be obtained.
    Unresolved { reason: String },
}

impl CodeListResolution {
    #[must_use]
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self::Unresolved {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Labels of all entries, in order. Empty when unresolved.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::Resolved(entries) => entries.iter().map(|e| e.label.as_str()).collect(),
            Self::Unresolved { .. } => Vec::new(),
        }
    }
}

/// Resolves code-list URIs to entries.
pub trait CodeListResolver {
    /// Resolve `uri`. Must not panic or propagate errors.
    fn resolve(&self, uri: &str) -> CodeListResolution;
}

impl<R: CodeListResolver + ?Sized> CodeListResolver for &R {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        (**self).resolve(uri)
    }
}

impl<R: CodeListResolver + ?Sized> CodeListResolver for Box<R> {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        (**self).resolve(uri)
    }
}

/// Resolver used when lookups are switched off (e.g. offline runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

impl CodeListResolver for DisabledResolver {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        tracing::debug!(uri, "Code-list resolution disabled");
        CodeListResolution::unresolved("code list resolution disabled")
    }
}

/// Tries several resolvers in order; the first resolved list wins.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn CodeListResolver>>,
}

impl ResolverChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver with lower priority than the existing ones.
    #[must_use]
    pub fn with(mut self, resolver: impl CodeListResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl CodeListResolver for ResolverChain {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        let mut reasons = Vec::new();

        for resolver in &self.resolvers {
            match resolver.resolve(uri) {
                resolved @ CodeListResolution::Resolved(_) => return resolved,
                CodeListResolution::Unresolved { reason } => reasons.push(reason),
            }
        }

        if reasons.is_empty() {
            CodeListResolution::unresolved("no code list resolver configured")
        } else {
            CodeListResolution::unresolved(reasons.join("; "))
        }
    }
}
