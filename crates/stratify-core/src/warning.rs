//! Warning records for the two-tier diagnostic model.
//!
//! *Warnings* (advisory) flag patterns that were handled but deserve a
//! human's attention. *Errors* (fatal for the file) flag patterns whose
//! cascade or selector semantics cannot be proven preserved; an
//! error-severity warning always accompanies a file-level abort.

use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Advisory; does not block transformation.
    Warning,
    /// Fatal for the file; always accompanies an abort.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Taxonomy of diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Selector shape the engine does not support.
    UnsupportedSelector,
    /// A dynamic slot the value resolver could not classify.
    UnknownInterpolation,
    /// A cascade patch would need a base value that is not a static literal.
    DynamicBase,
    /// A referenced mixin whose contents are unknown in this file.
    UnknownMixin,
    /// A style key referenced but resolvable to no entry.
    UnresolvableStyleKey,
    /// Conflicting declarations that cannot be merged.
    ConflictingDeclarations,
    /// An `!important` declaration (advisory).
    ImportantDeclaration,
    /// A base value inferred statically on a best-effort basis (advisory).
    InferredStaticDefault,
}

impl WarningKind {
    /// Stable tag string for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::UnsupportedSelector => "unsupported-selector",
            Self::UnknownInterpolation => "unknown-interpolation",
            Self::DynamicBase => "dynamic-base",
            Self::UnknownMixin => "unknown-mixin",
            Self::UnresolvableStyleKey => "unresolvable-style-key",
            Self::ConflictingDeclarations => "conflicting-declarations",
            Self::ImportantDeclaration => "important-declaration",
            Self::InferredStaticDefault => "inferred-static-default",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Severity tier.
    pub severity: Severity,
    /// Taxonomy tag.
    pub kind: WarningKind,
    /// Human-readable context.
    pub message: String,
    /// Offending selector text, if relevant.
    pub selector: Option<String>,
    /// Affected property, if relevant.
    pub property: Option<String>,
    /// Affected style key, if relevant.
    pub style_key: Option<String>,
    /// Source location as (line, column), when known.
    pub location: Option<(u32, u32)>,
}

impl Warning {
    /// Create an advisory warning.
    pub fn advisory(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            selector: None,
            property: None,
            style_key: None,
            location: None,
        }
    }

    /// Create an error-severity warning.
    pub fn error(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::advisory(kind, message)
        }
    }

    /// Attach the offending selector.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Attach the affected property.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Attach the affected style key.
    pub fn with_style_key(mut self, style_key: impl Into<String>) -> Self {
        self.style_key = Some(style_key.into());
        self
    }

    /// Attach a source location.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some((line, column));
        self
    }

    /// Whether this warning is fatal for the file.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)?;
        if let Some(selector) = &self.selector {
            write!(f, " (selector: {})", selector)?;
        }
        if let Some(property) = &self.property {
            write!(f, " (property: {})", property)?;
        }
        if let Some(style_key) = &self.style_key {
            write!(f, " (style key: {})", style_key)?;
        }
        if let Some((line, column)) = self.location {
            write!(f, " at {}:{}", line, column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_warnings_are_fatal() {
        let warning =
            Warning::error(WarningKind::UnsupportedSelector, "cannot translate selector")
                .with_selector("&.active, &[aria-selected=\"true\"]");
        assert!(warning.is_fatal());
        assert_eq!(warning.kind.tag(), "unsupported-selector");
    }

    #[test]
    fn advisory_warnings_are_not_fatal() {
        let warning = Warning::advisory(WarningKind::ImportantDeclaration, "!important kept")
            .with_property("color")
            .at(12, 4);
        assert!(!warning.is_fatal());
        let text = warning.to_string();
        assert!(text.contains("important-declaration"));
        assert!(text.contains("12:4"));
    }
}
