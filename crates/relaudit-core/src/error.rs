//! Error taxonomy for the audit core.

/// Errors that invalidate a whole audit run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("release report does not have an Images section")]
    MissingSection,

    #[error("invalid coverage rule pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("coverage rule set must not be empty")]
    EmptyRuleSet,
}

/// Result type for audit core operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_display() {
        let err = AuditError::MissingSection;
        assert!(err.to_string().contains("Images"));
    }

    #[test]
    fn test_invalid_pattern_display_names_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = AuditError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().contains("invalid coverage rule pattern ("));
    }
}
