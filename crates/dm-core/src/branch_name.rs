//! Strongly-typed branch name.

use crate::newtype_string::define_validated_string;

/// Name of the main-line branch used when none is configured.
pub const DEFAULT_BRANCH: &str = "trunk";

define_validated_string! {
    /// Namespace selector scoping which deltas are visible.
    ///
    /// Branch names double as directory names under the delta storage root, so
    /// they may not contain path separators or be `.`/`..`.
    pub struct BranchName => InvalidBranchName, validate_branch_name;
}

impl BranchName {
    /// The main-line branch (`trunk`).
    pub fn trunk() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self::trunk()
    }
}

fn validate_branch_name(s: &str) -> Result<(), String> {
    if s.trim().is_empty() {
        return Err("branch name must not be empty".to_string());
    }
    if s == "." || s == ".." {
        return Err("branch name must not be a relative path component".to_string());
    }
    if s.contains(['/', '\\']) {
        return Err("branch name must not contain path separators".to_string());
    }
    if s.chars().any(char::is_whitespace) {
        return Err("branch name must not contain whitespace".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_trunk() {
        assert_eq!(BranchName::default(), "trunk");
    }

    #[test]
    fn test_parse_valid() {
        let branch = BranchName::parse("release-2.1").unwrap();
        assert_eq!(branch.as_str(), "release-2.1");
        assert_eq!(branch.to_string(), "release-2.1");
    }

    #[test]
    fn test_rejects_path_like_names() {
        assert!(BranchName::parse("").is_err());
        assert!(BranchName::parse("..").is_err());
        assert!(BranchName::parse("branches/foo").is_err());
        assert!(BranchName::parse("a b").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: BranchName = serde_yaml::from_str("feature-x").unwrap();
        assert_eq!(ok, "feature-x");
        let err = serde_yaml::from_str::<BranchName>("\"a/b\"");
        assert!(err.is_err());
    }
}
