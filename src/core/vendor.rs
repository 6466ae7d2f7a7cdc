//! CI vendor tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// The CI system a pipeline document was written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// GitHub Actions workflow (`.github/workflows/*.yml`)
    GitHub,
    /// Azure DevOps pipeline (`azure-pipelines.yml`)
    Azure,
    /// CodeMagic configuration (`codemagic.yaml`)
    CodeMagic,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [Vendor::GitHub, Vendor::Azure, Vendor::CodeMagic];

    /// Short machine-readable tag
    pub fn tag(&self) -> &'static str {
        match self {
            Vendor::GitHub => "github",
            Vendor::Azure => "azure",
            Vendor::CodeMagic => "codemagic",
        }
    }

    /// Parse a vendor tag, accepting the common aliases
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "github" | "gh" | "github-actions" | "actions" => Some(Vendor::GitHub),
            "azure" | "azure-devops" | "ado" | "azdo" => Some(Vendor::Azure),
            "codemagic" | "cm" => Some(Vendor::CodeMagic),
            _ => None,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::GitHub => "GitHub Actions",
            Vendor::Azure => "Azure DevOps",
            Vendor::CodeMagic => "CodeMagic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_aliases() {
        assert_eq!(Vendor::from_tag("GitHub"), Some(Vendor::GitHub));
        assert_eq!(Vendor::from_tag("ado"), Some(Vendor::Azure));
        assert_eq!(Vendor::from_tag(" cm "), Some(Vendor::CodeMagic));
        assert_eq!(Vendor::from_tag("jenkins"), None);
    }

    #[test]
    fn test_tag_is_accepted_back() {
        for vendor in Vendor::ALL {
            assert_eq!(Vendor::from_tag(vendor.tag()), Some(vendor));
        }
    }
}
