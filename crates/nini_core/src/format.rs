use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Org-mode outline; headings mirror reply nesting.
    Org,
    /// Markdown bullet list indented by reply depth.
    Markdown,
    /// Full-fidelity JSON.
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Org, ExportFormat::Markdown, ExportFormat::Json];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Org => "org",
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown export format '{}' (expected org, md or json)", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "org" => Ok(ExportFormat::Org),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// One rendered output, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub content: Vec<u8>,
    pub suggested_filename: String,
}

#[cfg(test)]
mod tests {
    use super::ExportFormat;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("org".parse::<ExportFormat>(), Ok(ExportFormat::Org));
        assert_eq!("MD".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert_eq!("markdown".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert_eq!(" json ".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("html".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn display_matches_extension() {
        for format in ExportFormat::ALL {
            assert_eq!(format.to_string(), format.extension());
        }
    }
}
