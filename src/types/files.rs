//! File entry and classification types
//!
//! These are the client-side shapes of what the backend reports: scan
//! candidates, files protected by keyword, and AI-classified entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CleanerError;

// ============================================================================
// Categories
// ============================================================================

/// File category as understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileCategory {
    /// Pictures
    Images,
    /// Video files
    Videos,
    /// Audio files
    Audio,
    /// Text, office and PDF documents
    Documents,
    /// Compressed archives and disk images
    Archives,
    /// Source files
    Code,
    /// Installer packages
    Installers,
    /// Everything else
    #[serde(rename = "Autres", alias = "Other")]
    Other,
}

impl FileCategory {
    /// Categories that can be toggled for a scan, in display order
    pub const SCANNABLE: [Self; 6] = [
        Self::Images,
        Self::Videos,
        Self::Audio,
        Self::Documents,
        Self::Archives,
        Self::Other,
    ];

    /// Categories offered for quick deletion, in display order
    pub const QUICK_DELETE: [Self; 7] = [
        Self::Installers,
        Self::Archives,
        Self::Images,
        Self::Documents,
        Self::Audio,
        Self::Videos,
        Self::Other,
    ];

    /// Name sent to and received from the backend
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Documents => "Documents",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Installers => "Installers",
            Self::Other => "Autres",
        }
    }

    /// Whether a fresh config scans this category
    #[must_use]
    pub const fn enabled_by_default(self) -> bool {
        !matches!(self, Self::Archives | Self::Other)
    }

    /// Lenient lookup used at the event boundary
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FileCategory {
    type Err = CleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(Self::Images),
            "videos" | "video" => Ok(Self::Videos),
            "audio" => Ok(Self::Audio),
            "documents" | "docs" => Ok(Self::Documents),
            "archives" => Ok(Self::Archives),
            "code" => Ok(Self::Code),
            "installers" => Ok(Self::Installers),
            "other" | "autres" => Ok(Self::Other),
            other => Err(CleanerError::validation(format!(
                "Unknown file category: {other}"
            ))),
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A file reported by the scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path, unique within a scan
    pub path: String,
    /// Base name shown to the user
    pub display_name: String,
    /// Size on disk
    pub size_bytes: u64,
    /// Category assigned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<FileCategory>,
    /// Days since last modification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_days: Option<u64>,
}

impl FileEntry {
    /// Create an entry whose display name is the path's base name
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.into();
        let display_name = base_name(&path).to_string();
        Self {
            path,
            display_name,
            size_bytes,
            category: None,
            age_days: None,
        }
    }
}

/// A file the backend refused to offer because its name matched a keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedEntry {
    /// The protected file
    #[serde(flatten)]
    pub file: FileEntry,
    /// Keyword that triggered protection
    #[serde(default)]
    pub keyword: Option<String>,
}

/// AI verdict for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Safe to delete
    Delete,
    /// Should be kept
    Keep,
    /// Needs a human look
    Review,
}

impl Decision {
    /// Parse a backend decision; anything unrecognised needs review
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
            Some("DELETE") => Self::Delete,
            Some("KEEP") => Self::Keep,
            _ => Self::Review,
        }
    }

    /// Uppercase label as used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Keep => "KEEP",
            Self::Review => "REVIEW",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan candidate after AI classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    /// The classified file
    #[serde(flatten)]
    pub file: FileEntry,
    /// Verdict
    pub decision: Decision,
    /// Model's justification
    pub reason: String,
    /// Human size as formatted by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
    /// Importance as rated by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

impl ClassifiedEntry {
    /// Path of the classified file
    #[must_use]
    pub fn path(&self) -> &str {
        &self.file.path
    }
}

/// Last path component, accepting both separators
#[must_use]
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(trimmed)
}
