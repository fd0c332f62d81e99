// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// The kind of input a scan classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    Url,
    Email,
    Html,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Url => "url",
            InputType::Email => "email",
            InputType::Html => "html",
        }
    }
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scan result ready for insertion. The id and created_at come from the
/// database.
#[derive(Debug, Clone)]
pub struct NewScan {
    pub input_type: InputType,
    /// Display label — uploaded filename or a fixed literal for raw input
    pub raw_name: String,
    /// Truncated input text
    pub content: String,
    pub is_malicious: bool,
    pub threat_type: String,
    pub threat_score: f64,
    pub binary_score: Option<f64>,
    /// Comma-joined highlighted keywords
    pub tokens: String,
}

/// A persisted scan row. Immutable after creation — no update or delete
/// operation exists anywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub input_type: String,
    pub raw_name: String,
    pub content: String,
    pub is_malicious: bool,
    pub threat_type: String,
    pub threat_score: f64,
    pub binary_score: Option<f64>,
    pub tokens: String,
    pub created_at: String,
}

/// A scan row without its content, as returned by the history listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: i64,
    pub input_type: String,
    pub raw_name: String,
    pub threat_type: String,
    pub is_malicious: bool,
    pub created_at: String,
}
