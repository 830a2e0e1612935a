use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Not Found")]
    NotFound,
}

impl Status {
    pub fn found(found: bool) -> Self {
        if found { Status::Ok } else { Status::NotFound }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK"),
            Status::NotFound => f.write_str("Not Found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRow {
    pub partial: Option<String>,
    pub id: Option<String>,
    pub status: Status,
}

impl DiagnosticRow {
    pub fn not_found() -> Self {
        Self {
            partial: None,
            id: None,
            status: Status::NotFound,
        }
    }
}

/// Console snapshot emitted after every successful show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticTable {
    pub rendering: DiagnosticRow,
    pub trigger: DiagnosticRow,
    pub target: DiagnosticRow,
}

impl DiagnosticTable {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
