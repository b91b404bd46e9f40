use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use yansi::{Color, Paint};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SourceLocation {
    pub file: String,
    pub start: i32,
    pub end: i32,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SecondarySourceLocation {
    pub file: Option<String>,
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Error" | "error" => Ok(Self::Error),
            "Warning" | "warning" => Ok(Self::Warning),
            "Info" | "info" => Ok(Self::Info),
            s => Err(format!("Invalid severity: {s}")),
        }
    }
}

impl Severity {
    /// Returns `true` if the severity is `Error`.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns `true` if the severity is `Warning`.
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Warning)
    }

    /// Returns `true` if the severity is `Info`.
    pub const fn is_info(&self) -> bool {
        matches!(self, Self::Info)
    }

    /// Returns the string representation of the severity.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }

    /// Returns the color to format the severity with.
    pub const fn color(&self) -> Color {
        match self {
            Self::Error => Color::Red,
            Self::Warning => Color::Yellow,
            Self::Info => Color::White,
        }
    }
}

/// A diagnostic reported by solc in the `errors` list of the standard JSON output.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_source_locations: Vec<SecondarySourceLocation>,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub component: String,
    pub severity: Severity,
    /// Numeric error code, solc reports it as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Error {
    /// Returns `true` if this diagnostic fails the compilation.
    pub const fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// Returns `true` if this is a warning.
    pub const fn is_warning(&self) -> bool {
        self.severity.is_warning()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = self.formatted_message.as_deref() {
            return f.write_str(msg.trim_end());
        }
        let severity = self.severity.as_str().fg(self.severity.color()).bold();
        if self.r#type.is_empty() {
            write!(f, "{severity}: {}", self.message)
        } else {
            write!(f, "{severity} ({}): {}", self.r#type, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_deserialize_solc_error() {
        let s = r#"{
            "component": "general",
            "errorCode": "2314",
            "formattedMessage": "ParserError: Expected ';' but got '}'\n --> <stdin>:2:1:\n\n",
            "message": "Expected ';' but got '}'",
            "severity": "error",
            "sourceLocation": { "end": 42, "file": "<stdin>", "start": 41 },
            "type": "ParserError"
        }"#;
        let err: Error = serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(s))
            .unwrap();
        assert!(err.is_error());
        assert_eq!(err.error_code.as_deref(), Some("2314"));
        assert_eq!(err.to_string(), "ParserError: Expected ';' but got '}'\n --> <stdin>:2:1:");
    }

    #[test]
    fn display_without_formatted_message() {
        yansi::disable();
        let err = Error {
            source_location: None,
            secondary_source_locations: vec![],
            r#type: "Warning".to_string(),
            component: "general".to_string(),
            severity: Severity::Warning,
            error_code: None,
            message: "unused variable".to_string(),
            formatted_message: None,
            other: Default::default(),
        };
        assert!(err.is_warning());
        assert_eq!(err.to_string(), "Warning (Warning): unused variable");
    }

    #[test]
    fn severity_from_str() {
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
        assert_eq!("Info".parse::<Severity>().unwrap(), Severity::Info);
        assert!("fatal".parse::<Severity>().is_err());
    }
}
