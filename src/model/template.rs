//! Value bodies with embedded `%%token%%` placeholders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default placeholder marker.
pub const DEFAULT_MARKER: &str = "%%";

/// Default separator between a field token's source qualifier and its path.
pub const DEFAULT_SEPARATOR: char = '_';

/// What a placeholder token refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PlaceholderRef {
    /// A purely numeric token: a key of the variable table.
    Variable {
        /// Variable key
        key: i64,
    },
    /// Any other token: a field of the active customer record (or row).
    Field {
        /// Source qualifier before the separator (`"1"` in `1_AcctNum`)
        qualifier: Option<String>,
        /// Field path after the separator (`"AcctNum"` in `1_AcctNum`)
        path: String,
    },
}

impl PlaceholderRef {
    /// Classify a token using the default separator.
    pub fn parse(token: &str) -> Self {
        Self::parse_with_separator(token, DEFAULT_SEPARATOR)
    }

    /// Classify a token. Numeric tokens are variables, all others are fields.
    pub fn parse_with_separator(token: &str, separator: char) -> Self {
        if is_numeric_token(token) {
            if let Ok(key) = token.parse::<i64>() {
                return PlaceholderRef::Variable { key };
            }
        }
        match token.split_once(separator) {
            Some((qualifier, path)) if !path.is_empty() => PlaceholderRef::Field {
                qualifier: Some(qualifier.to_string()),
                path: path.to_string(),
            },
            _ => PlaceholderRef::Field {
                qualifier: None,
                path: token.to_string(),
            },
        }
    }
}

fn is_numeric_token(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Text copied through unchanged
    Literal {
        /// The text
        text: String,
    },
    /// A placeholder to substitute
    Placeholder {
        /// The token between the markers, as written
        token: String,
        /// What the token refers to
        reference: PlaceholderRef,
    },
}

/// A value body split into literal text and placeholders, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Segments in order
    pub segments: Vec<Segment>,
}

impl Template {
    /// Parse a value body using the default marker and separator.
    pub fn parse(source: &str) -> Result<Self, String> {
        Self::parse_with(source, DEFAULT_MARKER, DEFAULT_SEPARATOR)
    }

    /// Parse a value body.
    ///
    /// Fails on an unterminated placeholder or an empty token.
    pub fn parse_with(source: &str, marker: &str, separator: char) -> Result<Self, String> {
        if marker.is_empty() {
            return Err("placeholder marker must not be empty".to_string());
        }
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find(marker) {
            if open > 0 {
                segments.push(Segment::Literal {
                    text: rest[..open].to_string(),
                });
            }
            let after_open = &rest[open + marker.len()..];
            let close = after_open.find(marker).ok_or_else(|| {
                format!(
                    "unterminated placeholder starting at \"{}\"",
                    truncate(&rest[open..], 24)
                )
            })?;
            let token = &after_open[..close];
            if token.trim().is_empty() {
                return Err("empty placeholder token".to_string());
            }
            segments.push(Segment::Placeholder {
                token: token.to_string(),
                reference: PlaceholderRef::parse_with_separator(token, separator),
            });
            rest = &after_open[close + marker.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal {
                text: rest.to_string(),
            });
        }

        Ok(Self { segments })
    }

    /// Create a template holding only literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Literal { text: text.into() }],
        }
    }

    /// Check if the template has no placeholders.
    pub fn is_static(&self) -> bool {
        self.placeholder_count() == 0
    }

    /// Number of placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Iterate over placeholder references in source order.
    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderRef> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder { reference, .. } => Some(reference),
            Segment::Literal { .. } => None,
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal { text } => f.write_str(text)?,
                Segment::Placeholder { token, .. } => {
                    write!(f, "{}{}{}", DEFAULT_MARKER, token, DEFAULT_MARKER)?
                }
            }
        }
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
