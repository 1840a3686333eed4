//! Content rules: addressed, conditional, typed value templates.

use super::condition::Condition;
use super::template::Template;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a content value is placed and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "array", rename_all = "snake_case")]
pub enum ContentType {
    /// `T`: text
    Text,
    /// `G`: graphic (the value names the graphic)
    Graphic,
    /// `A:<name>`: one block per row of the named customer array
    Array(String),
}

impl ContentType {
    /// Parse a type tag (`T`, `G`, `A:<name>`).
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "T" => Some(ContentType::Text),
            "G" => Some(ContentType::Graphic),
            other => {
                let name = other.strip_prefix("A:")?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some(ContentType::Array(name.to_string()))
                }
            }
        }
    }

    /// Name of the fanned-out array, for `A:<name>` content.
    pub fn array_name(&self) -> Option<&str> {
        match self {
            ContentType::Array(name) => Some(name),
            _ => None,
        }
    }

    /// Check if this is fan-out content.
    pub fn is_array(&self) -> bool {
        matches!(self, ContentType::Array(_))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Text => f.write_str("T"),
            ContentType::Graphic => f.write_str("G"),
            ContentType::Array(name) => write!(f, "A:{}", name),
        }
    }
}

/// One content rule.
///
/// Address keys are kept verbatim; `"01"` and `"1"` are different pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    /// Page component of the address
    pub page_key: String,
    /// Zone component of the address
    pub zone_key: String,
    /// Part component of the address
    pub part_key: String,
    /// Raw condition text, if any
    pub condition_source: Option<String>,
    /// Parsed condition
    pub condition: Option<Condition>,
    /// Content type
    pub content_type: ContentType,
    /// Value body as written
    pub raw_value: String,
    /// Pre-parsed value body
    pub template: Template,
    /// 1-indexed source line
    pub line: usize,
}

impl ContentRecord {
    /// The `page_zone_part` address as written.
    pub fn address(&self) -> String {
        format!("{}_{}_{}", self.page_key, self.zone_key, self.part_key)
    }

    /// Check if the rule is conditional.
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// All content rules of a run, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentRules {
    /// Rules in source order
    pub records: Vec<ContentRecord>,
}

impl ContentRules {
    /// Create a rule set.
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self { records }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over rules in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, ContentRecord> {
        self.records.iter()
    }

    /// Rules addressing the given part, in source order.
    pub fn for_address<'a>(
        &'a self,
        page_key: &'a str,
        zone_key: &'a str,
        part_key: &'a str,
    ) -> impl Iterator<Item = &'a ContentRecord> + 'a {
        self.records.iter().filter(move |r| {
            r.page_key == page_key && r.zone_key == zone_key && r.part_key == part_key
        })
    }

    /// Names of every array referenced by fan-out rules.
    pub fn array_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .records
            .iter()
            .filter_map(|r| r.content_type.array_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl<'a> IntoIterator for &'a ContentRules {
    type Item = &'a ContentRecord;
    type IntoIter = std::slice::Iter<'a, ContentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
