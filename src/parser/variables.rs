//! Variable table loader.
//!
//! Each line is `<integer>|<value>|`. The value lies between the first and
//! last delimiter so it may itself contain the delimiter or be empty.

use super::lines::{source_lines, split_first_last};
use super::options::{DuplicateKeyPolicy, LoadOptions};
use crate::error::{Error, Result};
use crate::model::VariableTable;

/// Parse a variable table from text. Empty input yields an empty table.
pub fn parse_variables(input: &str, options: &LoadOptions) -> Result<VariableTable> {
    let delimiter = options.delimiter;
    let mut table = VariableTable::new();

    for line in source_lines(input) {
        let text = line.text.trim();
        let text = text.strip_prefix(delimiter).unwrap_or(text);

        let (key_text, value, trailing) =
            split_first_last(text, delimiter).ok_or_else(|| Error::VariableFormat {
                line: line.number,
                message: format!("missing '{}' after the key", delimiter),
            })?;

        let key_text = key_text.trim();
        let key: i64 = key_text.parse().map_err(|_| Error::VariableFormat {
            line: line.number,
            message: format!("key \"{}\" is not an integer", key_text),
        })?;

        if !trailing.trim().is_empty() {
            log::warn!(
                "Variable line {}: ignoring \"{}\" after the closing delimiter",
                line.number,
                trailing
            );
        }

        if let Some(previous) = table.insert(key, value) {
            match options.duplicate_keys {
                DuplicateKeyPolicy::LastWins => {
                    log::warn!(
                        "Variable line {}: key {} redefined (was \"{}\")",
                        line.number,
                        key,
                        previous
                    );
                }
                DuplicateKeyPolicy::Reject => {
                    return Err(Error::VariableFormat {
                        line: line.number,
                        message: format!("duplicate key {}", key),
                    });
                }
            }
        }
    }

    log::debug!("Loaded {} variables", table.len());
    Ok(table)
}
