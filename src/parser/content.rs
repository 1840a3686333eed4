//! Content rule loader.
//!
//! Line grammar (default delimiter `|`, separator `_`):
//!
//! ```text
//! <page>_<zone>_<part>|[<condition>|]<tag>|<value>[|]
//! tag := T | G | A:<array name>
//! ```

use super::lines::{source_lines, strip_trailing_delimiter, SourceLine};
use super::options::LoadOptions;
use crate::error::{Error, Result};
use crate::model::{Condition, ContentRecord, ContentRules, ContentType, Template};

/// Parse content rules from text.
///
/// An input with no rules is an error.
pub fn parse_content(input: &str, options: &LoadOptions) -> Result<ContentRules> {
    let records = source_lines(input)
        .map(|line| parse_content_line(line, options))
        .collect::<Result<Vec<_>>>()?;

    if records.is_empty() {
        return Err(Error::ContentFormat {
            line: 0,
            message: "content source contains no rules".to_string(),
        });
    }

    log::debug!("Loaded {} content rules", records.len());
    Ok(ContentRules::new(records))
}

/// Parse one content line.
pub fn parse_content_line(line: SourceLine<'_>, options: &LoadOptions) -> Result<ContentRecord> {
    let delimiter = options.delimiter;
    let format_error = |message: String| Error::ContentFormat {
        line: line.number,
        message,
    };

    let text = line.text.trim();
    let (index, payload) = text
        .split_once(delimiter)
        .ok_or_else(|| format_error(format!("missing '{}' after the index", delimiter)))?;

    let (page_key, zone_key, part_key) = split_index(index.trim(), options.index_separator)
        .ok_or_else(|| {
            format_error(format!(
                "index \"{}\" must be <page>{sep}<zone>{sep}<part> with no '{sep}' inside a component",
                index.trim(),
                sep = options.index_separator
            ))
        })?;

    let payload = strip_trailing_delimiter(payload, delimiter);
    let (first, rest) = payload
        .split_once(delimiter)
        .map(|(first, rest)| (first, Some(rest)))
        .unwrap_or((payload, None));

    let (condition_text, content_type, value) = match ContentType::parse_tag(first) {
        Some(content_type) => {
            let value = rest.ok_or_else(|| {
                format_error(format!("content type {} has no value", content_type))
            })?;
            (None, content_type, value)
        }
        None => {
            let rest = rest.ok_or_else(|| format_error("missing content type tag".to_string()))?;
            let (condition, content_type, value) = match split_conditional(payload, delimiter) {
                Some(found) => found,
                None => {
                    let tag = rest.split(delimiter).next().unwrap_or_default();
                    return Err(format_error(format!(
                        "unknown content type tag \"{}\" (expected T, G or A:<name>)",
                        tag.trim()
                    )));
                }
            };
            let value = value.ok_or_else(|| {
                format_error(format!("content type {} has no value", content_type))
            })?;
            let condition = condition.trim();
            let condition = if condition.is_empty() {
                None
            } else {
                Some(condition)
            };
            (condition, content_type, value)
        }
    };

    let condition = condition_text
        .map(|source| {
            Condition::parse_with(source, &options.placeholder_marker, options.index_separator)
                .map_err(|e| {
                    Error::ConditionSyntax(format!("line {}: \"{}\": {}", line.number, source, e))
                })
        })
        .transpose()?;

    let template = Template::parse_with(value, &options.placeholder_marker, options.index_separator)
        .map_err(format_error)?;

    Ok(ContentRecord {
        page_key: page_key.to_string(),
        zone_key: zone_key.to_string(),
        part_key: part_key.to_string(),
        condition_source: condition_text.map(str::to_string),
        condition,
        content_type,
        raw_value: value.to_string(),
        template,
        line: line.number,
    })
}

/// Split `<condition>|<tag>|<value>` at the first field that is a type tag.
///
/// Everything before that field is the condition, so it may contain the
/// delimiter (`||`).
fn split_conditional(
    payload: &str,
    delimiter: char,
) -> Option<(&str, ContentType, Option<&str>)> {
    payload.match_indices(delimiter).find_map(|(pos, _)| {
        let after = &payload[pos + delimiter.len_utf8()..];
        let (tag, value) = match after.split_once(delimiter) {
            Some((tag, value)) => (tag, Some(value)),
            None => (after, None),
        };
        ContentType::parse_tag(tag).map(|content_type| (&payload[..pos], content_type, value))
    })
}

/// Split `page_zone_part`; exactly two separators and three non-empty components.
fn split_index(index: &str, separator: char) -> Option<(&str, &str, &str)> {
    let mut components = index.split(separator);
    let page = components.next()?;
    let zone = components.next()?;
    let part = components.next()?;
    if components.next().is_some() || page.is_empty() || zone.is_empty() || part.is_empty() {
        return None;
    }
    Some((page, zone, part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaceholderRef;

    fn parse(input: &str) -> Result<ContentRules> {
        parse_content(input, &LoadOptions::default())
    }

    fn parse_one(text: &str) -> Result<ContentRecord> {
        parse_content_line(SourceLine { number: 1, text }, &LoadOptions::default())
    }

    #[test]
    fn test_parse_text_rule() {
        let record = parse_one("1_A_1|T|Hello %%1%%").unwrap();
        assert_eq!(
            (record.page_key.as_str(), record.zone_key.as_str(), record.part_key.as_str()),
            ("1", "A", "1")
        );
        assert_eq!(record.content_type, ContentType::Text);
        assert_eq!(record.raw_value, "Hello %%1%%");
        assert!(record.condition.is_none());
        assert_eq!(
            record.template.placeholders().next(),
            Some(&PlaceholderRef::Variable { key: 1 })
        );
    }

    #[test]
    fn test_parse_conditional_rule() {
        let record = parse_one("2_B_x|%%1_Balance%% > 0|T|Balance due|").unwrap();
        assert_eq!(record.condition_source.as_deref(), Some("%%1_Balance%% > 0"));
        assert!(record.condition.is_some());
        assert_eq!(record.raw_value, "Balance due");
        assert_eq!(record.part_key, "x");
    }

    #[test]
    fn test_parse_array_and_graphic_rules() {
        let record = parse_one("1_C_2|A:Items|%%Description%% %%UnitPrice%%|").unwrap();
        assert_eq!(record.content_type, ContentType::Array("Items".into()));
        assert_eq!(record.template.placeholder_count(), 2);

        let record = parse_one("1_A_1||G|logo.png|").unwrap();
        assert_eq!(record.content_type, ContentType::Graphic);
        assert!(record.condition.is_none());
        assert_eq!(record.raw_value, "logo.png");
    }

    #[test]
    fn test_condition_may_contain_delimiter() {
        let record = parse_one("1_A_1|%%1_X%% == 1 || %%1_Y%% == 2|T|hi|").unwrap();
        assert_eq!(
            record.condition_source.as_deref(),
            Some("%%1_X%% == 1 || %%1_Y%% == 2")
        );
        assert!(record.condition.is_some());
        assert_eq!(record.content_type, ContentType::Text);
        assert_eq!(record.raw_value, "hi");

        let record = parse_one("1_C_1|%%1_A%% = 'x' || %%1_B%% = 'y'|A:Items|%%Description%%").unwrap();
        assert_eq!(record.content_type, ContentType::Array("Items".into()));
        assert_eq!(record.raw_value, "%%Description%%");

        assert!(matches!(
            parse_one("1_A_1|%%1_X%% == 1 || %%1_Y%% == 2|T"),
            Err(Error::ContentFormat { .. })
        ));
    }

    #[test]
    fn test_value_keeps_inner_delimiters() {
        let record = parse_one("1_A_1|T|a|b|").unwrap();
        assert_eq!(record.raw_value, "a|b");
        let record = parse_one("1_A_1|T||").unwrap();
        assert_eq!(record.raw_value, "");
    }

    #[test]
    fn test_keys_preserved_verbatim() {
        let record = parse_one("01_Header_A2|T|x").unwrap();
        assert_eq!(record.page_key, "01");
        assert_eq!(record.address(), "01_Header_A2");
    }

    #[test]
    fn test_ambiguous_index_rejected() {
        assert!(matches!(parse_one("1_A_B_1|T|x"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1_A|T|x"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1__1|T|x"), Err(Error::ContentFormat { .. })));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(parse_one("1_A_1"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1_A_1|Hello"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1_A_1|T"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1_A_1|true|X|v"), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse_one("1_A_1|T|Hello %%1"), Err(Error::ContentFormat { .. })));
        assert!(matches!(
            parse_one("1_A_1|Country = US|T|v"),
            Err(Error::ConditionSyntax(_))
        ));
    }

    #[test]
    fn test_error_identifies_line() {
        let input = "1_A_1|T|ok\n\n1_A_1|Q|bad\n";
        match parse(input) {
            Err(Error::ContentFormat { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected content format error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse(""), Err(Error::ContentFormat { .. })));
        assert!(matches!(parse("\n\n"), Err(Error::ContentFormat { .. })));
    }

    #[test]
    fn test_source_order_preserved() {
        let rules = parse("1_A_1|T|first\n1_A_2|T|other\n1_A_1|T|second\n").unwrap();
        let values: Vec<&str> = rules
            .for_address("1", "A", "1")
            .map(|r| r.raw_value.as_str())
            .collect();
        assert_eq!(values, vec!["first", "second"]);
        assert_eq!(rules.records[2].line, 3);
    }
}
