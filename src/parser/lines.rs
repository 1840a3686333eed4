//! Shared utilities for the line-oriented sources.

/// A non-blank source line with its 1-indexed line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-indexed line number
    pub number: usize,
    /// Line text without the line terminator
    pub text: &'a str,
}

/// Iterate over non-blank lines, keeping original line numbers.
///
/// Handles `\n` and `\r\n` terminators and a leading UTF-8 BOM.
pub fn source_lines(input: &str) -> impl Iterator<Item = SourceLine<'_>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    input
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| SourceLine { number: i + 1, text })
}

/// Split on the first and last occurrence of `delimiter`.
///
/// Returns `(before_first, between, after_last)`. With a single delimiter,
/// `between` is everything after it and `after_last` is empty.
pub fn split_first_last(text: &str, delimiter: char) -> Option<(&str, &str, &str)> {
    let first = text.find(delimiter)?;
    let last = text.rfind(delimiter)?;
    let width = delimiter.len_utf8();
    if first == last {
        Some((&text[..first], &text[first + width..], ""))
    } else {
        Some((&text[..first], &text[first + width..last], &text[last + width..]))
    }
}

/// Remove one trailing occurrence of `delimiter` (ignoring trailing whitespace).
pub fn strip_trailing_delimiter(text: &str, delimiter: char) -> &str {
    let trimmed = text.trim_end();
    trimmed.strip_suffix(delimiter).unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_lines_skip_blanks() {
        let input = "\u{feff}first\r\n\r\n  \nsecond\n";
        let lines: Vec<SourceLine> = source_lines(input).collect();
        assert_eq!(
            lines,
            vec![
                SourceLine { number: 1, text: "first" },
                SourceLine { number: 4, text: "second" },
            ]
        );
    }

    #[test]
    fn test_split_first_last() {
        assert_eq!(split_first_last("7|a|b|", '|'), Some(("7", "a|b", "")));
        assert_eq!(split_first_last("7||", '|'), Some(("7", "", "")));
        assert_eq!(split_first_last("7|tail", '|'), Some(("7", "tail", "")));
        assert_eq!(split_first_last("7|v|x", '|'), Some(("7", "v", "x")));
        assert_eq!(split_first_last("no delimiter", '|'), None);
    }

    #[test]
    fn test_strip_trailing_delimiter() {
        assert_eq!(strip_trailing_delimiter("T|Hello|", '|'), "T|Hello");
        assert_eq!(strip_trailing_delimiter("T|Hello|| ", '|'), "T|Hello|");
        assert_eq!(strip_trailing_delimiter("T|Hello", '|'), "T|Hello");
    }
}
