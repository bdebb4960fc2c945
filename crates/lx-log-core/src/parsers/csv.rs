//! Delimiter-separated values with a header inferred from the sample.

use indexmap::IndexMap;

use super::LineParser;
use crate::infer::{infer_value, parse_timestamp};
use crate::record::ValueKind;
use crate::types::{LogFormat, ParseStatus, ParsedFields};

/// Delimiters tried during inference, in tie-break order.
pub const DELIMITERS: [char; 4] = [',', '\t', ';', '|'];

/// CSV parser bound to one delimiter and one set of column names.
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: char,
    columns: Vec<String>,
    /// The header row, which is itself kept as an unparsed Record.
    header_line: Option<String>,
}

impl CsvParser {
    pub fn new(delimiter: char, columns: Vec<String>, header_line: Option<String>) -> Self {
        Self {
            delimiter,
            columns,
            header_line,
        }
    }

    /// Infer delimiter and header from sample lines.
    ///
    /// The delimiter is the one whose most common column count (at least
    /// two) covers the largest share of the sample. A delimiter that cuts a
    /// timestamp in any sample line is never chosen. The first line is a
    /// header when its cells are non-empty, unique and plain strings.
    pub fn infer(sample: &[&str]) -> Option<Self> {
        let (delimiter, width, _) = DELIMITERS
            .iter()
            .filter(|&&d| !sample.iter().any(|line| splits_timestamp(line, d)))
            .filter_map(|&d| {
                let (width, hits) = modal_width(sample, d)?;
                Some((d, width, hits))
            })
            // max_by_key keeps the last maximum; reverse so earlier delimiters win ties
            .rev()
            .max_by_key(|&(_, width, hits)| (hits, width))?;

        let first = sample.first()?;
        let cells = split_row(first, delimiter);
        let columns = if looks_like_header(&cells) {
            Some(cells)
        } else {
            None
        };

        Some(match columns {
            Some(columns) => Self::new(delimiter, columns, Some(first.to_string())),
            None => Self::new(delimiter, numbered_columns(width), None),
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl LineParser for CsvParser {
    fn format(&self) -> LogFormat {
        LogFormat::Csv
    }

    fn parse(&self, line: &str) -> ParsedFields {
        if self.header_line.as_deref() == Some(line) {
            return ParsedFields::unparsed();
        }
        let cells = split_row(line, self.delimiter);
        if cells.len() < 2 {
            return ParsedFields::unparsed();
        }

        let mut fields = IndexMap::new();
        for (i, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let name = self
                .columns
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("column_{}", i + 1));
            fields.insert(name, cell.clone());
        }

        let status = if cells.len() == self.columns.len() {
            ParseStatus::Matched
        } else {
            ParseStatus::Partial
        };
        ParsedFields::with_status(status, fields)
    }
}

/// Most common column count for `delimiter` and how many lines have it.
fn modal_width(sample: &[&str], delimiter: char) -> Option<(usize, usize)> {
    let mut counts: IndexMap<usize, usize> = IndexMap::new();
    for line in sample {
        let width = split_row(line, delimiter).len();
        if width >= 2 {
            *counts.entry(width).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(width, hits)| (hits, width))
}

/// True when `delimiter` cuts a timestamp in two, as the comma before the
/// milliseconds does in `2024-01-15 10:00:00,123 INFO started`.
fn splits_timestamp(line: &str, delimiter: char) -> bool {
    split_row(line, delimiter).windows(2).any(|pair| {
        let Some((token, rest)) = pair[1].split_once(char::is_whitespace) else {
            return false;
        };
        !rest.trim().is_empty()
            && parse_timestamp(&format!("{}{delimiter}{token}", pair[0])).is_some()
    })
}

fn looks_like_header(cells: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    cells.len() >= 2
        && cells.iter().all(|c| {
            !c.is_empty() && seen.insert(c.as_str()) && infer_value(c).kind() == ValueKind::String
        })
}

fn numbered_columns(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("column_{i}")).collect()
}

/// Split one row, honouring `"quoted, cells"` and `""` escapes. Unquoted
/// cells are trimmed; quoted cells keep their inner whitespace.
pub fn split_row(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
        } else if c == '"' && cell.trim().is_empty() && !quoted {
            cell.clear();
            quoted = true;
            in_quotes = true;
        } else if c == delimiter {
            cells.push(finish_cell(&mut cell, quoted));
            quoted = false;
        } else {
            cell.push(c);
        }
    }
    cells.push(finish_cell(&mut cell, quoted));
    cells
}

fn finish_cell(cell: &mut String, quoted: bool) -> String {
    let taken = std::mem::take(cell);
    if quoted {
        taken.trim_end().to_string()
    } else {
        taken.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_comma_with_header() {
        let sample = [
            "time,host,status,bytes",
            "2024-01-15 10:00:00,web1,200,512",
            "2024-01-15 10:05:00,web2,500,0",
        ];
        let parser = CsvParser::infer(&sample).unwrap();
        assert_eq!(parser.delimiter(), ',');
        assert_eq!(parser.columns(), ["time", "host", "status", "bytes"]);

        let parsed = parser.parse(sample[1]);
        assert!(parsed.is_match());
        assert_eq!(parsed.get("time"), Some("2024-01-15 10:00:00"));
        assert_eq!(parsed.get("status"), Some("200"));
    }

    #[test]
    fn header_line_is_unparsed() {
        let sample = ["a,b", "1,2"];
        let parser = CsvParser::infer(&sample).unwrap();
        assert!(!parser.parse("a,b").is_parsed());
    }

    #[test]
    fn headerless_columns_are_numbered() {
        let sample = ["1,web1,200", "2,web2,404"];
        let parser = CsvParser::infer(&sample).unwrap();
        assert_eq!(parser.columns(), ["column_1", "column_2", "column_3"]);
        let parsed = parser.parse("1,web1,200");
        assert_eq!(parsed.get("column_2"), Some("web1"));
    }

    #[test]
    fn infer_tab_and_pipe() {
        let tab = CsvParser::infer(&["a\tb\tc", "1\t2\t3"]).unwrap();
        assert_eq!(tab.delimiter(), '\t');
        let pipe = CsvParser::infer(&["a|b", "1|2", "3|4"]).unwrap();
        assert_eq!(pipe.delimiter(), '|');
    }

    #[test]
    fn most_consistent_delimiter_wins() {
        // commas appear in the message text, semicolons separate columns
        let sample = [
            "level;message;code",
            "info;started, waiting;1",
            "warn;slow, very slow, still slow;2",
        ];
        let parser = CsvParser::infer(&sample).unwrap();
        assert_eq!(parser.delimiter(), ';');
        let parsed = parser.parse(sample[2]);
        assert_eq!(parsed.get("message"), Some("slow, very slow, still slow"));
    }

    #[test]
    fn quoted_cells() {
        let cells = split_row(r#"1,"hello, world","say ""hi""", plain "#, ',');
        assert_eq!(cells, ["1", "hello, world", r#"say "hi""#, "plain"]);
    }

    #[test]
    fn wrong_width_row_is_partial() {
        let parser = CsvParser::new(',', vec!["a".into(), "b".into()], None);
        let parsed = parser.parse("1,2,3");
        assert_eq!(parsed.status, ParseStatus::Partial);
        assert_eq!(parsed.get("column_3"), Some("3"));
        assert!(!parser.parse("no delimiter here").is_parsed());
    }

    #[test]
    fn millisecond_comma_is_not_a_delimiter() {
        let sample = [
            "2024-01-15 10:00:00,123 INFO app.main: service started",
            "2024-01-15 10:00:01,456 WARNING app.db: slow query",
            "2024-01-15 10:00:02,789 ERROR app.api: request failed",
        ];
        assert!(CsvParser::infer(&sample).is_none());
        assert!(splits_timestamp(sample[0], ','));
    }

    #[test]
    fn timestamp_then_number_column_still_csv() {
        let sample = ["2024-01-15 10:00:00,123,web1", "2024-01-15 10:00:01,456,web2"];
        let parser = CsvParser::infer(&sample).unwrap();
        assert_eq!(parser.delimiter(), ',');
        assert_eq!(parser.columns().len(), 3);
        assert_eq!(parser.parse(sample[0]).get("column_2"), Some("123"));
    }

    #[test]
    fn no_delimiter_no_parser() {
        assert!(CsvParser::infer(&["just words", "more words"]).is_none());
        assert!(CsvParser::infer(&[]).is_none());
    }
}
