//! Fallback for files no structured format claims: raw text only.

use super::LineParser;
use crate::types::{LogFormat, ParsedFields};

pub struct UnstructuredParser;

impl LineParser for UnstructuredParser {
    fn format(&self) -> LogFormat {
        LogFormat::Unstructured
    }

    fn parse(&self, _line: &str) -> ParsedFields {
        ParsedFields::unparsed()
    }
}
