use std::ops::Range;

use fancy_regex::Regex;
use thiserror::Error;

use crate::helpers::Config;
use crate::parser::segments::base::ErasedSegment;

#[derive(Debug, PartialEq, Clone, Default, Error)]
#[error("{description}")]
pub struct SQLBaseError {
    pub line_no: usize,
    pub line_pos: usize,
    pub description: String,
    pub source_slice: Range<usize>,
}

impl SQLBaseError {
    pub fn desc(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A closing bracket whose type differs from the innermost open one.
    MismatchedBracket,
    /// An opening bracket that is never closed.
    UnterminatedBracket,
    /// Nesting went past `ParserConfig::max_depth`.
    RecursionLimit,
}

#[derive(Debug, Error)]
#[error("{description}")]
pub struct SQLParseError {
    pub description: String,
    pub segment: Option<ErasedSegment>,
    pub kind: ParseErrorKind,
}

impl SQLParseError {
    pub fn mismatched_bracket(description: impl Into<String>, segment: ErasedSegment) -> Self {
        Self {
            description: description.into(),
            segment: Some(segment),
            kind: ParseErrorKind::MismatchedBracket,
        }
    }

    pub fn unterminated_bracket(description: impl Into<String>, segment: ErasedSegment) -> Self {
        Self {
            description: description.into(),
            segment: Some(segment),
            kind: ParseErrorKind::UnterminatedBracket,
        }
    }

    pub fn recursion_limit(max_depth: usize) -> Self {
        Self {
            description: format!("Maximum parse depth of {max_depth} exceeded."),
            segment: None,
            kind: ParseErrorKind::RecursionLimit,
        }
    }

    /// Fatal errors must reach the user as-is. Everything else is a
    /// structural problem in the input which the root parser turns into
    /// an unparsable region.
    pub fn is_fatal(&self) -> bool {
        self.kind == ParseErrorKind::RecursionLimit
    }

    pub fn matches(&self, regexp: &str) -> bool {
        let value = &self.description;
        let regex = Regex::new(regexp).expect("Invalid regex pattern");

        if let Ok(true) = regex.is_match(value) {
            true
        } else {
            let msg = format!("Regex pattern did not match.\nRegex: {regexp:?}\nInput: {value:?}");

            if regexp == value {
                panic!("{msg}\nDid you mean to escape the regex?");
            } else {
                panic!("{}", msg);
            }
        }
    }
}

impl From<SQLParseError> for SQLBaseError {
    fn from(value: SQLParseError) -> Self {
        let pos_marker = value
            .segment
            .as_ref()
            .and_then(|segment| segment.get_position_marker());

        let (line_no, line_pos, source_slice) = match pos_marker {
            Some(pos_marker) => {
                let (line_no, line_pos) = pos_marker.source_position();
                (line_no, line_pos, pos_marker.source_slice.clone())
            }
            None => (0, 0, 0..0),
        };

        Self::default().config(|this| {
            this.line_no = line_no;
            this.line_pos = line_pos;
            this.source_slice = source_slice;
            this.description = value.description;
        })
    }
}
