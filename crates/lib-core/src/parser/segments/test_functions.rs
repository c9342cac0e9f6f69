use std::ops::Range;

use super::base::{ErasedSegment, SegmentBuilder, Tables};
use crate::dialects::base::Dialect;
use crate::dialects::init::DialectKind;
use crate::dialects::kind_to_dialect;
use crate::dialects::syntax::SyntaxKind;
use crate::parser::markers::PositionMarker;
use crate::parser::source::SourceFile;

pub fn fresh_ansi_dialect() -> Dialect {
    kind_to_dialect(DialectKind::Ansi)
}

pub fn bracket_segments() -> Vec<ErasedSegment> {
    generate_test_segments_func(vec![
        "bar", " \t ", "(", "foo", "    ", ")", "baar", " \t ", "foo",
    ])
}

/// Roughly generate test segments.
///
/// Every element becomes one positioned raw segment over the
/// concatenation of all elements. `<indent>` and `<dedent>` become
/// zero-width meta segments.
pub fn generate_test_segments_func(elems: Vec<&str>) -> Vec<ErasedSegment> {
    let source_file: SourceFile = elems.concat().into();
    let tables = Tables::default();
    let mut idx = 0;
    let mut buff: Vec<ErasedSegment> = Vec::new();

    for elem in elems {
        let position_marker = PositionMarker::new(idx..idx + elem.len(), source_file.clone(), None);

        let kind = match elem {
            "<indent>" | "<dedent>" => {
                let kind = if elem == "<indent>" {
                    SyntaxKind::Indent
                } else {
                    SyntaxKind::Dedent
                };
                let point = PositionMarker::from_point(idx, source_file.clone(), None);
                buff.push(
                    SegmentBuilder::token(tables.next_id(), "", kind)
                        .with_position(point)
                        .finish(),
                );
                continue;
            }
            "(" => SyntaxKind::StartBracket,
            ")" => SyntaxKind::EndBracket,
            "[" => SyntaxKind::StartSquareBracket,
            "]" => SyntaxKind::EndSquareBracket,
            "{" => SyntaxKind::StartCurlyBracket,
            "}" => SyntaxKind::EndCurlyBracket,
            _ if elem.chars().all(|c| c == ' ' || c == '\t') => SyntaxKind::Whitespace,
            _ if elem.chars().all(|c| c == '\n') => SyntaxKind::Newline,
            _ if elem.starts_with("--") => SyntaxKind::InlineComment,
            _ if elem.starts_with("/*") => SyntaxKind::BlockComment,
            _ if elem.starts_with('"') => SyntaxKind::DoubleQuote,
            _ if elem.starts_with('\'') => SyntaxKind::SingleQuote,
            _ if elem.chars().all(|c| c.is_ascii_digit()) => SyntaxKind::NumericLiteral,
            _ => SyntaxKind::Raw,
        };

        buff.push(
            SegmentBuilder::token(tables.next_id(), elem, kind)
                .with_position(position_marker)
                .finish(),
        );
        idx += elem.len();
    }

    buff
}

/// Construct a list of raw segments as a fixture.
pub fn raw_segments() -> Vec<ErasedSegment> {
    generate_test_segments_func(["foobar", ".barfoo"].to_vec())
}

pub fn raw_seg() -> ErasedSegment {
    raw_segments()[0].clone()
}

pub fn test_segments() -> Vec<ErasedSegment> {
    generate_test_segments_func(vec!["bar", " \t ", "foo", "baar", " \t "])
}

/// Expected output of applying a match over `result_slice`, with every
/// segment whose raw is in `matcher_keywords` re-tagged as a keyword.
pub fn make_result_tuple(
    result_slice: Option<Range<usize>>,
    matcher_keywords: &[&str],
    test_segments: &[ErasedSegment],
) -> Vec<ErasedSegment> {
    match result_slice {
        None => vec![],
        Some(slice) => test_segments[slice]
            .iter()
            .map(|elem| {
                let raw = elem.raw();
                if matcher_keywords.contains(&raw.as_str()) {
                    SegmentBuilder::keyword(elem.id(), raw)
                        .with_position(elem.get_position_marker().unwrap().clone())
                        .finish()
                } else {
                    elem.clone()
                }
            })
            .collect(),
    }
}
