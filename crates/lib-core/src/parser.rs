pub mod context;
pub mod grammar;
pub mod markers;
pub mod match_algorithms;
pub mod match_result;
pub mod matchable;
pub mod node_matcher;
pub mod parsers;
pub mod segments;
pub mod source;

use crate::dialects::Dialect;
use crate::dialects::init::DialectKind;
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;
use context::ParseContext;
use matchable::MatchableTrait;
use segments::{ErasedSegment, SegmentBuilder, Tables};

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Deepest nesting of matchers before parsing gives up.
    pub max_depth: usize,
    /// Bracket set used when looking ahead for terminators.
    pub bracket_pairs_set: &'static str,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 255,
            bracket_pairs_set: "bracket_pairs",
        }
    }
}

#[derive(Clone)]
pub struct Parser<'a> {
    dialect: &'a Dialect,
    config: ParserConfig,
}

impl<'a> From<&'a Dialect> for Parser<'a> {
    fn from(value: &'a Dialect) -> Self {
        Self {
            dialect: value,
            config: ParserConfig::default(),
        }
    }
}

impl<'a> Parser<'a> {
    pub fn new(dialect: &'a Dialect, config: ParserConfig) -> Self {
        Self { dialect, config }
    }

    pub fn dialect(&self) -> &Dialect {
        self.dialect
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse lexed `segments` into a single `file` node.
    ///
    /// Whatever the dialect's `FileSegment` leaves unclaimed ends up in an
    /// `unparsable` node, and so does the whole content when brackets do not
    /// balance. Only running out of depth is an error.
    pub fn parse(
        &self,
        tables: &Tables,
        segments: &[ErasedSegment],
    ) -> Result<Option<ErasedSegment>, SQLParseError> {
        if segments.is_empty() {
            // Lexers always produce at least an end of file marker, so this
            // only happens when driving the parser directly.
            return Ok(None);
        }

        let mut parse_cx: ParseContext = self.into();
        let root = root_parse(tables, self.dialect.name(), segments, &mut parse_cx)?;

        #[cfg(debug_assertions)]
        {
            // Nothing may be dropped or duplicated along the way.
            let join_segments_raw = |segments: &[ErasedSegment]| {
                smol_str::SmolStr::from_iter(segments.iter().map(|s| s.raw().as_str()))
            };

            pretty_assertions::assert_eq!(&join_segments_raw(segments), root.raw());
        }

        Ok(root.into())
    }
}

fn file_of(tables: &Tables, dialect: DialectKind, segments: Vec<ErasedSegment>) -> ErasedSegment {
    SegmentBuilder::node(tables.next_id(), SyntaxKind::File, dialect, segments)
        .position_from_segments()
        .finish()
}

fn unparsable_of(
    tables: &Tables,
    dialect: DialectKind,
    segments: &[ErasedSegment],
) -> ErasedSegment {
    SegmentBuilder::node(
        tables.next_id(),
        SyntaxKind::Unparsable,
        dialect,
        segments.to_vec(),
    )
    .position_from_segments()
    .finish()
}

fn root_parse(
    tables: &Tables,
    dialect: DialectKind,
    segments: &[ErasedSegment],
    parse_context: &mut ParseContext,
) -> Result<ErasedSegment, SQLParseError> {
    let start_idx = segments
        .iter()
        .position(|segment| segment.is_code())
        .unwrap_or(0) as u32;

    let end_idx = segments
        .iter()
        .rposition(|segment| segment.is_code())
        .map_or(start_idx, |idx| idx as u32 + 1);

    if start_idx == end_idx {
        return Ok(file_of(tables, dialect, segments.to_vec()));
    }

    let code = &segments[start_idx as usize..end_idx as usize];
    let file_segment = parse_context.dialect().r#ref("FileSegment");

    let match_result = match file_segment.match_segments(
        &segments[..end_idx as usize],
        start_idx,
        parse_context,
    ) {
        Ok(match_result) => match_result,
        Err(error) if !error.is_fatal() => {
            log::debug!("Marking the file as unparsable: {}", error.description);
            let unparsable = [unparsable_of(tables, dialect, code)];

            return Ok(file_of(
                tables,
                dialect,
                [
                    &segments[..start_idx as usize],
                    unparsable.as_slice(),
                    &segments[end_idx as usize..],
                ]
                .concat(),
            ));
        }
        Err(error) => return Err(error),
    };

    let match_span = match_result.span;
    let mut content = if match_result.has_match() {
        match_result.apply(tables, dialect, segments)
    } else {
        Vec::new()
    };

    let unmatched_start = if match_result.has_match() {
        match_span.end
    } else {
        start_idx
    };
    let unmatched = &segments[unmatched_start as usize..end_idx as usize];

    if !unmatched.is_empty() {
        let idx = unmatched
            .iter()
            .position(|it| it.is_code())
            .unwrap_or(unmatched.len());
        let (head, tail) = unmatched.split_at(idx);

        content.extend_from_slice(head);
        if !tail.is_empty() {
            log::debug!(
                "Found unparsable section starting at {:?}",
                tail[0].get_start_loc()
            );
            content.push(unparsable_of(tables, dialect, tail));
        }
    }

    Ok(file_of(
        tables,
        dialect,
        [
            &segments[..start_idx as usize],
            content.as_slice(),
            &segments[end_idx as usize..],
        ]
        .concat(),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dialects::kind_to_dialect;
    use crate::errors::ParseErrorKind;
    use crate::helpers::{Config, ToMatchable};
    use crate::parser::grammar::base::{Nothing, Ref};
    use crate::parser::segments::base::serde::TupleSerialisedSegment;
    use crate::parser::segments::test_functions::{
        fresh_ansi_dialect, generate_test_segments_func,
    };

    /// A dialect whose files hold one statement, up to a semicolon.
    fn statement_dialect(kind: DialectKind) -> Dialect {
        let mut dialect = kind_to_dialect(kind);
        dialect.add([(
            "FileSegment".into(),
            Ref::new("StatementSegment").to_matchable(),
        )]);
        dialect
    }

    fn parse_elems(dialect: &Dialect, elems: Vec<&str>) -> ErasedSegment {
        let tables = Tables::default();
        let segments = generate_test_segments_func(elems);

        Parser::from(dialect)
            .parse(&tables, &segments)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test__parser__parse_empty() {
        let dialect = fresh_ansi_dialect();
        let tables = Tables::default();

        assert_eq!(Parser::from(&dialect).parse(&tables, &[]).unwrap(), None);
    }

    #[test]
    fn test__parser__parse_only_non_code() {
        let dialect = fresh_ansi_dialect();
        let file = parse_elems(&dialect, vec![" ", "\n", "--comment"]);

        assert_eq!(file.get_type(), SyntaxKind::File);
        assert_eq!(file.segments().len(), 3);
        assert_eq!(file.raw(), " \n--comment");
    }

    #[test]
    fn test__parser__parse_file_holds_one_statement() {
        let dialect = fresh_ansi_dialect();
        let file = parse_elems(&dialect, vec![" ", "select", " ", "1", ";", " ", "2", "\n"]);
        let kinds = file.segments().iter().map(|it| it.get_type()).collect::<Vec<_>>();

        assert_eq!(file.get_type(), SyntaxKind::File);
        assert_eq!(
            kinds,
            [SyntaxKind::Whitespace, SyntaxKind::Statement, SyntaxKind::Newline]
        );
        assert_eq!(file.segments()[1].raw(), "select 1; 2");
        assert!(!file.descendant_type_set().contains(SyntaxKind::Unparsable));
    }

    #[test]
    fn test__parser__parse_brackets() {
        let dialect = statement_dialect(DialectKind::Ansi);
        let file = parse_elems(&dialect, vec!["\n", "select", " ", "(", "1", ")", " "]);

        assert_eq!(
            file.to_serialised(true, true),
            TupleSerialisedSegment::nested(
                "file",
                vec![TupleSerialisedSegment::nested(
                    "statement",
                    vec![
                        TupleSerialisedSegment::single("raw", "select"),
                        TupleSerialisedSegment::nested(
                            "bracketed",
                            vec![
                                TupleSerialisedSegment::single("start_bracket", "("),
                                TupleSerialisedSegment::single("numeric_literal", "1"),
                                TupleSerialisedSegment::single("end_bracket", ")"),
                            ]
                        ),
                    ]
                )]
            )
        );
        assert_eq!(file.raw(), "\nselect (1) ");
    }

    #[test]
    fn test__parser__parse_unbalanced_brackets_is_unparsable() {
        let dialect = statement_dialect(DialectKind::Ansi);
        let file = parse_elems(&dialect, vec![" ", "select", " ", "(", "1", ";", "\n"]);

        let kinds = file.segments().iter().map(|it| it.get_type()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [SyntaxKind::Whitespace, SyntaxKind::Unparsable, SyntaxKind::Newline]
        );
        assert_eq!(file.segments()[1].raw(), "select (1;");
    }

    #[test]
    fn test__parser__parse_unmatched_tail_is_unparsable() {
        let dialect = statement_dialect(DialectKind::Ansi);
        let file = parse_elems(&dialect, vec!["select", " ", "1", " ", ";", "foo", " "]);
        let kinds = file.segments().iter().map(|it| it.get_type()).collect::<Vec<_>>();

        assert_eq!(
            kinds,
            [
                SyntaxKind::Statement,
                SyntaxKind::Whitespace,
                SyntaxKind::Unparsable,
                SyntaxKind::Whitespace
            ]
        );
        assert_eq!(file.segments()[2].raw(), ";foo");
    }

    #[test]
    fn test__parser__parse_no_match_is_unparsable() {
        let mut dialect = fresh_ansi_dialect();
        dialect.add([("FileSegment".into(), Nothing::new().to_matchable())]);

        let file = parse_elems(&dialect, vec!["select", " ", "1"]);

        assert_eq!(file.segments().len(), 1);
        assert_eq!(file.segments()[0].get_type(), SyntaxKind::Unparsable);
        assert_eq!(file.segments()[0].raw(), "select 1");
    }

    #[test]
    fn test__parser__parse_angle_brackets_with_config() {
        let dialect = statement_dialect(DialectKind::Bigquery);
        let tables = Tables::default();
        let segments = generate_test_segments_func(vec!["array", "<", "int64", ">"]);
        let config =
            ParserConfig::default().config(|this| this.bracket_pairs_set = "angle_bracket_pairs");

        let file = Parser::new(&dialect, config)
            .parse(&tables, &segments)
            .unwrap()
            .unwrap();
        let statement = &file.segments()[0];

        // Angle brackets are resolved but leave no node of their own.
        assert_eq!(
            statement
                .segments()
                .iter()
                .map(|it| it.get_type())
                .collect::<Vec<_>>(),
            [
                SyntaxKind::Raw,
                SyntaxKind::StartAngleBracket,
                SyntaxKind::Indent,
                SyntaxKind::Raw,
                SyntaxKind::Dedent,
                SyntaxKind::EndAngleBracket,
            ]
        );
    }

    #[test]
    fn test__parser__parse_recursion_limit_is_fatal() {
        let dialect = fresh_ansi_dialect();
        let tables = Tables::default();
        let segments = generate_test_segments_func(vec!["select", " ", "1"]);
        let config = ParserConfig::default().config(|this| this.max_depth = 0);

        let error = Parser::new(&dialect, config)
            .parse(&tables, &segments)
            .unwrap_err();

        assert_eq!(error.kind, ParseErrorKind::RecursionLimit);
    }
}
