use std::sync::OnceLock;

use super::matchable::{MatchableCacheKey, MatchableTrait, SimpleHint, next_matchable_cache_key};
use crate::dialects::Dialect;
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;
use crate::parser::context::ParseContext;
use crate::parser::match_result::{MatchResult, Matched};
use crate::parser::matchable::Matchable;
use crate::parser::segments::ErasedSegment;

/// Wraps whatever its grammar matches in a node of `node_kind`.
///
/// The grammar is built from the dialect on first use, so grammars can
/// refer to each other by name regardless of registration order.
#[derive(Clone)]
pub struct NodeMatcher {
    node_kind: SyntaxKind,
    match_grammar: OnceLock<Matchable>,
    factory: fn(&Dialect) -> Matchable,
    cache_key: MatchableCacheKey,
}

impl NodeMatcher {
    pub fn new(node_kind: SyntaxKind, build_grammar: fn(&Dialect) -> Matchable) -> Self {
        Self {
            node_kind,
            match_grammar: OnceLock::new(),
            factory: build_grammar,
            cache_key: next_matchable_cache_key(),
        }
    }

    pub fn node_kind(&self) -> SyntaxKind {
        self.node_kind
    }

    pub fn match_grammar(&self, dialect: &Dialect) -> Matchable {
        self.match_grammar
            .get_or_init(|| (self.factory)(dialect))
            .clone()
    }

    pub fn replace(&mut self, match_grammar: Matchable) {
        self.match_grammar = OnceLock::new();
        let _ = self.match_grammar.set(match_grammar);
    }
}

impl std::fmt::Debug for NodeMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMatcher")
            .field("node_kind", &self.node_kind)
            .field("match_grammar", &"...")
            .finish()
    }
}

impl MatchableTrait for NodeMatcher {
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        self.match_grammar(parse_context.dialect())
            .simple(parse_context, crumbs)
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        if idx >= segments.len() as u32 {
            return Ok(MatchResult::empty_at(idx));
        }

        if segments[idx as usize].get_type() == self.node_kind {
            return Ok(MatchResult::from_span(idx, idx + 1));
        }

        let grammar = self.match_grammar(parse_context.dialect());
        let match_result = parse_context
            .deeper_match(false, &[], |ctx| grammar.match_segments(segments, idx, ctx))?;

        Ok(match_result.wrap(Matched::SyntaxKind(self.node_kind)))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dialects::init::DialectKind;
    use crate::helpers::ToMatchable;
    use crate::parser::Parser;
    use crate::parser::grammar::base::Ref;
    use crate::parser::match_result::Span;
    use crate::parser::parsers::StringParser;
    use crate::parser::segments::Tables;
    use crate::parser::segments::test_functions::{fresh_ansi_dialect, generate_test_segments_func};

    #[test]
    fn node_matcher_wraps_its_grammar() {
        let dialect = fresh_ansi_dialect();
        let parser = Parser::from(&dialect);
        let mut ctx = ParseContext::from(&parser);
        let segments = generate_test_segments_func(vec!["select", " ", "1", ";", "foo"]);

        let statement = dialect.r#ref("StatementSegment");
        assert_eq!(statement.simple(&ctx, None), None);

        let result = statement.match_segments(&segments, 0, &mut ctx).unwrap();
        assert_eq!(result.span, Span { start: 0, end: 3 });
        assert_eq!(result.matched, Some(Matched::SyntaxKind(SyntaxKind::Statement)));

        let tables = Tables::default();
        let applied = result.apply(&tables, DialectKind::Ansi, &segments);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].get_type(), SyntaxKind::Statement);
        assert_eq!(applied[0].raw(), "select 1");

        // An existing node of the same kind is taken as it is.
        assert_eq!(
            statement.match_segments(&applied, 0, &mut ctx).unwrap(),
            MatchResult::from_span(0, 1)
        );
    }

    #[test]
    fn node_matcher_grammar_can_be_replaced() {
        let dialect = fresh_ansi_dialect();
        let parser = Parser::from(&dialect);
        let mut ctx = ParseContext::from(&parser);
        let segments = generate_test_segments_func(vec!["from", " ", "foo"]);

        let mut matchable = NodeMatcher::new(SyntaxKind::FromClause, |_| {
            StringParser::new("where", SyntaxKind::Keyword).to_matchable()
        })
        .to_matchable();
        assert!(!matchable.match_segments(&segments, 0, &mut ctx).unwrap().has_match());

        matchable
            .as_node_matcher()
            .unwrap()
            .replace(Ref::keyword("from").to_matchable());

        assert_eq!(
            matchable.simple(&ctx, None).map(|hint| hint.raws().len()),
            Some(1)
        );
        let result = matchable.match_segments(&segments, 0, &mut ctx).unwrap();
        assert_eq!(result.span, Span { start: 0, end: 1 });
        assert_eq!(result.matched, Some(Matched::SyntaxKind(SyntaxKind::FromClause)));
    }
}
