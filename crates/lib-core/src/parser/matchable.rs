use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use ahash::AHashSet;
use enum_dispatch::enum_dispatch;

use super::context::ParseContext;
use super::grammar::base::{Anything, Nothing, Ref};
use super::match_result::MatchResult;
use super::node_matcher::NodeMatcher;
use super::parsers::{MultiStringParser, RegexParser, StringParser, TypedParser};
use super::segments::base::ErasedSegment;
use crate::dialects::syntax::SyntaxSet;
use crate::errors::SQLParseError;

/// The cheap precondition for a matcher to succeed: the first code
/// segment must have one of `raws` as its upper-cased raw, or one of
/// `types` among its class types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleHint {
    raws: AHashSet<String>,
    types: SyntaxSet,
}

impl SimpleHint {
    #[track_caller]
    pub fn new(raws: AHashSet<String>, types: SyntaxSet) -> Self {
        assert!(
            !raws.is_empty() || !types.is_empty(),
            "A simple hint must name at least one raw or one type."
        );

        Self { raws, types }
    }

    pub fn from_raws<I>(raws: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(raws.into_iter().map(Into::into).collect(), SyntaxSet::EMPTY)
    }

    pub fn from_types(types: SyntaxSet) -> Self {
        Self::new(AHashSet::new(), types)
    }

    pub fn raws(&self) -> &AHashSet<String> {
        &self.raws
    }

    pub fn types(&self) -> &SyntaxSet {
        &self.types
    }

    /// Purely alphabetic raws and no types. Such terminators only count
    /// when preceded by whitespace.
    pub fn is_keyword(&self) -> bool {
        self.types.is_empty()
            && self
                .raws
                .iter()
                .all(|raw| !raw.is_empty() && raw.chars().all(char::is_alphabetic))
    }

    pub fn admits(&self, first_raw: &str, class_types: &SyntaxSet) -> bool {
        self.raws.contains(first_raw) || self.types.intersects(class_types)
    }
}

#[derive(Clone, Debug)]
pub struct Matchable {
    inner: Arc<MatchableTraitImpl>,
}

impl Deref for Matchable {
    type Target = MatchableTraitImpl;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Matchers are compared by identity, never structurally: two parsers
/// with the same template are still different matchers.
impl PartialEq for Matchable {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for Matchable {}

impl Matchable {
    pub fn new(matchable: MatchableTraitImpl) -> Self {
        Self {
            inner: Arc::new(matchable),
        }
    }

    pub fn as_string_parser(&self) -> Option<&StringParser> {
        match self.inner.as_ref() {
            MatchableTraitImpl::StringParser(parser) => Some(parser),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&RegexParser> {
        match self.inner.as_ref() {
            MatchableTraitImpl::RegexParser(parser) => Some(parser),
            _ => None,
        }
    }

    pub fn as_node_matcher(&mut self) -> Option<&mut NodeMatcher> {
        match Arc::make_mut(&mut self.inner) {
            MatchableTraitImpl::NodeMatcher(parser) => Some(parser),
            _ => None,
        }
    }
}

#[enum_dispatch(MatchableTrait)]
#[derive(Clone, Debug)]
pub enum MatchableTraitImpl {
    StringParser(StringParser),
    MultiStringParser(MultiStringParser),
    TypedParser(TypedParser),
    RegexParser(RegexParser),
    Ref(Ref),
    Anything(Anything),
    Nothing(Nothing),
    NodeMatcher(NodeMatcher),
}

#[enum_dispatch]
pub trait MatchableTrait {
    // Return whether this element is optional.
    fn is_optional(&self) -> bool {
        false
    }

    // Try to obtain a simple response from the matcher.
    // `None` means the matcher cannot be pruned and has to be tried in
    // full. The crumbs argument is used to detect recursion.
    fn simple(
        &self,
        _parse_context: &ParseContext,
        _crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        None
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError>;

    fn cache_key(&self) -> MatchableCacheKey;
}

pub type MatchableCacheKey = u32;

pub fn next_matchable_cache_key() -> MatchableCacheKey {
    static ID: AtomicU32 = AtomicU32::new(1);

    ID.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
        .expect("ran out of matchable cache keys")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::syntax::SyntaxKind;
    use crate::helpers::ToMatchable;

    #[test]
    fn matchables_compare_by_identity() {
        let a = StringParser::new("from", SyntaxKind::Keyword).to_matchable();
        let b = StringParser::new("from", SyntaxKind::Keyword).to_matchable();

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.as_string_parser().is_some());
        assert!(a.as_regex().is_none());
    }

    #[test]
    fn keyword_hints_are_purely_alphabetic() {
        assert!(SimpleHint::from_raws(["FROM"]).is_keyword());
        assert!(SimpleHint::from_raws(["FROM", "WHERE"]).is_keyword());
        assert!(!SimpleHint::from_raws([";"]).is_keyword());
        assert!(!SimpleHint::from_raws(["FROM", ";"]).is_keyword());
        assert!(!SimpleHint::from_types(SyntaxSet::single(SyntaxKind::Keyword)).is_keyword());
    }

    #[test]
    fn hints_admit_on_raw_or_type() {
        let hint = SimpleHint::new(
            AHashSet::from_iter(["SELECT".to_string()]),
            SyntaxSet::single(SyntaxKind::NumericLiteral),
        );

        assert!(hint.admits("SELECT", &SyntaxSet::single(SyntaxKind::Raw)));
        assert!(hint.admits("1", &SyntaxSet::single(SyntaxKind::NumericLiteral)));
        assert!(!hint.admits("FROM", &SyntaxSet::single(SyntaxKind::Raw)));
    }

    #[test]
    #[should_panic(expected = "at least one raw or one type")]
    fn empty_hints_are_rejected() {
        SimpleHint::new(AHashSet::new(), SyntaxSet::EMPTY);
    }
}
