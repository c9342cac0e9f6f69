use std::borrow::Cow;
use std::sync::OnceLock;

use crate::dialects::base::Dialect;
use crate::errors::SQLParseError;
#[cfg(debug_assertions)]
use crate::helpers::enter_match_frame;
use crate::helpers::{ToMatchable, capitalize};
use crate::parser::context::ParseContext;
use crate::parser::match_algorithms::greedy_match;
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{
    Matchable, MatchableCacheKey, MatchableTrait, SimpleHint, next_matchable_cache_key,
};
use crate::parser::segments::base::ErasedSegment;

/// A named reference to a matchable in the dialect library, resolved
/// when it is used.
#[derive(Clone)]
pub struct Ref {
    pub(crate) reference: Cow<'static, str>,
    pub exclude: Option<Matchable>,
    terminators: Vec<Matchable>,
    reset_terminators: bool,
    pub(crate) optional: bool,
    cache_key: MatchableCacheKey,
    simple_cache: OnceLock<Option<SimpleHint>>,
}

impl std::fmt::Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Ref: {}{}>",
            self.reference,
            if self.is_optional() { " [opt]" } else { "" }
        )
    }
}

impl Ref {
    pub fn new(reference: impl Into<Cow<'static, str>>) -> Self {
        Ref {
            reference: reference.into(),
            exclude: None,
            terminators: Vec::new(),
            reset_terminators: false,
            optional: false,
            cache_key: next_matchable_cache_key(),
            simple_cache: OnceLock::new(),
        }
    }

    pub fn exclude(mut self, exclude: impl ToMatchable) -> Self {
        self.exclude = exclude.to_matchable().into();
        self
    }

    pub fn terminators(mut self, terminators: Vec<Matchable>) -> Self {
        self.terminators = terminators;
        self
    }

    pub fn reset_terminators(mut self) -> Self {
        self.reset_terminators = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    fn get_elem(&self, dialect: &Dialect) -> Matchable {
        dialect.r#ref(&self.reference)
    }

    /// `Ref::keyword("from")` refers to `FromKeywordSegment`.
    pub fn keyword(keyword: &str) -> Self {
        Ref::new(capitalize(keyword) + "KeywordSegment")
    }
}

impl MatchableTrait for Ref {
    fn is_optional(&self) -> bool {
        self.optional
    }

    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        self.simple_cache
            .get_or_init(|| {
                if let Some(ref c) = crumbs
                    && c.contains(&&*self.reference)
                {
                    let loop_string = c.join(" -> ");
                    panic!("Self referential grammar detected: {loop_string}");
                }

                let mut new_crumbs = crumbs.unwrap_or_default();
                new_crumbs.push(&self.reference);

                self.get_elem(parse_context.dialect())
                    .simple(parse_context, Some(new_crumbs))
            })
            .clone()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        #[cfg(debug_assertions)]
        let _frame = enter_match_frame(format!("{self:?} at {idx}"));
        let elem = self.get_elem(parse_context.dialect());

        if let Some(exclude) = &self.exclude {
            let excluded =
                parse_context.deeper_match(self.reset_terminators, &self.terminators, |ctx| {
                    Ok(exclude.match_segments(segments, idx, ctx)?.has_match())
                })?;

            if excluded {
                return Ok(MatchResult::empty_at(idx));
            }
        }

        parse_context.deeper_match(self.reset_terminators, &self.terminators, |ctx| {
            elem.match_segments(segments, idx, ctx)
        })
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

/// Claims everything up to the first terminator, its own or those of
/// the context.
#[derive(Clone, Debug)]
pub struct Anything {
    cache_key: MatchableCacheKey,
    terminators: Vec<Matchable>,
}

impl Default for Anything {
    fn default() -> Self {
        Self::new()
    }
}

impl Anything {
    pub fn new() -> Self {
        Self {
            cache_key: next_matchable_cache_key(),
            terminators: Vec::new(),
        }
    }

    pub fn terminators(mut self, terminators: Vec<Matchable>) -> Self {
        self.terminators = terminators;
        self
    }
}

impl MatchableTrait for Anything {
    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        if self.terminators.is_empty() && parse_context.terminators.is_empty() {
            return Ok(MatchResult::from_span(idx, segments.len() as u32));
        }

        let mut terminators = self.terminators.clone();
        for terminator in &parse_context.terminators {
            if !terminators.contains(terminator) {
                terminators.push(terminator.clone());
            }
        }

        greedy_match(segments, idx, parse_context, &terminators, false, true)
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

/// Never matches.
#[derive(Clone, Debug)]
pub struct Nothing {
    cache_key: MatchableCacheKey,
}

impl Default for Nothing {
    fn default() -> Self {
        Self::new()
    }
}

impl Nothing {
    pub fn new() -> Self {
        Self {
            cache_key: next_matchable_cache_key(),
        }
    }
}

impl MatchableTrait for Nothing {
    fn match_segments(
        &self,
        _segments: &[ErasedSegment],
        idx: u32,
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(MatchResult::empty_at(idx))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}
