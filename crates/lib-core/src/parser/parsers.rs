use ahash::AHashSet;
use fancy_regex::Regex;

use super::context::ParseContext;
use super::match_result::{MatchResult, Matched};
use super::matchable::{MatchableCacheKey, MatchableTrait, SimpleHint, next_matchable_cache_key};
use super::segments::ErasedSegment;
use crate::dialects::syntax::{SyntaxKind, SyntaxSet};
use crate::errors::SQLParseError;

/// Claim the single code segment at `idx` as `kind` if `is_first_match`
/// accepts it.
fn match_single(
    segments: &[ErasedSegment],
    idx: u32,
    kind: SyntaxKind,
    is_first_match: impl FnOnce(&ErasedSegment) -> bool,
) -> MatchResult {
    let Some(segment) = segments.get(idx as usize) else {
        return MatchResult::empty_at(idx);
    };

    if segment.is_code() && is_first_match(segment) {
        return MatchResult {
            matched: Some(Matched::Newtype(kind)),
            ..MatchResult::from_span(idx, idx + 1)
        };
    }

    MatchResult::empty_at(idx)
}

#[derive(Debug, Clone)]
pub struct TypedParser {
    template: SyntaxKind,
    target_types: SyntaxSet,
    kind: SyntaxKind,
    cache_key: MatchableCacheKey,
}

impl TypedParser {
    pub fn new(template: SyntaxKind, kind: SyntaxKind) -> Self {
        Self {
            template,
            kind,
            target_types: SyntaxSet::single(template),
            cache_key: next_matchable_cache_key(),
        }
    }

    pub fn is_first_match(&self, segment: &ErasedSegment) -> bool {
        self.target_types.intersects(segment.class_types())
    }

    pub fn template(&self) -> SyntaxKind {
        self.template
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }
}

impl MatchableTrait for TypedParser {
    fn simple(
        &self,
        _parse_context: &ParseContext,
        _crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        SimpleHint::from_types(self.target_types.clone()).into()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(match_single(segments, idx, self.kind, |segment| {
            self.is_first_match(segment)
        }))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

#[derive(Clone, Debug)]
pub struct StringParser {
    template: String,
    kind: SyntaxKind,
    cache_key: MatchableCacheKey,
}

impl StringParser {
    pub fn new(template: &str, kind: SyntaxKind) -> StringParser {
        StringParser {
            template: template.to_uppercase(),
            kind,
            cache_key: next_matchable_cache_key(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }
}

impl MatchableTrait for StringParser {
    fn simple(
        &self,
        _parse_context: &ParseContext,
        _crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        SimpleHint::from_raws([self.template.clone()]).into()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(match_single(segments, idx, self.kind, |segment| {
            segment.raw().to_uppercase() == self.template
        }))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

#[derive(Clone, Debug)]
pub struct MultiStringParser {
    templates: AHashSet<String>,
    kind: SyntaxKind,
    cache_key: MatchableCacheKey,
}

impl MultiStringParser {
    pub fn new(templates: Vec<String>, kind: SyntaxKind) -> Self {
        let templates = templates
            .iter()
            .map(|template| template.to_uppercase())
            .collect();

        Self {
            templates,
            kind,
            cache_key: next_matchable_cache_key(),
        }
    }

    pub fn templates(&self) -> Vec<&str> {
        self.templates.iter().map(|it| it.as_str()).collect()
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }
}

impl MatchableTrait for MultiStringParser {
    fn simple(
        &self,
        _parse_context: &ParseContext,
        _crumbs: Option<Vec<&str>>,
    ) -> Option<SimpleHint> {
        SimpleHint::from_raws(self.templates.iter().cloned()).into()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(match_single(segments, idx, self.kind, |segment| {
            self.templates.contains(&segment.raw().to_uppercase())
        }))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}

/// Matches a whole raw against a case-insensitive pattern.
///
/// There is no cheap hint for an arbitrary pattern, so this parser is
/// never pruned and cannot be used as a lookahead target.
#[derive(Debug, Clone)]
pub struct RegexParser {
    pub template: Regex,
    pub anti_template: Option<Regex>,
    kind: SyntaxKind,
    cache_key: MatchableCacheKey,
}

impl RegexParser {
    pub fn new(template: &str, kind: SyntaxKind) -> Self {
        let template_pattern =
            Regex::new(&format!("(?i)^(?:{template})$")).expect("invalid RegexParser template");

        Self {
            template: template_pattern,
            anti_template: None,
            kind,
            cache_key: next_matchable_cache_key(),
        }
    }

    pub fn anti_template(mut self, anti_template: &str) -> Self {
        self.anti_template = Regex::new(&format!("(?i)^(?:{anti_template})"))
            .expect("invalid RegexParser anti template")
            .into();
        self
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    fn is_first_match(&self, segment: &ErasedSegment) -> bool {
        let raw = segment.raw();

        self.template.is_match(raw).unwrap_or(false)
            && !self
                .anti_template
                .as_ref()
                .is_some_and(|anti| anti.is_match(raw).unwrap_or(false))
    }
}

impl MatchableTrait for RegexParser {
    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        idx: u32,
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(match_single(segments, idx, self.kind, |segment| {
            self.is_first_match(segment)
        }))
    }

    fn cache_key(&self) -> MatchableCacheKey {
        self.cache_key
    }
}
