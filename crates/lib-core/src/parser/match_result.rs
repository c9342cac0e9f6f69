use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Write as _;

use ahash::HashMapExt;
use nohash_hasher::IntMap;

use super::segments::base::{ErasedSegment, SegmentBuilder, SegmentKwargs, Tables};
use crate::dialects::init::DialectKind;
use crate::dialects::syntax::SyntaxKind;
use crate::parser::markers::PositionMarker;

fn get_point_pos_at_idx(segments: &[ErasedSegment], idx: u32) -> Option<PositionMarker> {
    let idx = idx as usize;
    if idx < segments.len() {
        segments[idx]
            .get_position_marker()
            .map(PositionMarker::start_point_marker)
    } else {
        segments[idx - 1]
            .get_position_marker()
            .map(PositionMarker::end_point_marker)
    }
}

/// What `apply` builds around the segments of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matched {
    /// A node of this kind containing the applied segments.
    SyntaxKind(SyntaxKind),
    /// The single applied segment re-tagged as a token of this kind.
    Newtype(SyntaxKind),
}

/// A lazily applied match over one root slice of segments.
///
/// Every index refers to the same root slice, so results can be combined
/// without touching any segment. Nothing is built until `apply`.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub span: Span,
    pub matched: Option<Matched>,
    pub segment_kwargs: SegmentKwargs,
    pub insert_segments: Vec<(u32, SyntaxKind)>,
    pub child_matches: Vec<MatchResult>,
}

impl MatchResult {
    pub fn from_span(start: u32, end: u32) -> Self {
        Self {
            span: Span { start, end },
            ..Default::default()
        }
    }

    pub fn empty_at(idx: u32) -> Self {
        Self::from_span(idx, idx)
    }

    pub fn len(&self) -> u32 {
        self.span.end - self.span.start
    }

    pub fn is_empty(&self) -> bool {
        !self.has_match()
    }

    #[allow(clippy::len_zero)]
    pub fn has_match(&self) -> bool {
        self.len() > 0 || !self.insert_segments.is_empty()
    }

    pub fn is_better_than(&self, other: &MatchResult) -> bool {
        self.len() > other.len()
    }

    /// Combine with a result that starts at or after this one ends.
    ///
    /// An empty result is the identity. Tagged results become children;
    /// untagged ones are flattened into the combined result.
    #[track_caller]
    pub fn append<'a>(self, other: impl Into<Cow<'a, MatchResult>>) -> Self {
        let other = other.into();

        if self.is_empty() {
            return other.into_owned();
        }

        if other.is_empty() {
            return self;
        }

        assert!(
            self.span.end <= other.span.start,
            "Cannot append {:?} to {:?}, it must not start before the end.",
            other.span,
            self.span
        );

        let span = Span {
            start: self.span.start,
            end: other.span.end,
        };
        let mut insert_segments = Vec::new();
        let mut child_matches = Vec::new();

        for mut matched in [self, other.into_owned()] {
            if matched.matched.is_some() {
                child_matches.push(matched);
            } else {
                insert_segments.append(&mut matched.insert_segments);
                child_matches.append(&mut matched.child_matches);
            }
        }

        MatchResult {
            span,
            insert_segments,
            child_matches,
            ..Default::default()
        }
    }

    pub fn wrap(self, outer_matched: Matched) -> Self {
        self.wrap_with(outer_matched, Vec::new(), SegmentKwargs::default())
    }

    /// Tag this result, adding `insert_segments` and construction
    /// parameters for the outer segment.
    #[track_caller]
    pub fn wrap_with(
        self,
        outer_matched: Matched,
        mut insert_segments: Vec<(u32, SyntaxKind)>,
        segment_kwargs: SegmentKwargs,
    ) -> Self {
        if self.is_empty() && insert_segments.is_empty() {
            return self;
        }

        assert!(
            self.len() > 0,
            "Tried to wrap a zero length MatchResult with insert segments: {self:?}"
        );

        let span = self.span;
        let child_matches = if self.matched.is_some() {
            vec![self]
        } else {
            let mut inserts = self.insert_segments;
            inserts.append(&mut insert_segments);
            insert_segments = inserts;
            self.child_matches
        };

        Self {
            span,
            matched: Some(outer_matched),
            segment_kwargs,
            insert_segments,
            child_matches,
        }
    }

    /// Build the segments this result describes over `segments`.
    ///
    /// Borrows the result, so applying it again gives an equal tree.
    #[track_caller]
    pub fn apply(
        &self,
        tables: &Tables,
        dialect: DialectKind,
        segments: &[ErasedSegment],
    ) -> Vec<ErasedSegment> {
        enum Trigger<'a> {
            MatchResult(&'a MatchResult),
            Meta(SyntaxKind),
        }

        if self.len() == 0 {
            assert!(
                self.matched.is_none(),
                "Tried to apply a zero length MatchResult with a `matched` kind: {self:?}"
            );
            assert!(
                self.child_matches.is_empty(),
                "Tried to apply a zero length MatchResult with child matches: {self:?}"
            );
            assert!(
                self.insert_segments.is_empty(),
                "Tried to apply a zero length MatchResult with insert segments: {self:?}"
            );
            return Vec::new();
        }

        assert!(
            segments.len() >= self.span.end as usize,
            "Matched span {:?} sits outside segment bounds: {}",
            self.span,
            segments.len()
        );

        let mut result_segments = Vec::new();
        let mut trigger_locs: IntMap<u32, Vec<Trigger>> =
            IntMap::with_capacity(self.insert_segments.len() + self.child_matches.len());

        for &(pos, insert) in &self.insert_segments {
            trigger_locs
                .entry(pos)
                .or_default()
                .push(Trigger::Meta(insert));
        }

        for match_result in &self.child_matches {
            trigger_locs
                .entry(match_result.span.start)
                .or_default()
                .push(Trigger::MatchResult(match_result));
        }

        let mut max_idx = self.span.start;
        let mut keys = Vec::from_iter(trigger_locs.keys().copied());
        keys.sort_unstable();

        for idx in keys {
            match idx.cmp(&max_idx) {
                Ordering::Greater => {
                    result_segments.extend_from_slice(&segments[max_idx as usize..idx as usize]);
                    max_idx = idx;
                }
                Ordering::Less => {
                    panic!(
                        "Overlapping child matches at {idx} inside {:?}, already applied up to \
                         {max_idx}.",
                        self.span
                    );
                }
                Ordering::Equal => {}
            }

            for trigger in trigger_locs.remove(&idx).unwrap_or_default() {
                match trigger {
                    Trigger::MatchResult(trigger) => {
                        max_idx = trigger.span.end;
                        result_segments.append(&mut trigger.apply(tables, dialect, segments));
                    }
                    Trigger::Meta(meta) => {
                        let mut builder = SegmentBuilder::token(tables.next_id(), "", meta);
                        if let Some(pos) = get_point_pos_at_idx(segments, idx) {
                            builder = builder.with_position(pos);
                        }
                        result_segments.push(builder.finish());
                    }
                }
            }
        }

        if max_idx < self.span.end {
            result_segments.extend_from_slice(&segments[max_idx as usize..self.span.end as usize]);
        }

        let Some(matched) = self.matched else {
            return result_segments;
        };

        match matched {
            Matched::SyntaxKind(kind) => {
                vec![
                    SegmentBuilder::node(tables.next_id(), kind, dialect, result_segments)
                        .position_from_segments()
                        .with_parameters(self.segment_kwargs.clone())
                        .finish(),
                ]
            }
            Matched::Newtype(kind) => {
                assert_eq!(
                    result_segments.len(),
                    1,
                    "A raw {} match must cover exactly one segment.",
                    kind.as_str()
                );
                let old = &result_segments[0];

                let mut builder = SegmentBuilder::token(old.id(), old.raw(), kind)
                    .with_parameters(self.segment_kwargs.clone());
                if let Some(pos) = old.get_position_marker() {
                    builder = builder.with_position(pos.clone());
                }
                vec![builder.finish()]
            }
        }
    }

    /// Pretty print the lazy tree for debugging.
    pub fn stringify(&self) -> String {
        let mut buffer = String::new();
        self.stringify_into(&mut buffer, "");
        buffer
    }

    fn stringify_into(&self, buffer: &mut String, indent: &str) {
        let _ = write!(
            buffer,
            "Match ({:?}): {}..{}",
            self.matched, self.span.start, self.span.end
        );

        for (key, value) in &self.segment_kwargs {
            let _ = write!(buffer, "\n  {indent}-{key}: {value:?}");
        }

        for (idx, insert) in &self.insert_segments {
            let _ = write!(buffer, "\n  {indent}+{idx}: {}", insert.as_str());
        }

        let child_indent = format!("{indent}  ");
        for child in &self.child_matches {
            let _ = write!(buffer, "\n  {indent}+");
            child.stringify_into(buffer, &child_indent);
        }
    }
}

impl<'a> From<&'a MatchResult> for Cow<'a, MatchResult> {
    fn from(t: &'a MatchResult) -> Self {
        Cow::Borrowed(t)
    }
}

impl From<MatchResult> for Cow<'_, MatchResult> {
    fn from(t: MatchResult) -> Self {
        Cow::Owned(t)
    }
}

/// Half-open range of indices into the root segments.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}
