use ahash::AHashMap;
use itertools::{Itertools as _, enumerate, multiunzip};

use super::context::ParseContext;
use super::match_result::{MatchResult, Matched, Span};
use super::matchable::{Matchable, MatchableTrait};
use super::segments::base::ErasedSegment;
use crate::dialects::syntax::{SyntaxKind, SyntaxSet};
use crate::errors::SQLParseError;

/// `(unmatched prefix, match, matcher)`.
///
/// The prefix covers the segments skipped before the match and carries
/// any bracket results found in them as child matches.
pub type LookAheadMatch = (MatchResult, MatchResult, Option<Matchable>);

pub fn skip_start_index_forward_to_code(
    segments: &[ErasedSegment],
    start_idx: u32,
    max_idx: u32,
) -> u32 {
    let mut idx = start_idx;
    while idx < max_idx {
        if segments[idx as usize].is_code() {
            break;
        }
        idx += 1;
    }
    idx
}

pub fn skip_stop_index_backward_to_code(
    segments: &[ErasedSegment],
    stop_idx: u32,
    min_idx: u32,
) -> u32 {
    let mut idx = stop_idx;
    while idx > min_idx {
        if segments[idx as usize - 1].is_code() {
            break;
        }
        idx -= 1;
    }
    idx
}

/// Upper-cased first word of the whole raw of a segment.
///
/// Compound segments are keyed by this rather than taken apart, since
/// whatever is inside them has already been matched consistently.
pub fn first_trimmed_raw(seg: &ErasedSegment) -> String {
    seg.raw()
        .split_whitespace()
        .next()
        .map(str::to_uppercase)
        .unwrap_or_default()
}

pub fn first_non_whitespace(
    segments: &[ErasedSegment],
    start_idx: u32,
) -> Option<(String, &SyntaxSet)> {
    for segment in segments.iter().skip(start_idx as usize) {
        if let Some(raw) = segment.first_non_whitespace_segment_raw_upper() {
            return Some((raw, segment.class_types()));
        }
    }

    None
}

/// Drop the options whose simple hint rules out the next code segment.
///
/// Options without a hint are always kept. If there is nothing but
/// whitespace left, nothing can be pruned.
pub fn prune_options(
    options: &[Matchable],
    segments: &[ErasedSegment],
    parse_context: &ParseContext,
    start_idx: u32,
) -> Vec<Matchable> {
    let Some((first_raw, first_types)) = first_non_whitespace(segments, start_idx) else {
        return options.to_vec();
    };

    options
        .iter()
        .filter(|opt| match opt.simple(parse_context, None) {
            Some(simple) => simple.admits(&first_raw, first_types),
            None => true,
        })
        .cloned()
        .collect()
}

pub fn longest_match(
    segments: &[ErasedSegment],
    matchers: &[Matchable],
    idx: u32,
    parse_context: &mut ParseContext,
) -> Result<(MatchResult, Option<Matchable>), SQLParseError> {
    let max_idx = segments.len() as u32;

    if matchers.is_empty() || idx == max_idx {
        return Ok((MatchResult::empty_at(idx), None));
    }

    let available_options = prune_options(matchers, segments, parse_context, idx);
    let available_options_count = available_options.len();

    if available_options.is_empty() {
        return Ok((MatchResult::empty_at(idx), None));
    }

    let terminators = parse_context.terminators.clone();
    let segment = &segments[idx as usize];
    let working_loc = segment
        .get_position_marker()
        .map_or((0, idx as usize), |marker| marker.working_loc());

    let loc_key = parse_context.loc_key((
        segment.raw().clone(),
        working_loc,
        segment.get_type(),
        max_idx,
    ));

    let mut best_match = MatchResult::empty_at(idx);
    let mut best_matcher = None;

    'matcher: for (matcher_idx, matcher) in enumerate(available_options) {
        let matcher_key = matcher.cache_key();

        let res_match = match parse_context.check_parse_cache(loc_key, matcher_key) {
            Some(res_match) => res_match,
            None => {
                let res_match = matcher.match_segments(segments, idx, parse_context)?;
                parse_context.put_parse_cache(loc_key, matcher_key, res_match.clone());
                res_match
            }
        };

        if res_match.has_match() && res_match.span.end == max_idx {
            return Ok((res_match, matcher.into()));
        }

        if res_match.is_better_than(&best_match) {
            best_match = res_match;
            best_matcher = matcher.into();

            if matcher_idx == available_options_count - 1 {
                break 'matcher;
            } else if !terminators.is_empty() {
                let next_code_idx =
                    skip_start_index_forward_to_code(segments, best_match.span.end, max_idx);

                if next_code_idx == max_idx {
                    break 'matcher;
                }

                for terminator in &terminators {
                    let terminator_match =
                        terminator.match_segments(segments, next_code_idx, parse_context)?;

                    if terminator_match.has_match() {
                        break 'matcher;
                    }
                }
            }
        }
    }

    Ok((best_match, best_matcher))
}

/// Find the earliest position from `idx` at which any of `matchers`
/// matches.
///
/// At each position only the matchers whose hint admits the segment
/// there are tried, in the order given, and the first full match wins.
///
/// # Panics
///
/// Every matcher must have a simple hint.
pub fn look_ahead_match(
    segments: &[ErasedSegment],
    idx: u32,
    matchers: &[Matchable],
    parse_context: &mut ParseContext,
) -> Result<LookAheadMatch, SQLParseError> {
    let max_idx = segments.len() as u32;

    if idx >= max_idx {
        return Ok((MatchResult::empty_at(idx), MatchResult::empty_at(idx), None));
    }

    let mut raw_simple_map: AHashMap<String, Vec<usize>> = AHashMap::new();
    let mut type_simple_map: AHashMap<SyntaxKind, Vec<usize>> = AHashMap::new();

    for (matcher_idx, matcher) in enumerate(matchers) {
        let Some(simple) = matcher.simple(parse_context, None) else {
            panic!(
                "All matchers passed to `look_ahead_match` must have a simple hint. Problematic \
                 matcher: {matcher:?}"
            );
        };

        for raw in simple.raws() {
            raw_simple_map
                .entry(raw.clone())
                .or_default()
                .push(matcher_idx);
        }

        for typ in simple.types() {
            type_simple_map.entry(typ).or_default().push(matcher_idx);
        }
    }

    for pos in idx..max_idx {
        let seg = &segments[pos as usize];
        let mut matcher_idxs = raw_simple_map
            .get(&first_trimmed_raw(seg))
            .cloned()
            .unwrap_or_default();

        for typ in seg.class_types() {
            if let Some(idxs) = type_simple_map.get(&typ) {
                matcher_idxs.extend_from_slice(idxs);
            }
        }

        if matcher_idxs.is_empty() {
            continue;
        }

        matcher_idxs.sort_unstable();
        matcher_idxs.dedup();

        for matcher_idx in matcher_idxs {
            let matcher = &matchers[matcher_idx];
            let match_result = matcher.match_segments(segments, pos, parse_context)?;

            if match_result.has_match() {
                return Ok((
                    MatchResult::from_span(idx, pos),
                    match_result,
                    matcher.clone().into(),
                ));
            }
        }
    }

    Ok((
        MatchResult::from_span(idx, max_idx),
        MatchResult::empty_at(max_idx),
        None,
    ))
}

/// An open bracket while looking ahead.
#[derive(Debug, Clone)]
pub struct BracketInfo {
    /// Index of the opening bracket segment.
    pub bracket: u32,
    pub opening: MatchResult,
    /// Bracket results resolved while this one was open.
    pub inner: Vec<MatchResult>,
    pub bracket_type: &'static str,
}

impl BracketInfo {
    fn new(opening: MatchResult, bracket_type: &'static str) -> Self {
        Self {
            bracket: opening.span.start,
            opening,
            inner: Vec::new(),
            bracket_type,
        }
    }

    fn close(self, closing: MatchResult, persists: bool) -> MatchResult {
        let insert_segments = vec![
            (self.opening.span.end, SyntaxKind::Indent),
            (closing.span.start, SyntaxKind::Dedent),
        ];
        let span = Span {
            start: self.opening.span.start,
            end: closing.span.end,
        };

        let mut child_matches = Vec::with_capacity(self.inner.len() + 2);
        child_matches.push(self.opening);
        child_matches.extend(self.inner);
        child_matches.push(closing);

        let bracket_match = MatchResult {
            span,
            insert_segments,
            child_matches,
            ..MatchResult::default()
        };

        if persists {
            bracket_match.wrap(Matched::SyntaxKind(SyntaxKind::Bracketed))
        } else {
            bracket_match
        }
    }
}

/// Like `look_ahead_match`, but anything inside brackets is skipped.
///
/// Brackets come from the dialect's `bracket_pairs_set`. Every bracket
/// pair resolved before the match ends up as a child of the prefix.
/// A closing bracket of the wrong type, or an opening bracket that is
/// never closed, is an error.
pub fn bracket_sensitive_look_ahead_match(
    segments: &[ErasedSegment],
    idx: u32,
    matchers: &[Matchable],
    parse_context: &mut ParseContext,
    bracket_pairs_set: &str,
) -> Result<LookAheadMatch, SQLParseError> {
    let max_idx = segments.len() as u32;

    if idx >= max_idx {
        return Ok((MatchResult::empty_at(idx), MatchResult::empty_at(idx), None));
    }

    let (bracket_types, start_bracket_refs, end_bracket_refs, bracket_persists): (
        Vec<_>,
        Vec<_>,
        Vec<_>,
        Vec<_>,
    ) = multiunzip(parse_context.dialect().bracket_sets(bracket_pairs_set));

    let start_brackets = start_bracket_refs
        .into_iter()
        .map(|seg_ref| parse_context.dialect().r#ref(seg_ref))
        .collect_vec();

    let end_brackets = end_bracket_refs
        .into_iter()
        .map(|seg_ref| parse_context.dialect().r#ref(seg_ref))
        .collect_vec();

    let bracket_matchers = [start_brackets.as_slice(), end_brackets.as_slice()].concat();
    let all_matchers = [matchers, bracket_matchers.as_slice()].concat();

    let mut working_idx = idx;
    let mut pending: Vec<MatchResult> = Vec::new();
    let mut bracket_stack: Vec<BracketInfo> = Vec::new();

    while working_idx < max_idx {
        if let Some(innermost) = bracket_stack.last() {
            let (_, match_result, matcher) =
                look_ahead_match(segments, working_idx, &bracket_matchers, parse_context)?;

            let Some(matcher) = matcher else {
                return Err(SQLParseError::unterminated_bracket(
                    "Couldn't find closing bracket for opening bracket.",
                    segments[innermost.bracket as usize].clone(),
                ));
            };

            if !end_brackets.contains(&matcher) {
                let Some(type_idx) = start_brackets.iter().position(|it| it == &matcher) else {
                    unreachable!("{matcher:?} is neither an opening nor a closing bracket");
                };

                log::trace!(
                    "Opening nested {} bracket at {}",
                    bracket_types[type_idx],
                    match_result.span.start
                );
                working_idx = match_result.span.end;
                bracket_stack.push(BracketInfo::new(match_result, bracket_types[type_idx]));
                continue;
            }

            let Some(end_idx) = end_brackets.iter().position(|it| it == &matcher) else {
                unreachable!("{matcher:?} is not a closing bracket");
            };
            let end_type = bracket_types[end_idx];

            if innermost.bracket_type != end_type {
                return Err(SQLParseError::mismatched_bracket(
                    format!(
                        "Found unexpected end bracket! Was expecting the end of a {} bracket, but \
                         got the end of a {end_type} bracket.",
                        innermost.bracket_type
                    ),
                    segments[match_result.span.start as usize].clone(),
                ));
            }

            working_idx = match_result.span.end;

            let Some(info) = bracket_stack.pop() else {
                unreachable!("the bracket stack was checked to be non-empty");
            };
            log::trace!(
                "Closing {} bracket opened at {}",
                info.bracket_type,
                info.bracket
            );

            let bracket_match = info.close(match_result, bracket_persists[end_idx]);
            match bracket_stack.last_mut() {
                Some(parent) => parent.inner.push(bracket_match),
                None => pending.push(bracket_match),
            }

            continue;
        }

        let (_, match_result, matcher) =
            look_ahead_match(segments, working_idx, &all_matchers, parse_context)?;

        let Some(matcher) = matcher else {
            break;
        };

        if matchers.contains(&matcher) {
            let prefix = MatchResult {
                child_matches: pending,
                ..MatchResult::from_span(idx, match_result.span.start)
            };

            return Ok((prefix, match_result, Some(matcher)));
        }

        if let Some(type_idx) = start_brackets.iter().position(|it| it == &matcher) {
            log::trace!(
                "Opening {} bracket at {}",
                bracket_types[type_idx],
                match_result.span.start
            );
            working_idx = match_result.span.end;
            bracket_stack.push(BracketInfo::new(match_result, bracket_types[type_idx]));
            continue;
        }

        if end_brackets.contains(&matcher) {
            // The section we are in should have ended already, so there is
            // no match to be found past this point.
            log::trace!(
                "Unexpected end bracket at {}, giving up the look ahead",
                match_result.span.start
            );
            break;
        }

        unreachable!("{matcher:?} was not one of the matchers looked for");
    }

    if let Some(innermost) = bracket_stack.last() {
        return Err(SQLParseError::unterminated_bracket(
            format!(
                "Couldn't find closing bracket for {} opened bracket(s).",
                bracket_stack.len()
            ),
            segments[innermost.bracket as usize].clone(),
        ));
    }

    let prefix = MatchResult {
        child_matches: pending,
        ..MatchResult::from_span(idx, max_idx)
    };

    Ok((prefix, MatchResult::empty_at(max_idx), None))
}

/// Claim everything from `idx` up to the next terminator.
///
/// Terminators inside brackets do not count. A keyword terminator (a hint
/// of only alphabetic raws) only counts when it directly follows
/// whitespace, skipping metas, or when nothing at all precedes it.
/// Without `include_terminator`, trailing non-code before the terminator
/// is left unclaimed. With `nested_match`, bracket results are kept as
/// children of the claim.
pub fn greedy_match(
    segments: &[ErasedSegment],
    idx: u32,
    parse_context: &mut ParseContext,
    matchers: &[Matchable],
    include_terminator: bool,
    nested_match: bool,
) -> Result<MatchResult, SQLParseError> {
    let max_idx = segments.len() as u32;
    let bracket_pairs_set = parse_context.bracket_pairs_set();

    let mut working_idx = idx;
    let mut child_matches = Vec::new();

    loop {
        let (prefix, matched, matcher) = parse_context.deeper_match(false, &[], |ctx| {
            bracket_sensitive_look_ahead_match(
                segments,
                working_idx,
                matchers,
                ctx,
                bracket_pairs_set,
            )
        })?;

        if nested_match {
            child_matches.extend(prefix.child_matches);
        }

        let Some(matcher) = matcher else {
            return Ok(MatchResult {
                child_matches,
                ..MatchResult::from_span(idx, max_idx)
            });
        };

        let start_idx = matched.span.start;
        let Some(simple) = matcher.simple(parse_context, None) else {
            panic!("Terminators require a simple hint: {matcher:?}");
        };

        if simple.is_keyword() {
            let mut allowable_match = start_idx == working_idx;

            for pos in (working_idx..start_idx).rev() {
                let seg = &segments[pos as usize];

                if seg.is_meta() {
                    continue;
                }

                allowable_match = seg.is_whitespace();
                break;
            }

            if !allowable_match {
                log::trace!(
                    "Keyword terminator {:?} at {start_idx} is not preceded by whitespace",
                    segments[start_idx as usize].raw()
                );
                working_idx = matched.span.end;
                continue;
            }
        }

        if include_terminator {
            let claimed = MatchResult {
                child_matches,
                ..MatchResult::from_span(idx, start_idx)
            };

            return Ok(claimed.append(matched));
        }

        // Non-code directly before the terminator is not claimed, unless
        // there is nothing else to claim.
        let stop_idx = skip_stop_index_backward_to_code(segments, start_idx, idx);
        let end = if stop_idx == idx { start_idx } else { stop_idx };

        return Ok(MatchResult {
            child_matches,
            ..MatchResult::from_span(idx, end)
        });
    }
}

/// Index of the end of the content from `idx`, before the next
/// terminator and any non-code leading up to it.
pub fn trim_to_terminator(
    segments: &[ErasedSegment],
    idx: u32,
    terminators: &[Matchable],
    parse_context: &mut ParseContext,
) -> Result<u32, SQLParseError> {
    if idx >= segments.len() as u32 {
        return Ok(segments.len() as u32);
    }

    let early_return = parse_context.deeper_match(false, &[], |ctx| {
        let pruned_terms = prune_options(terminators, segments, ctx, idx);

        for term in pruned_terms {
            if term.match_segments(segments, idx, ctx)?.has_match() {
                return Ok(Some(idx));
            }
        }

        Ok(None)
    })?;

    if let Some(idx) = early_return {
        return Ok(idx);
    }

    let term_match = parse_context.deeper_match(false, &[], |ctx| {
        greedy_match(segments, idx, ctx, terminators, false, false)
    })?;

    Ok(skip_stop_index_backward_to_code(
        segments,
        term_match.span.end,
        idx,
    ))
}
