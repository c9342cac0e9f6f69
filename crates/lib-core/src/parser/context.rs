use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::match_result::MatchResult;
use super::matchable::{Matchable, MatchableCacheKey};
use super::{Parser, ParserConfig};
use crate::dialects::base::Dialect;
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;
use crate::helpers::IndexSet;

type LocKey = u32;
type LocKeyData = (SmolStr, (usize, usize), SyntaxKind, u32);

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    loc: LocKey,
    key: MatchableCacheKey,
}

impl CacheKey {
    pub fn new(loc: LocKey, key: MatchableCacheKey) -> Self {
        Self { loc, key }
    }
}

/// State threaded through one parse: the dialect, the active
/// terminators, the nesting depth and the match cache.
#[derive(Debug)]
pub struct ParseContext<'a> {
    dialect: &'a Dialect,
    pub(crate) terminators: Vec<Matchable>,
    depth: usize,
    max_depth: usize,
    bracket_pairs_set: &'static str,
    loc_keys: IndexSet<LocKeyData>,
    parse_cache: FxHashMap<CacheKey, MatchResult>,
}

impl<'a> From<&'a Parser<'a>> for ParseContext<'a> {
    fn from(parser: &'a Parser) -> Self {
        Self::new(parser.dialect(), parser.config())
    }
}

impl<'a> ParseContext<'a> {
    pub fn new(dialect: &'a Dialect, config: &ParserConfig) -> Self {
        Self {
            dialect,
            terminators: Vec::new(),
            depth: 0,
            max_depth: config.max_depth,
            bracket_pairs_set: config.bracket_pairs_set,
            loc_keys: IndexSet::default(),
            parse_cache: FxHashMap::default(),
        }
    }

    pub fn dialect(&self) -> &Dialect {
        self.dialect
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bracket_pairs_set(&self) -> &'static str {
        self.bracket_pairs_set
    }

    /// Run `f` one level deeper, with the terminators adjusted.
    ///
    /// Depth and terminators are restored whatever `f` returns. Going past
    /// the configured maximum depth is a fatal error.
    pub(crate) fn deeper_match<T>(
        &mut self,
        clear_terminators: bool,
        push_terminators: &[Matchable],
        f: impl FnOnce(&mut Self) -> Result<T, SQLParseError>,
    ) -> Result<T, SQLParseError> {
        if self.depth >= self.max_depth {
            log::debug!(
                "Refusing to match deeper than {} levels with {} terminators active",
                self.max_depth,
                self.terminators.len()
            );
            return Err(SQLParseError::recursion_limit(self.max_depth));
        }

        self.depth += 1;
        let (appended, terms) = self.set_terminators(clear_terminators, push_terminators);

        let ret = f(self);

        self.reset_terminators(appended, terms, clear_terminators);
        self.depth -= 1;

        ret
    }

    fn set_terminators(
        &mut self,
        clear_terminators: bool,
        push_terminators: &[Matchable],
    ) -> (usize, Vec<Matchable>) {
        let mut appended = 0;
        let terminators = self.terminators.clone();

        if clear_terminators && !self.terminators.is_empty() {
            self.terminators = push_terminators.to_vec();
        } else {
            for terminator in push_terminators {
                if !self.terminators.contains(terminator) {
                    self.terminators.push(terminator.clone());
                    appended += 1;
                }
            }
        }

        (appended, terminators)
    }

    fn reset_terminators(
        &mut self,
        appended: usize,
        terminators: Vec<Matchable>,
        clear_terminators: bool,
    ) {
        if clear_terminators {
            self.terminators = terminators;
        } else {
            let new_len = self.terminators.len().saturating_sub(appended);
            self.terminators.truncate(new_len);
        }
    }

    pub(crate) fn loc_key(&mut self, data: LocKeyData) -> LocKey {
        let (key, _) = self.loc_keys.insert_full(data);
        key as u32
    }

    pub(crate) fn check_parse_cache(
        &self,
        loc_key: LocKey,
        matcher_key: MatchableCacheKey,
    ) -> Option<MatchResult> {
        self.parse_cache
            .get(&CacheKey::new(loc_key, matcher_key))
            .cloned()
    }

    pub(crate) fn put_parse_cache(
        &mut self,
        loc_key: LocKey,
        matcher_key: MatchableCacheKey,
        match_result: MatchResult,
    ) {
        self.parse_cache
            .insert(CacheKey::new(loc_key, matcher_key), match_result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::syntax::SyntaxKind;
    use crate::helpers::{Config, ToMatchable};
    use crate::parser::parsers::StringParser;
    use crate::parser::segments::test_functions::fresh_ansi_dialect;

    #[test]
    fn deeper_match_restores_depth_and_terminators() {
        let dialect = fresh_ansi_dialect();
        let parser = Parser::from(&dialect);
        let mut ctx = ParseContext::from(&parser);
        let semicolon = StringParser::new(";", SyntaxKind::StatementTerminator).to_matchable();

        let inner: Result<(usize, usize), _> =
            ctx.deeper_match(false, std::slice::from_ref(&semicolon), |ctx| {
                Ok((ctx.depth(), ctx.terminators.len()))
            });
        assert_eq!(inner.unwrap(), (1, 1));
        assert_eq!((ctx.depth(), ctx.terminators.len()), (0, 0));

        let failed: Result<(), _> = ctx.deeper_match(false, &[semicolon], |ctx| {
            Err(SQLParseError::recursion_limit(ctx.depth()))
        });
        assert!(failed.is_err());
        assert_eq!((ctx.depth(), ctx.terminators.len()), (0, 0));
    }

    #[test]
    fn deeper_match_stops_at_max_depth() {
        let dialect = fresh_ansi_dialect();
        let config = ParserConfig::default().config(|this| this.max_depth = 2);
        let parser = Parser::new(&dialect, config);
        let mut ctx = ParseContext::from(&parser);

        fn descend(ctx: &mut ParseContext) -> Result<(), SQLParseError> {
            ctx.deeper_match(false, &[], descend)
        }

        let error = descend(&mut ctx).unwrap_err();
        assert!(error.is_fatal());
        assert!(error.matches("Maximum parse depth of 2"));
        assert_eq!(ctx.depth(), 0);
    }
}
