use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::fmt::Debug;

use ahash::{AHashMap, AHashSet};

use crate::dialects::init::DialectKind;
use crate::dialects::syntax::SyntaxKind;
use crate::helpers::{ToMatchable, capitalize};
use crate::parser::matchable::Matchable;
use crate::parser::parsers::StringParser;

/// `(bracket_type, start_ref, end_ref, persists)`.
///
/// The two refs name matchables in the dialect library. `bracket_type`
/// pairs an opening bracket with its closing bracket, and `persists`
/// decides whether a resolved pair becomes a `bracketed` node.
pub type BracketPair = (&'static str, &'static str, &'static str, bool);

const BRACKET_SETS: [&str; 2] = ["bracket_pairs", "angle_bracket_pairs"];

#[derive(Debug, Clone, Default)]
pub struct Dialect {
    pub name: DialectKind,
    library: AHashMap<Cow<'static, str>, Matchable>,
    sets: AHashMap<&'static str, AHashSet<&'static str>>,
    bracket_collections: AHashMap<&'static str, Vec<BracketPair>>,
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Dialect {
    pub fn new(name: DialectKind) -> Self {
        Dialect {
            name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> DialectKind {
        self.name
    }

    pub fn add(&mut self, iter: impl IntoIterator<Item = (Cow<'static, str>, Matchable)>) {
        self.library.extend(iter);
    }

    pub fn grammar(&self, name: &str) -> Matchable {
        self.library
            .get(name)
            .unwrap_or_else(|| panic!("not found {name}"))
            .clone()
    }

    pub fn sets(&self, label: &str) -> AHashSet<&'static str> {
        assert!(
            !BRACKET_SETS.contains(&label),
            "Use `bracket_sets` to retrieve {label} set."
        );

        self.sets.get(label).cloned().unwrap_or_default()
    }

    pub fn sets_mut(&mut self, label: &'static str) -> &mut AHashSet<&'static str> {
        assert!(
            !BRACKET_SETS.contains(&label),
            "Use `bracket_sets` to retrieve {label} set."
        );

        match self.sets.entry(label) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(<_>::default()),
        }
    }

    pub fn update_keywords_set_from_multiline_string(
        &mut self,
        set_label: &'static str,
        values: &'static str,
    ) {
        let keywords = values.lines().map(str::trim).filter(|it| !it.is_empty());
        self.sets_mut(set_label).extend(keywords);
    }

    /// Bracket pairs of the named set, in registration order.
    pub fn bracket_sets(&self, label: &str) -> Vec<BracketPair> {
        assert!(
            BRACKET_SETS.contains(&label),
            "Invalid bracket set. Consider using another identifier instead."
        );

        self.bracket_collections
            .get(label)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_bracket_sets(&mut self, label: &'static str, pairs: Vec<BracketPair>) {
        assert!(
            BRACKET_SETS.contains(&label),
            "Invalid bracket set. Consider using another identifier instead."
        );

        let set = self.bracket_collections.entry(label).or_default();
        for pair in pairs {
            if !set.contains(&pair) {
                set.push(pair);
            }
        }
    }

    pub fn r#ref(&self, name: &str) -> Matchable {
        match self.library.get(name) {
            Some(matchable) => matchable.clone(),
            None => {
                if let Some(keyword) = name.strip_suffix("KeywordSegment") {
                    panic!(
                        "Grammar refers to the '{keyword}' keyword which was not found in the \
                         dialect {}.",
                        self.name.as_ref()
                    );
                } else {
                    panic!(
                        "Grammar refers to '{name}' which was not found in the dialect {}.",
                        self.name.as_ref()
                    );
                }
            }
        }
    }

    /// Turn every keyword set into `<Keyword>KeywordSegment` parsers.
    pub fn expand(&mut self) {
        for keyword_set in ["unreserved_keywords", "reserved_keywords"] {
            let Some(keywords) = self.sets.get(keyword_set) else {
                continue;
            };

            for kw in keywords {
                let name = format!("{}KeywordSegment", capitalize(kw));
                if !self.library.contains_key(name.as_str()) {
                    let parser = StringParser::new(&kw.to_lowercase(), SyntaxKind::Keyword);
                    self.library.insert(name.into(), parser.to_matchable());
                }
            }
        }
    }
}
