use std::cell::{Cell, OnceCell};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smol_str::SmolStr;

use crate::dialects::init::DialectKind;
use crate::dialects::syntax::{SyntaxKind, SyntaxSet};
use crate::helpers::IndexMap;
use crate::parser::markers::PositionMarker;

/// Extra construction parameters carried onto a segment built by
/// `MatchResult::apply`.
pub type SegmentKwargs = IndexMap<SmolStr, SmolStr>;

pub struct SegmentBuilder {
    node_or_token: NodeOrToken,
}

impl SegmentBuilder {
    pub fn whitespace(id: u32, raw: &str) -> Self {
        SegmentBuilder::token(id, raw, SyntaxKind::Whitespace)
    }

    pub fn newline(id: u32, raw: &str) -> Self {
        SegmentBuilder::token(id, raw, SyntaxKind::Newline)
    }

    pub fn keyword(id: u32, raw: &str) -> Self {
        SegmentBuilder::token(id, raw, SyntaxKind::Keyword)
    }

    pub fn symbol(id: u32, raw: &str) -> Self {
        SegmentBuilder::token(id, raw, SyntaxKind::Symbol)
    }

    pub fn node(
        id: u32,
        syntax_kind: SyntaxKind,
        dialect: DialectKind,
        segments: Vec<ErasedSegment>,
    ) -> Self {
        SegmentBuilder {
            node_or_token: NodeOrToken {
                id,
                syntax_kind,
                class_types: class_types(syntax_kind),
                position_marker: None,
                parameters: SegmentKwargs::default(),
                kind: NodeOrTokenKind::Node(NodeData {
                    dialect,
                    segments,
                    raw: OnceCell::new(),
                    descendant_type_set: OnceCell::new(),
                }),
                hash: OnceCell::new(),
            },
        }
    }

    pub fn token(id: u32, raw: &str, syntax_kind: SyntaxKind) -> Self {
        SegmentBuilder {
            node_or_token: NodeOrToken {
                id,
                syntax_kind,
                class_types: class_types(syntax_kind),
                position_marker: None,
                parameters: SegmentKwargs::default(),
                kind: NodeOrTokenKind::Token(TokenData { raw: raw.into() }),
                hash: OnceCell::new(),
            },
        }
    }

    /// Position a node over the span of its children.
    ///
    /// Nodes without any positioned children are left unpositioned.
    pub fn position_from_segments(mut self) -> Self {
        let segments = match &self.node_or_token.kind {
            NodeOrTokenKind::Node(node) => &node.segments[..],
            NodeOrTokenKind::Token(_) => &[],
        };

        self.node_or_token.position_marker = pos_marker(segments);
        self
    }

    pub fn with_position(mut self, position: PositionMarker) -> Self {
        self.node_or_token.position_marker = Some(position);
        self
    }

    pub fn with_parameters(mut self, parameters: SegmentKwargs) -> Self {
        self.node_or_token.parameters = parameters;
        self
    }

    pub fn finish(self) -> ErasedSegment {
        ErasedSegment {
            value: Rc::new(self.node_or_token),
        }
    }
}

/// Hands out segment ids for one parse.
#[derive(Debug, Default)]
pub struct Tables {
    counter: Cell<u32>,
}

impl Tables {
    pub fn next_id(&self) -> u32 {
        let id = self.counter.get();
        self.counter.set(id + 1);
        id
    }
}

#[derive(Debug, Clone)]
pub struct ErasedSegment {
    pub(crate) value: Rc<NodeOrToken>,
}

impl Hash for ErasedSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

impl Eq for ErasedSegment {}

impl ErasedSegment {
    pub fn raw(&self) -> &SmolStr {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.raw.get_or_init(|| {
                SmolStr::from_iter(self.segments().iter().map(|segment| segment.raw().as_str()))
            }),
            NodeOrTokenKind::Token(token) => &token.raw,
        }
    }

    pub fn segments(&self) -> &[ErasedSegment] {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => &node.segments,
            NodeOrTokenKind::Token(_) => &[],
        }
    }

    pub fn get_type(&self) -> SyntaxKind {
        self.value.syntax_kind
    }

    pub fn is_type(&self, kind: SyntaxKind) -> bool {
        self.get_type() == kind
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.value.kind, NodeOrTokenKind::Token(_))
    }

    pub fn is_meta(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Indent | SyntaxKind::Implicit | SyntaxKind::Dedent | SyntaxKind::EndOfFile
        )
    }

    pub fn is_code(&self) -> bool {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.segments.iter().any(|s| s.is_code()),
            NodeOrTokenKind::Token(_) => {
                !self.is_comment() && !self.is_whitespace() && !self.is_meta()
            }
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Comment | SyntaxKind::InlineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Whitespace | SyntaxKind::Newline
        )
    }

    pub fn is_indent(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Indent | SyntaxKind::Implicit | SyntaxKind::Dedent
        )
    }

    pub fn indent_val(&self) -> i8 {
        self.value.syntax_kind.indent_val()
    }

    pub fn get_position_marker(&self) -> Option<&PositionMarker> {
        self.value.position_marker.as_ref()
    }

    pub fn get_start_loc(&self) -> (usize, usize) {
        match self.get_position_marker() {
            Some(pos_marker) => pos_marker.working_loc(),
            None => unreachable!("{self:?} has no PositionMarker"),
        }
    }

    pub fn get_end_loc(&self) -> (usize, usize) {
        match self.get_position_marker() {
            Some(pos_marker) => pos_marker.working_loc_after(self.raw()),
            None => unreachable!("{self:?} has no PositionMarker"),
        }
    }

    pub fn id(&self) -> u32 {
        self.value.id
    }

    pub fn class_types(&self) -> &SyntaxSet {
        &self.value.class_types
    }

    pub fn parameters(&self) -> &SegmentKwargs {
        &self.value.parameters
    }

    pub fn dialect(&self) -> Option<DialectKind> {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => Some(node.dialect),
            NodeOrTokenKind::Token(_) => None,
        }
    }

    /// Upper-cased raw of the first leaf that is not blank.
    ///
    /// A compound segment is keyed by this when looking ahead, so it is
    /// never taken apart during the search.
    pub fn first_non_whitespace_segment_raw_upper(&self) -> Option<String> {
        self.get_raw_segments()
            .into_iter()
            .find(|seg| !seg.raw().trim().is_empty())
            .map(|seg| seg.raw().to_uppercase())
    }

    pub fn get_raw_segments(&self) -> Vec<ErasedSegment> {
        self.recursive_crawl_all(false)
            .into_iter()
            .filter(|it| it.is_raw())
            .collect()
    }

    pub fn recursive_crawl_all(&self, reverse: bool) -> Vec<ErasedSegment> {
        let mut result = Vec::with_capacity(self.segments().len() + 1);

        if reverse {
            for seg in self.segments().iter().rev() {
                result.append(&mut seg.recursive_crawl_all(reverse));
            }
            result.push(self.clone());
        } else {
            result.push(self.clone());
            for seg in self.segments() {
                result.append(&mut seg.recursive_crawl_all(reverse));
            }
        }

        result
    }

    pub fn descendant_type_set(&self) -> &SyntaxSet {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.descendant_type_set.get_or_init(|| {
                self.segments()
                    .iter()
                    .flat_map(|segment| {
                        segment
                            .descendant_type_set()
                            .clone()
                            .union(segment.class_types())
                    })
                    .collect()
            }),
            NodeOrTokenKind::Token(_) => const { &SyntaxSet::EMPTY },
        }
    }

    /// Every segment (optionally including this one) whose class types
    /// intersect `types`, outermost first.
    pub fn recursive_crawl(&self, types: &SyntaxSet, allow_self: bool) -> Vec<ErasedSegment> {
        let mut acc = Vec::new();

        if allow_self && self.class_types().intersects(types) {
            acc.push(self.clone());
        }

        if !self.descendant_type_set().intersects(types) {
            return acc;
        }

        for seg in self.segments() {
            acc.extend(seg.recursive_crawl(types, true));
        }

        acc
    }

    pub fn child(&self, seg_types: &SyntaxSet) -> Option<ErasedSegment> {
        self.segments()
            .iter()
            .find(|seg| seg_types.contains(seg.get_type()))
            .cloned()
    }

    #[cfg(feature = "stringify")]
    pub fn stringify(&self, code_only: bool) -> String {
        serde_yaml::to_string(&self.to_serialised(code_only, true)).unwrap()
    }

    pub fn is(&self, other: &ErasedSegment) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    pub fn hash_value(&self) -> u64 {
        *self.value.hash.get_or_init(|| {
            let mut hasher = ahash::AHasher::default();
            self.get_type().hash(&mut hasher);
            self.raw().hash(&mut hasher);

            if let Some(marker) = &self.get_position_marker() {
                marker.source_position().hash(&mut hasher);
            } else {
                None::<usize>.hash(&mut hasher);
            }

            hasher.finish()
        })
    }
}

#[cfg(any(test, feature = "serde"))]
pub mod serde {
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Serialize};

    use crate::parser::segments::base::ErasedSegment;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum SerialisedSegmentValue {
        Single(String),
        Nested(Vec<TupleSerialisedSegment>),
    }

    #[derive(Debug, PartialEq, Deserialize)]
    pub struct TupleSerialisedSegment(pub String, pub SerialisedSegmentValue);

    impl Serialize for TupleSerialisedSegment {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let mut map = serializer.serialize_map(None)?;
            map.serialize_key(&self.0)?;
            map.serialize_value(&self.1)?;
            map.end()
        }
    }

    impl TupleSerialisedSegment {
        pub fn single(key: &str, value: &str) -> Self {
            Self(key.to_string(), SerialisedSegmentValue::Single(value.to_string()))
        }

        pub fn nested(key: &str, segments: Vec<TupleSerialisedSegment>) -> Self {
            Self(key.to_string(), SerialisedSegmentValue::Nested(segments))
        }
    }

    impl ErasedSegment {
        pub fn to_serialised(&self, code_only: bool, show_raw: bool) -> TupleSerialisedSegment {
            let key = self.get_type().as_str();

            if show_raw && self.is_raw() {
                TupleSerialisedSegment::single(key, self.raw())
            } else {
                let segments = self
                    .segments()
                    .iter()
                    .filter(|seg| !code_only || (seg.is_code() && !seg.is_meta()))
                    .map(|seg| seg.to_serialised(code_only, show_raw))
                    .collect();

                TupleSerialisedSegment::nested(key, segments)
            }
        }
    }
}

impl PartialEq for ErasedSegment {
    fn eq(&self, other: &Self) -> bool {
        if self.id() == other.id() && self.is(other) {
            return true;
        }

        let pos_self = self.get_position_marker();
        let pos_other = other.get_position_marker();
        if let Some((pos_self, pos_other)) = pos_self.zip(pos_other) {
            self.get_type() == other.get_type()
                && pos_self.working_loc() == pos_other.working_loc()
                && self.raw() == other.raw()
                && self.segments() == other.segments()
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeOrToken {
    id: u32,
    syntax_kind: SyntaxKind,
    class_types: SyntaxSet,
    position_marker: Option<PositionMarker>,
    parameters: SegmentKwargs,
    kind: NodeOrTokenKind,
    hash: OnceCell<u64>,
}

#[derive(Debug, Clone)]
pub enum NodeOrTokenKind {
    Node(NodeData),
    Token(TokenData),
}

#[derive(Debug, Clone)]
pub struct NodeData {
    dialect: DialectKind,
    segments: Vec<ErasedSegment>,
    raw: OnceCell<SmolStr>,
    descendant_type_set: OnceCell<SyntaxSet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    raw: SmolStr,
}

#[track_caller]
pub fn pos_marker(segments: &[ErasedSegment]) -> Option<PositionMarker> {
    let markers = segments.iter().filter_map(|seg| seg.get_position_marker());

    PositionMarker::from_child_markers(markers)
}

fn class_types(syntax_kind: SyntaxKind) -> SyntaxSet {
    match syntax_kind {
        SyntaxKind::ColumnReference | SyntaxKind::TableReference => {
            SyntaxSet::new(&[SyntaxKind::ObjectReference, syntax_kind])
        }
        SyntaxKind::StatementTerminator => {
            SyntaxSet::new(&[SyntaxKind::Symbol, SyntaxKind::StatementTerminator])
        }
        SyntaxKind::StartBracket
        | SyntaxKind::EndBracket
        | SyntaxKind::StartSquareBracket
        | SyntaxKind::EndSquareBracket
        | SyntaxKind::StartCurlyBracket
        | SyntaxKind::EndCurlyBracket
        | SyntaxKind::StartAngleBracket
        | SyntaxKind::EndAngleBracket
        | SyntaxKind::Comma
        | SyntaxKind::Dot => SyntaxSet::new(&[SyntaxKind::Symbol, syntax_kind]),
        _ => SyntaxSet::single(syntax_kind),
    }
}
