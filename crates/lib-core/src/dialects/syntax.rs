use std::iter::FromIterator;

#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    strum_macros::IntoStaticStr,
    strum_macros::EnumString,
    strum_macros::FromRepr,
    Hash,
    PartialOrd,
    Ord,
    Default,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u16)]
pub enum SyntaxKind {
    Unparsable,
    File,
    Statement,
    Bracketed,
    Expression,
    ObjectReference,
    ColumnReference,
    TableReference,
    SelectClause,
    FromClause,
    WhereClause,
    Keyword,
    Symbol,
    Word,
    NakedIdentifier,
    QuotedIdentifier,
    NumericLiteral,
    QuotedLiteral,
    SingleQuote,
    DoubleQuote,
    BinaryOperator,
    ComparisonOperator,
    RawComparisonOperator,
    Comma,
    Dot,
    Star,
    Semicolon,
    StatementTerminator,
    StartBracket,
    EndBracket,
    StartSquareBracket,
    EndSquareBracket,
    StartCurlyBracket,
    EndCurlyBracket,
    StartAngleBracket,
    EndAngleBracket,
    Whitespace,
    Newline,
    Comment,
    InlineComment,
    BlockComment,
    Indent,
    Dedent,
    Implicit,
    EndOfFile,
    #[default]
    Raw,
}

impl SyntaxKind {
    pub fn indent_val(self) -> i8 {
        match self {
            SyntaxKind::Indent | SyntaxKind::Implicit => 1,
            SyntaxKind::Dedent => -1,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SyntaxSet([u64; 2]);

impl std::fmt::Debug for SyntaxSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl SyntaxSet {
    pub const EMPTY: SyntaxSet = Self([0; 2]);
    const SLICE_BITS: u16 = u64::BITS as u16;

    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut set = SyntaxSet::EMPTY;

        let mut index = 0;
        while index < kinds.len() {
            set = set.union(&Self::single(kinds[index]));
            index += 1;
        }

        set
    }

    pub const fn single(kind: SyntaxKind) -> Self {
        let kind = kind as u16;
        let index = (kind / Self::SLICE_BITS) as usize;

        debug_assert!(
            index < Self::EMPTY.0.len(),
            "Index out of bounds. Increase the size of the bitset array."
        );

        let mut bits = Self::EMPTY.0;
        bits[index] = 1 << (kind % Self::SLICE_BITS);

        Self(bits)
    }

    pub fn is_empty(&self) -> bool {
        self == &SyntaxSet::EMPTY
    }

    pub fn insert(&mut self, value: SyntaxKind) {
        let set = std::mem::take(self);
        *self = set.union(&SyntaxSet::single(value));
    }

    pub const fn intersection(mut self, other: &Self) -> Self {
        let mut index = 0;

        while index < self.0.len() {
            self.0[index] &= other.0[index];
            index += 1;
        }

        self
    }

    pub const fn union(mut self, other: &Self) -> Self {
        let mut index = 0;

        while index < self.0.len() {
            self.0[index] |= other.0[index];
            index += 1;
        }

        self
    }

    pub const fn intersects(&self, other: &Self) -> bool {
        let mut index = 0;

        while index < self.0.len() {
            if self.0[index] & other.0[index] != 0 {
                return true;
            }
            index += 1;
        }

        false
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        let index = (kind / Self::SLICE_BITS) as usize;

        self.0[index] & (1 << (kind % Self::SLICE_BITS)) != 0
    }

    pub const fn len(&self) -> usize {
        let mut len = 0;

        let mut index = 0;
        while index < self.0.len() {
            len += self.0[index].count_ones() as usize;
            index += 1;
        }

        len
    }

    pub fn iter(&self) -> SyntaxSetIter {
        SyntaxSetIter {
            set: self.clone(),
            index: 0,
        }
    }
}

impl Extend<SyntaxKind> for SyntaxSet {
    fn extend<T: IntoIterator<Item = SyntaxKind>>(&mut self, iter: T) {
        let set = std::mem::take(self);
        *self = set.union(&SyntaxSet::from_iter(iter));
    }
}

impl IntoIterator for SyntaxSet {
    type Item = SyntaxKind;
    type IntoIter = SyntaxSetIter;

    fn into_iter(self) -> Self::IntoIter {
        SyntaxSetIter {
            set: self,
            index: 0,
        }
    }
}

impl IntoIterator for &SyntaxSet {
    type Item = SyntaxKind;
    type IntoIter = SyntaxSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<SyntaxKind> for SyntaxSet {
    fn from_iter<T: IntoIterator<Item = SyntaxKind>>(iter: T) -> Self {
        let mut set = SyntaxSet::EMPTY;

        for kind in iter {
            set.insert(kind);
        }

        set
    }
}

pub struct SyntaxSetIter {
    set: SyntaxSet,
    index: u16,
}

impl Iterator for SyntaxSetIter {
    type Item = SyntaxKind;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slice = self.set.0.get_mut(self.index as usize)?;
            let bit = slice.trailing_zeros() as u16;

            if bit < SyntaxSet::SLICE_BITS {
                *slice ^= 1 << bit;
                let value = self.index * SyntaxSet::SLICE_BITS + bit;
                return SyntaxKind::from_repr(value);
            }

            self.index += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.set.len();

        (len, Some(len))
    }
}
