use strum::IntoEnumIterator;
use strum_macros::AsRefStr;

#[derive(
    strum_macros::EnumString,
    strum_macros::EnumIter,
    AsRefStr,
    Debug,
    Clone,
    Copy,
    Default,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
)]
#[strum(serialize_all = "snake_case")]
pub enum DialectKind {
    #[default]
    Ansi,
    Bigquery,
}

impl DialectKind {
    /// Name of the bracket set used when nothing overrides it.
    pub fn default_bracket_set(&self) -> &'static str {
        "bracket_pairs"
    }

    /// Whether this dialect registers an angle bracket set for generic
    /// type syntax such as `ARRAY<INT64>`.
    pub fn has_angle_brackets(&self) -> bool {
        matches!(self, DialectKind::Bigquery)
    }
}

pub fn dialect_readout() -> Vec<String> {
    DialectKind::iter()
        .map(|kind| kind.as_ref().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_kinds_parse_from_names() {
        for name in dialect_readout() {
            let kind: DialectKind = name.parse().unwrap();
            assert_eq!(kind.as_ref(), name);
        }
        assert!(DialectKind::Bigquery.has_angle_brackets());
        assert!(!DialectKind::Ansi.has_angle_brackets());
    }
}
