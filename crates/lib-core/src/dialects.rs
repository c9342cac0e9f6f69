pub mod ansi;
pub mod base;
pub mod init;
pub mod syntax;

pub use base::{BracketPair, Dialect};
pub use init::DialectKind;
pub use syntax::{SyntaxKind, SyntaxSet};

/// Build the expanded dialect registered for `kind`.
pub fn kind_to_dialect(kind: DialectKind) -> Dialect {
    let mut dialect = match kind {
        DialectKind::Ansi => ansi::raw_dialect(),
        DialectKind::Bigquery => ansi::bigquery_dialect(),
    };
    dialect.expand();
    dialect
}
