use crate::dialects::base::Dialect;
use crate::dialects::init::DialectKind;
use crate::dialects::syntax::SyntaxKind;
use crate::helpers::ToMatchable;
use crate::parser::grammar::base::{Anything, Ref};
use crate::parser::node_matcher::NodeMatcher;
use crate::parser::parsers::{MultiStringParser, RegexParser, StringParser, TypedParser};

const RESERVED_KEYWORDS: &str = "ALL
AND
AS
BETWEEN
BY
CASE
CROSS
DISTINCT
ELSE
END
EXISTS
FROM
FULL
GROUP
HAVING
IN
INNER
IS
JOIN
LEFT
LIKE
LIMIT
NOT
NULL
ON
OR
ORDER
OUTER
RIGHT
SELECT
THEN
UNION
USING
WHEN
WHERE
WITH";

const UNRESERVED_KEYWORDS: &str = "ARRAY
ASC
DESC
FIRST
LAST
NULLS
OVER
PARTITION
ROWS
STRUCT";

pub fn raw_dialect() -> Dialect {
    let mut ansi = Dialect::new(DialectKind::Ansi);

    ansi.update_keywords_set_from_multiline_string("reserved_keywords", RESERVED_KEYWORDS);
    ansi.update_keywords_set_from_multiline_string("unreserved_keywords", UNRESERVED_KEYWORDS);

    ansi.update_bracket_sets(
        "bracket_pairs",
        vec![
            ("round", "StartBracketSegment", "EndBracketSegment", true),
            (
                "square",
                "StartSquareBracketSegment",
                "EndSquareBracketSegment",
                true,
            ),
            (
                "curly",
                "StartCurlyBracketSegment",
                "EndCurlyBracketSegment",
                true,
            ),
        ],
    );

    ansi.add([
        (
            "StartBracketSegment".into(),
            StringParser::new("(", SyntaxKind::StartBracket).to_matchable(),
        ),
        (
            "EndBracketSegment".into(),
            StringParser::new(")", SyntaxKind::EndBracket).to_matchable(),
        ),
        (
            "StartSquareBracketSegment".into(),
            StringParser::new("[", SyntaxKind::StartSquareBracket).to_matchable(),
        ),
        (
            "EndSquareBracketSegment".into(),
            StringParser::new("]", SyntaxKind::EndSquareBracket).to_matchable(),
        ),
        (
            "StartCurlyBracketSegment".into(),
            StringParser::new("{", SyntaxKind::StartCurlyBracket).to_matchable(),
        ),
        (
            "EndCurlyBracketSegment".into(),
            StringParser::new("}", SyntaxKind::EndCurlyBracket).to_matchable(),
        ),
        (
            "SemicolonSegment".into(),
            StringParser::new(";", SyntaxKind::StatementTerminator).to_matchable(),
        ),
        (
            "CommaSegment".into(),
            StringParser::new(",", SyntaxKind::Comma).to_matchable(),
        ),
        (
            "DotSegment".into(),
            StringParser::new(".", SyntaxKind::Dot).to_matchable(),
        ),
        (
            "ComparisonOperatorGrammar".into(),
            MultiStringParser::new(
                ["=", "<>", "!=", "<", ">", "<=", ">="]
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                SyntaxKind::ComparisonOperator,
            )
            .to_matchable(),
        ),
        (
            "NumericLiteralSegment".into(),
            TypedParser::new(SyntaxKind::NumericLiteral, SyntaxKind::NumericLiteral)
                .to_matchable(),
        ),
        (
            "NakedIdentifierSegment".into(),
            RegexParser::new("[A-Z_][A-Z0-9_]*", SyntaxKind::NakedIdentifier)
                .anti_template("^(SELECT|FROM|WHERE|JOIN|ON)$")
                .to_matchable(),
        ),
        (
            "StatementSegment".into(),
            NodeMatcher::new(SyntaxKind::Statement, |_| {
                Anything::new()
                    .terminators(vec![Ref::new("SemicolonSegment").to_matchable()])
                    .to_matchable()
            })
            .to_matchable(),
        ),
        // The parser wraps the result in the `file` node itself, so all the
        // code of a file lands in one `statement`, semicolons included.
        (
            "FileSegment".into(),
            NodeMatcher::new(SyntaxKind::Statement, |_| Anything::new().to_matchable())
                .to_matchable(),
        ),
    ]);

    ansi
}

pub fn bigquery_dialect() -> Dialect {
    let mut bigquery = raw_dialect();
    bigquery.name = DialectKind::Bigquery;

    bigquery.update_bracket_sets(
        "angle_bracket_pairs",
        vec![(
            "angle",
            "StartAngleBracketSegment",
            "EndAngleBracketSegment",
            false,
        )],
    );

    bigquery.add([
        (
            "StartAngleBracketSegment".into(),
            StringParser::new("<", SyntaxKind::StartAngleBracket).to_matchable(),
        ),
        (
            "EndAngleBracketSegment".into(),
            StringParser::new(">", SyntaxKind::EndAngleBracket).to_matchable(),
        ),
    ]);

    bigquery
}
