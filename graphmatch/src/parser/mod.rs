// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query text parser
//!
//! Accepts two clause orders:
//! - `SELECT items MATCH chains [WHERE] [GROUP BY] [ORDER BY] [LIMIT]`
//! - `MATCH chains [WHERE] [GROUP BY] RETURN items [ORDER BY] [LIMIT]`
//!
//! Keywords are case-insensitive and a trailing `;` is allowed.

mod expression;
mod pattern;

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while, take_while1};
use nom::character::complete::{char as pchar, digit1, multispace0, satisfy};
use nom::combinator::{map, map_res, not, opt, peek, recognize, verify};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

use crate::ast::{Expr, OrderItem, ParsedPattern, Projection, Query, SelectItem};
use crate::error::{QueryError, Result};

pub use expression::expression;
pub use pattern::chain;

const RESERVED: &[&str] = &[
    "select", "match", "where", "group", "order", "by", "limit", "return", "as", "and", "or",
    "not", "asc", "desc", "true", "false",
];

/// Parse a complete query
pub fn parse_query(text: &str) -> Result<Query> {
    let parsed = terminated(
        ws(alt((select_query, return_query))),
        opt(ws(pchar(';'))),
    )(text);

    match parsed {
        Ok(("", query)) => Ok(query),
        Ok((rest, _)) => Err(QueryError::Parse(format!(
            "unexpected input near '{}'",
            snippet(rest)
        ))),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(QueryError::Parse(format!(
            "syntax error near '{}'",
            snippet(e.input)
        ))),
        Err(nom::Err::Incomplete(_)) => Err(QueryError::Parse("incomplete query".to_string())),
    }
}

fn snippet(rest: &str) -> &str {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return "<end of input>";
    }
    match rest.char_indices().nth(32) {
        Some((end, _)) => &rest[..end],
        None => rest,
    }
}

fn select_query(input: &str) -> IResult<&str, Query> {
    let (input, projection) = preceded(keyword("select"), projection)(input)?;
    let (input, patterns) = match_clause(input)?;
    let (input, filter) = opt(where_clause)(input)?;
    let (input, group_by) = opt(group_by_clause)(input)?;
    let (input, order_by) = opt(order_by_clause)(input)?;
    let (input, limit) = opt(limit_clause)(input)?;

    Ok((
        input,
        Query {
            projection,
            patterns,
            filter,
            group_by: group_by.unwrap_or_default(),
            order_by: order_by.unwrap_or_default(),
            limit,
        },
    ))
}

fn return_query(input: &str) -> IResult<&str, Query> {
    let (input, patterns) = match_clause(input)?;
    let (input, filter) = opt(where_clause)(input)?;
    let (input, group_by) = opt(group_by_clause)(input)?;
    let (input, projection) = preceded(keyword("return"), projection)(input)?;
    let (input, order_by) = opt(order_by_clause)(input)?;
    let (input, limit) = opt(limit_clause)(input)?;

    Ok((
        input,
        Query {
            projection,
            patterns,
            filter,
            group_by: group_by.unwrap_or_default(),
            order_by: order_by.unwrap_or_default(),
            limit,
        },
    ))
}

fn projection(input: &str) -> IResult<&str, Projection> {
    alt((
        map(ws(pchar('*')), |_| Projection::All),
        map(separated_list1(ws(pchar(',')), select_item), Projection::Items),
    ))(input)
}

fn select_item(input: &str) -> IResult<&str, SelectItem> {
    map(
        pair(ws(expression), opt(preceded(keyword("as"), ws(identifier)))),
        |(expr, alias)| SelectItem { expr, alias },
    )(input)
}

fn match_clause(input: &str) -> IResult<&str, Vec<ParsedPattern>> {
    preceded(keyword("match"), separated_list1(ws(pchar(',')), ws(chain)))(input)
}

fn where_clause(input: &str) -> IResult<&str, Expr> {
    preceded(keyword("where"), ws(expression))(input)
}

fn group_by_clause(input: &str) -> IResult<&str, Vec<Expr>> {
    preceded(
        pair(keyword("group"), keyword("by")),
        separated_list1(ws(pchar(',')), ws(expression)),
    )(input)
}

fn order_by_clause(input: &str) -> IResult<&str, Vec<OrderItem>> {
    preceded(
        pair(keyword("order"), keyword("by")),
        separated_list1(ws(pchar(',')), order_item),
    )(input)
}

fn order_item(input: &str) -> IResult<&str, OrderItem> {
    map(
        pair(
            ws(expression),
            opt(alt((
                map(keyword("asc"), |_| true),
                map(keyword("desc"), |_| false),
            ))),
        ),
        |(expr, ascending)| OrderItem {
            expr,
            ascending: ascending.unwrap_or(true),
        },
    )(input)
}

fn limit_clause(input: &str) -> IResult<&str, usize> {
    preceded(keyword("limit"), ws(map_res(digit1, |s: &str| s.parse::<usize>())))(input)
}

pub(crate) fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case-insensitive keyword not followed by an identifier character
pub(crate) fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(
        tag_no_case(word),
        not(peek(satisfy(is_ident_continue))),
    ))
}

pub(crate) fn identifier(input: &str) -> IResult<&str, String> {
    map(
        verify(
            recognize(tuple((
                take_while1(is_ident_start),
                take_while(is_ident_continue),
            ))),
            |s: &str| !RESERVED.contains(&s.to_ascii_lowercase().as_str()),
        ),
        |s: &str| s.to_string(),
    )(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateFunction;
    use crate::ast::{BinaryOperator, Literal, NodeVariant};

    #[test]
    fn test_parse_select_form() {
        let query = parse_query(
            "SELECT x.val, count(*) AS n MATCH (x:Person)-[e:Knows]->(y) \
             WHERE x.val > 3 GROUP BY x.val ORDER BY n DESC LIMIT 10;",
        )
        .unwrap();

        let Projection::Items(items) = &query.projection else {
            panic!("expected explicit items");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].alias.as_deref(), Some("n"));
        assert_eq!(
            items[1].expr,
            Expr::Aggregate {
                function: AggregateFunction::Count,
                argument: None
            }
        );

        assert_eq!(query.patterns.len(), 1);
        let nodes = &query.patterns[0].nodes;
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].table.as_deref(), Some("Person"));
        assert_eq!(nodes[1].variant, NodeVariant::OutEdge);
        assert_eq!(nodes[1].name.as_deref(), Some("e"));

        assert!(query.filter.is_some());
        assert_eq!(query.group_by.len(), 1);
        assert!(!query.order_by[0].ascending);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_parse_return_form() {
        let query = parse_query("match (x)->(y), (y)<-(z) return count(*)").unwrap();
        assert_eq!(query.patterns.len(), 2);
        assert_eq!(query.patterns[1].nodes[1].variant, NodeVariant::InEdge);
        assert!(query.group_by.is_empty());
    }

    #[test]
    fn test_parse_select_star() {
        let query = parse_query("SELECT * MATCH (a)-(b)").unwrap();
        assert_eq!(query.projection, Projection::All);
        assert_eq!(query.patterns[0].nodes[1].variant, NodeVariant::AnyEdge);
    }

    #[test]
    fn test_parse_where_precedence() {
        let query = parse_query(
            "SELECT x MATCH (x) WHERE NOT x.a = 1 OR x.b <> 'q' AND x.c <= -2",
        )
        .unwrap();
        let Some(Expr::Binary { op, right, .. }) = query.filter else {
            panic!("expected binary filter");
        };
        assert_eq!(op, BinaryOperator::Or);
        let Expr::Binary { op, right, .. } = *right else {
            panic!("expected AND on the right");
        };
        assert_eq!(op, BinaryOperator::And);
        let Expr::Binary { op, right, .. } = *right else {
            panic!("expected comparison");
        };
        assert_eq!(op, BinaryOperator::LessEqual);
        assert_eq!(*right, Expr::Literal(Literal::Int(-2)));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let query = parse_query("SELECT selection MATCH (selection)").unwrap();
        assert_eq!(query.patterns[0].nodes[0].name.as_deref(), Some("selection"));

        assert!(keyword("match")("matched (x)").is_err());
        assert_eq!(keyword("match")("MATCH (x)").unwrap(), ("(x)", "MATCH"));
        assert_eq!(keyword("limit")("limit_1").ok(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_query("SELECT x"), Err(QueryError::Parse(_))));
        assert!(matches!(
            parse_query("SELECT x MATCH (x) garbage"),
            Err(QueryError::Parse(msg)) if msg.contains("garbage")
        ));
        assert!(matches!(parse_query("MATCH (x)-[e]>(y) RETURN x"), Err(QueryError::Parse(_))));
    }
}
