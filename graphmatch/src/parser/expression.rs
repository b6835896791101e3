// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression grammar
//!
//! Precedence, loosest first: `OR`, `AND`, `NOT`, comparison.

use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag};
use nom::character::complete::{char as pchar, digit1};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use super::{identifier, keyword, ws};
use crate::aggregate::AggregateFunction;
use crate::ast::{BinaryOperator, Expr, Literal};

pub fn expression(input: &str) -> IResult<&str, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(keyword("or"), and_expr))(input)?;
    Ok((input, fold_binary(first, rest, BinaryOperator::Or)))
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = not_expr(input)?;
    let (input, rest) = many0(preceded(keyword("and"), not_expr))(input)?;
    Ok((input, fold_binary(first, rest, BinaryOperator::And)))
}

fn fold_binary(first: Expr, rest: Vec<Expr>, op: BinaryOperator) -> Expr {
    rest.into_iter().fold(first, |left, right| Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn not_expr(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(keyword("not"), not_expr), |e| Expr::Not(Box::new(e))),
        comparison,
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, left) = ws(primary)(input)?;
    let (input, rhs) = opt(pair(ws(comparison_operator), ws(primary)))(input)?;
    let expr = match rhs {
        Some((op, right)) => Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        None => left,
    };
    Ok((input, expr))
}

fn comparison_operator(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        value(BinaryOperator::LessEqual, tag("<=")),
        value(BinaryOperator::GreaterEqual, tag(">=")),
        value(BinaryOperator::NotEqual, tag("<>")),
        value(BinaryOperator::NotEqual, tag("!=")),
        value(BinaryOperator::Equal, tag("=")),
        value(BinaryOperator::Less, tag("<")),
        value(BinaryOperator::Greater, tag(">")),
    ))(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
    alt((
        delimited(pchar('('), ws(expression), pchar(')')),
        map(literal, Expr::Literal),
        aggregate,
        id_call,
        property,
        map(identifier, Expr::Variable),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), keyword("true")),
        value(Literal::Bool(false), keyword("false")),
        map(
            map_res(recognize(pair(opt(pchar('-')), digit1)), |s: &str| s.parse::<i64>()),
            Literal::Int,
        ),
        map(single_string_lit, Literal::Str),
        map(double_string_lit, Literal::Str),
    ))(input)
}

fn single_string_lit(input: &str) -> IResult<&str, String> {
    let esc = escaped_transform(
        is_not("\\'"),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("'", tag("'")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        )),
    );
    map(delimited(pchar('\''), opt(esc), pchar('\'')), Option::unwrap_or_default)(input)
}

fn double_string_lit(input: &str) -> IResult<&str, String> {
    let esc = escaped_transform(
        is_not("\\\""),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        )),
    );
    map(delimited(pchar('"'), opt(esc), pchar('"')), Option::unwrap_or_default)(input)
}

fn aggregate(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let Some(function) = AggregateFunction::from_name(&name) else {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    };
    let (rest, argument) = delimited(
        ws(pchar('(')),
        alt((map(ws(pchar('*')), |_| None), map(ws(expression), Some))),
        pchar(')'),
    )(rest)?;

    if argument.is_none() && function != AggregateFunction::Count {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((
        rest,
        Expr::Aggregate {
            function,
            argument: argument.map(Box::new),
        },
    ))
}

fn id_call(input: &str) -> IResult<&str, Expr> {
    map(
        preceded(
            tuple((tag_id, ws(pchar('(')))),
            pair(ws(identifier), pchar(')')),
        ),
        |(variable, _)| Expr::Id(variable),
    )(input)
}

fn tag_id(input: &str) -> IResult<&str, &str> {
    nom::bytes::complete::tag_no_case("id")(input)
}

fn property(input: &str) -> IResult<&str, Expr> {
    map(
        tuple((identifier, pchar('.'), identifier)),
        |(variable, _, property)| Expr::Property { variable, property },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Expr {
        let (rest, expr) = expression(text).unwrap();
        assert!(rest.trim().is_empty(), "unparsed: {}", rest);
        expr
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("42"), Expr::Literal(Literal::Int(42)));
        assert_eq!(parse("TRUE"), Expr::Literal(Literal::Bool(true)));
        assert_eq!(parse("'it\\'s'"), Expr::Literal(Literal::Str("it's".into())));
        assert_eq!(parse("\"\""), Expr::Literal(Literal::Str(String::new())));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(
            parse("avg(x.val)"),
            Expr::Aggregate {
                function: AggregateFunction::Avg,
                argument: Some(Box::new(Expr::Property {
                    variable: "x".into(),
                    property: "val".into()
                })),
            }
        );
        assert!(expression("sum(*)").is_err());
    }

    #[test]
    fn test_id_and_variable() {
        assert_eq!(parse("id(x) = 3").to_string(), "id(x) = 3");
        assert_eq!(parse("identity"), Expr::Variable("identity".into()));
        assert_eq!(parse("count"), Expr::Variable("count".into()));
    }

    #[test]
    fn test_parenthesized() {
        let expr = parse("(x.a = 1 OR x.a = 2) AND x.b");
        let Expr::Binary { op, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOperator::And);
    }
}
