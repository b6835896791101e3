// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! MATCH chain grammar

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::char as pchar;
use nom::combinator::{map, opt};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use super::{identifier, ws};
use crate::ast::{NodeVariant, ParsedPattern, ParsedPatternNode};

/// `vertex (edge vertex)*`
pub fn chain(input: &str) -> IResult<&str, ParsedPattern> {
    let (input, first) = vertex(input)?;
    let (input, rest) = many0(pair(ws(edge), vertex))(input)?;

    let mut nodes = Vec::with_capacity(1 + rest.len() * 2);
    nodes.push(first);
    for (edge, vertex) in rest {
        nodes.push(edge);
        nodes.push(vertex);
    }
    Ok((input, ParsedPattern::new(nodes)))
}

/// Optional name and optional `:Table` label
fn binding(input: &str) -> IResult<&str, (Option<String>, Option<String>)> {
    tuple((
        ws(opt(identifier)),
        opt(preceded(ws(pchar(':')), ws(identifier))),
    ))(input)
}

fn vertex(input: &str) -> IResult<&str, ParsedPatternNode> {
    map(delimited(pchar('('), binding, pchar(')')), |(name, table)| {
        ParsedPatternNode::vertex(name.as_deref(), table.as_deref())
    })(input)
}

fn edge(input: &str) -> IResult<&str, ParsedPatternNode> {
    alt((
        // <-[e]-
        map(
            delimited(tag("<-["), binding, tag("]-")),
            |(name, table)| ParsedPatternNode::edge(NodeVariant::InEdge, name.as_deref(), table.as_deref()),
        ),
        // -[e]-> or -[e]-
        map(
            tuple((
                delimited(tag("-["), binding, tag("]-")),
                opt(pchar('>')),
            )),
            |((name, table), arrow)| {
                let variant = if arrow.is_some() {
                    NodeVariant::OutEdge
                } else {
                    NodeVariant::AnyEdge
                };
                ParsedPatternNode::edge(variant, name.as_deref(), table.as_deref())
            },
        ),
        map(tag("<-"), |_| ParsedPatternNode::edge(NodeVariant::InEdge, None, None)),
        map(tag("->"), |_| ParsedPatternNode::edge(NodeVariant::OutEdge, None, None)),
        map(tag("-"), |_| ParsedPatternNode::edge(NodeVariant::AnyEdge, None, None)),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_forms() {
        let (_, p) = chain("(a)-[e:Knows]->(b)<-[f]-(c)-[]-(d)->(e2)<-(f2)-(g)").unwrap();
        let variants: Vec<_> = p.nodes.iter().skip(1).step_by(2).map(|n| n.variant).collect();
        assert_eq!(
            variants,
            vec![
                NodeVariant::OutEdge,
                NodeVariant::InEdge,
                NodeVariant::AnyEdge,
                NodeVariant::OutEdge,
                NodeVariant::InEdge,
                NodeVariant::AnyEdge,
            ]
        );
        assert_eq!(p.nodes[1].table.as_deref(), Some("Knows"));
        assert!(p.nodes[5].is_anonymous());
    }

    #[test]
    fn test_anonymous_vertex_with_label() {
        let (rest, p) = chain("( :Person )").unwrap();
        assert!(rest.is_empty());
        assert!(p.nodes[0].is_anonymous());
        assert_eq!(p.nodes[0].table.as_deref(), Some("Person"));
    }
}
