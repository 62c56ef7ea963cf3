use std::fmt::Display;

use pest_consume::{Parser, match_nodes};
use tracing::debug;

use crate::sgf::{
    node::{Collection, GameNode},
    property::Property,
};

type Node<'i> = pest_consume::Node<'i, Rule, ()>;
type ParseResult<T> = std::result::Result<T, pest_consume::Error<Rule>>;

/// A failed parse: byte offset into the input plus a human-readable message.
/// The whole collection fails; nothing is partially returned.
#[derive(Debug, thiserror::Error)]
#[error("{message} (at offset {offset})")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl From<pest_consume::Error<Rule>> for ParseError {
    fn from(e: pest_consume::Error<Rule>) -> Self {
        let offset = match e.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        ParseError {
            offset,
            message: e.variant.message().into_owned(),
        }
    }
}

/// Recursive intermediate representation that mirrors the SGF grammar.
/// Private to this module — callers only see `Collection`.
struct ParsedObject {
    nodes: Vec<Vec<Property>>,
    children: Vec<ParsedObject>,
}

#[derive(Parser)]
#[grammar = "sgf.pest"]
struct SgfParser;

#[pest_consume::parser]
impl SgfParser {
    fn EOI(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn node_value(input: Node) -> ParseResult<String> {
        // raw bracket payload, escapes intact; decoding is per-property
        Ok(input.as_str().to_string())
    }

    fn prop_value(input: Node) -> ParseResult<String> {
        match_nodes!(input.into_children();
            [node_value(value)] => Ok(value)
        )
    }

    fn prop_ident(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn property(input: Node) -> ParseResult<Property> {
        let span = input.as_span();
        let err = |e: &dyn Display| to_parse_err(e, span.clone());
        let mut children = input.into_children();

        let ident_node = children.next().expect("property must have prop_ident");
        let ident = Self::prop_ident(ident_node)?;

        let values: Vec<String> = children
            .map(|n| Self::prop_value(n))
            .collect::<ParseResult<Vec<_>>>()?;

        Property::from_values(&ident, values).map_err(|e| err(&e))
    }

    fn node(input: Node) -> ParseResult<Vec<Property>> {
        match_nodes!(input.into_children();
            [property(props)..] => Ok(props.collect())
        )
    }

    fn object(input: Node) -> ParseResult<ParsedObject> {
        let mut nodes: Vec<Vec<Property>> = Vec::new();
        let mut children: Vec<ParsedObject> = Vec::new();

        for child in input.into_children() {
            match child.as_rule() {
                Rule::node => nodes.push(Self::node(child)?),
                Rule::object => children.push(Self::object(child)?),
                _ => {}
            }
        }

        Ok(ParsedObject { nodes, children })
    }

    fn file(input: Node) -> ParseResult<Vec<ParsedObject>> {
        match_nodes!(input.into_children();
            [object(trees).., EOI(_)] => Ok(trees.collect())
        )
    }
}

fn to_parse_err(e: impl Display, span: pest::Span) -> pest_consume::Error<Rule> {
    pest_consume::Error::new_from_span(
        pest::error::ErrorVariant::CustomError { message: e.to_string() },
        span,
    )
}

impl ParsedObject {
    /// Collapse one grammar object into a tree node: the node sequence
    /// becomes a single-child chain and the child objects hang off the
    /// last node of the chain.
    fn into_node(self) -> GameNode {
        let children: Vec<GameNode> = self.children.into_iter().map(|c| c.into_node()).collect();

        let mut props_rev = self.nodes.into_iter().rev();
        let last = props_rev.next().expect("object must have at least one node");
        let mut node = GameNode {
            properties: last,
            children,
        };
        for properties in props_rev {
            node = GameNode {
                properties,
                children: vec![node],
            };
        }
        node
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn parse_sgf(input: &str) -> Result<Collection, ParseError> {
    debug!(len = input.len(), "parsing SGF collection");
    let inputs = SgfParser::parse(Rule::file, input).map_err(ParseError::from)?;
    let input = inputs.single().map_err(ParseError::from)?;
    let objects = SgfParser::file(input).map_err(ParseError::from)?;
    Ok(Collection::new(
        objects.into_iter().map(|o| o.into_node()).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::types::Move;

    #[test]
    fn minimal_collection() {
        let collection = parse_sgf("(;FF[4]GM[1]SZ[9])").unwrap();
        assert_eq!(collection.games.len(), 1);
        let root = &collection.games[0];
        assert_eq!(root.properties.len(), 3);
        assert!(root.children.is_empty());
    }

    #[test]
    fn sequence_becomes_chain() {
        let collection = parse_sgf("(;SZ[19];B[dd];W[pd])").unwrap();
        let root = &collection.games[0];
        assert_eq!(root.children.len(), 1);
        let b = &root.children[0];
        assert_eq!(b.properties, vec![Property::B(Move::Play("dd".parse().unwrap()))]);
        assert_eq!(b.children.len(), 1);
    }

    #[test]
    fn variations_attach_to_last_sequence_node() {
        let collection = parse_sgf("(;SZ[19];B[dd](;W[pd])(;W[dp]))").unwrap();
        let b = &collection.games[0].children[0];
        assert_eq!(b.children.len(), 2);
    }

    #[test]
    fn multiple_games() {
        let collection = parse_sgf("(;SZ[9];B[aa]) (;SZ[13])").unwrap();
        assert_eq!(collection.games.len(), 2);
    }

    #[test]
    fn whitespace_between_tokens() {
        let collection = parse_sgf("  ( ;\nSZ [9]\tB\r\n[aa] )  ").unwrap();
        let root = &collection.games[0];
        assert_eq!(root.properties.len(), 2);
    }

    #[test]
    fn escaped_bracket_in_comment() {
        let collection = parse_sgf("(;C[a \\] bracket])").unwrap();
        match collection.games[0].find_property("C") {
            Some(Property::C(text)) => assert_eq!(text.as_str(), "a ] bracket"),
            other => panic!("expected C, got {:?}", other),
        }
    }

    #[test]
    fn unknown_property_accepted() {
        let collection = parse_sgf("(;ZZ[anything goes]SZ[9])").unwrap();
        let root = &collection.games[0];
        assert!(matches!(
            root.find_property("ZZ"),
            Some(Property::Unknown(_, _))
        ));
    }

    #[test]
    fn malformed_payload_fails_whole_collection() {
        let err = parse_sgf("(;SZ[nineteen])").unwrap_err();
        assert!(err.offset > 0);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert!(parse_sgf("(;SZ[9]").is_err());
        assert!(parse_sgf("").is_err());
    }
}
