use std::collections::HashSet;
use std::fmt::Write as _;

use crate::sgf::{
    node::{Collection, GameNode},
    property::{Property, PropertyCategory},
    types::{Coord, CoordList},
};

/// Serialise a whole [`Collection`] back to SGF text.
///
/// Each game tree is written as its own `(…)` record. Multiple records are
/// concatenated with no separator.
pub fn write_sgf(collection: &Collection) -> String {
    let mut out = String::new();
    for game in &collection.games {
        write_game(game, &mut out);
    }
    out
}

fn write_game(root: &GameNode, out: &mut String) {
    out.push('(');
    write_node(root, out);
    out.push(')');
}

/// Canonical in-node property order. The sort is stable, so properties of
/// equal rank keep their source order.
fn render_rank(property: &Property) -> u8 {
    match property.ident() {
        "BL" | "OB" | "OW" | "WL" => 8,
        _ => match property.category() {
            PropertyCategory::Root => 0,
            PropertyCategory::GameInfo => 1,
            PropertyCategory::Setup => 2,
            PropertyCategory::Move => 3,
            PropertyCategory::NodeAnnotation => 4,
            PropertyCategory::MoveAnnotation => 5,
            PropertyCategory::Markup => 6,
            PropertyCategory::Inherited => 7,
            PropertyCategory::Other => 9,
        },
    }
}

/// Write a single node (`;` followed by its properties) and then recurse.
///
/// Branching rules:
/// - **0 children** — nothing more to emit.
/// - **1 child** — continue inline (no extra parentheses).
/// - **2+ children** — each child is a separate variation, wrapped in `(…)`.
fn write_node(node: &GameNode, out: &mut String) {
    out.push(';');

    let mut properties: Vec<&Property> = node.properties.iter().collect();
    properties.sort_by_key(|p| render_rank(p));

    // AB/AW/AE may claim each point at most once per node; the first
    // property in render order wins.
    let mut claimed: HashSet<Coord> = HashSet::new();
    for property in properties {
        match property {
            Property::AB(list) | Property::AW(list) | Property::AE(list)
                if !list.is_empty() =>
            {
                let coords = list.expand();
                let kept: Vec<Coord> = coords
                    .iter()
                    .copied()
                    .filter(|c| claimed.insert(*c))
                    .collect();
                if kept.is_empty() {
                    continue;
                }
                if kept.len() == coords.len() {
                    write_property(property, out);
                } else {
                    let rebuilt = match property {
                        Property::AB(_) => Property::AB(CoordList::from_coords(kept)),
                        Property::AW(_) => Property::AW(CoordList::from_coords(kept)),
                        _ => Property::AE(CoordList::from_coords(kept)),
                    };
                    write_property(&rebuilt, out);
                }
            }
            _ => write_property(property, out),
        }
    }

    match node.children.len() {
        0 => {}
        1 => write_node(&node.children[0], out),
        _ => {
            for child in &node.children {
                out.push('(');
                write_node(child, out);
                out.push(')');
            }
        }
    }
}

fn write_property(property: &Property, out: &mut String) {
    write!(out, "{}", property).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::parser::parse_sgf;

    /// Parse → serialize → re-parse and check the trees match.
    #[test]
    fn round_trip_is_stable() {
        let sgf = "(;FF[4]GM[1]SZ[19];B[dd];W[pd];B[dp])";
        let first = parse_sgf(sgf).unwrap();
        let serialized = write_sgf(&first);
        assert_eq!(serialized, sgf);
        assert_eq!(parse_sgf(&serialized).unwrap(), first);
    }

    #[test]
    fn round_trip_with_variations() {
        let sgf = "(;FF[4]GM[1]SZ[19];B[dd](;W[pd])(;W[dp]))";
        let first = parse_sgf(sgf).unwrap();
        let serialized = write_sgf(&first);
        let second = parse_sgf(&serialized).unwrap();
        assert_eq!(first, second);
        let b_node = &second.games[0].children[0];
        assert_eq!(b_node.children.len(), 2);
    }

    #[test]
    fn round_trip_multiple_games() {
        let sgf = "(;SZ[9];B[aa])(;SZ[13])";
        let first = parse_sgf(sgf).unwrap();
        assert_eq!(parse_sgf(&write_sgf(&first)).unwrap(), first);
    }

    #[test]
    fn properties_emitted_in_canonical_order() {
        // B (move) written after SZ (root) and AB (setup) regardless of
        // source order.
        let collection = parse_sgf("(;B[aa]AB[cc]SZ[9])").unwrap();
        assert_eq!(write_sgf(&collection), "(;SZ[9]AB[cc]B[aa])");
    }

    #[test]
    fn compressed_lists_survive() {
        let collection = parse_sgf("(;SZ[9]AB[aa:bb])").unwrap();
        assert_eq!(write_sgf(&collection), "(;SZ[9]AB[aa:bb])");
    }

    #[test]
    fn setup_points_deduplicated() {
        // aa appears in both AB and AW; AB renders first and wins.
        let collection = parse_sgf("(;SZ[9]AB[aa][bb]AW[aa][cc])").unwrap();
        assert_eq!(write_sgf(&collection), "(;SZ[9]AB[aa][bb]AW[cc])");
    }

    #[test]
    fn fully_claimed_setup_property_omitted() {
        let collection = parse_sgf("(;SZ[9]AB[aa]AW[aa])").unwrap();
        assert_eq!(write_sgf(&collection), "(;SZ[9]AB[aa])");
    }

    #[test]
    fn escapes_regenerated() {
        let sgf = "(;C[bracket \\] and backslash \\\\])";
        let first = parse_sgf(sgf).unwrap();
        assert_eq!(parse_sgf(&write_sgf(&first)).unwrap(), first);
    }

    #[test]
    fn pass_renders_as_empty_brackets() {
        let collection = parse_sgf("(;SZ[19];B[])").unwrap();
        assert_eq!(write_sgf(&collection), "(;SZ[19];B[])");
    }
}
