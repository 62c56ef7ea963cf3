use crate::sgf::property::{Property, PropertyCategory};

/// A node in a game tree: an ordered list of properties and an ordered list
/// of owned child nodes. Branches are variations; the first child is the
/// main line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameNode {
    pub properties: Vec<Property>,
    pub children: Vec<GameNode>,
}

impl GameNode {
    /// An empty node, usable as a fresh game root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: Vec<Property>) -> Self {
        Self {
            properties,
            children: Vec::new(),
        }
    }

    /// The first property with the given identifier, if present.
    pub fn find_property(&self, ident: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.ident() == ident)
    }

    /// Insert a property, replacing an existing one with the same
    /// identifier.
    pub fn set_property(&mut self, property: Property) {
        let ident = property.ident().to_string();
        if let Some(existing) = self.properties.iter_mut().find(|p| p.ident() == ident) {
            *existing = property;
        } else {
            self.properties.push(property);
        }
    }

    /// Remove every property with the given identifier.
    pub fn remove_property(&mut self, ident: &str) {
        self.properties.retain(|p| p.ident() != ident);
    }

    /// Append a child and return its index.
    pub fn add_child(&mut self, child: GameNode) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// A node is a game-info node iff it carries any game-info property.
    pub fn has_game_info(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.category() == PropertyCategory::GameInfo)
    }
}

/// A parsed SGF file: one or more game trees in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    pub games: Vec<GameNode>,
}

impl Collection {
    pub fn new(games: Vec<GameNode>) -> Self {
        Self { games }
    }
}
