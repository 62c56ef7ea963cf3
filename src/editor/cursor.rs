use tracing::trace;

use crate::sgf::{
    board::{BoardState, root_board_state},
    node::GameNode,
    property::Property,
    types::{Color, Move},
};

/// A position in a game tree with the derived board at every visited
/// ancestor.
///
/// The cursor owns its copy of the tree (taking a root by value), so edits
/// through [`Cursor::modify_node`] never touch a tree the caller retained.
/// It keeps an index path from the root to the current node and exactly one
/// cached [`BoardState`] per depth; moving up drops the deepest board,
/// moving down derives the next one from the current board.
pub struct Cursor {
    root: GameNode,
    path: Vec<usize>,
    boards: Vec<BoardState>,
}

impl Cursor {
    pub fn new(root: GameNode) -> Self {
        let board = root_board_state(&root);
        Self {
            root,
            path: Vec::new(),
            boards: vec![board],
        }
    }

    fn node_at<'a>(root: &'a GameNode, path: &[usize]) -> &'a GameNode {
        let mut node = root;
        for &idx in path {
            node = &node.children[idx];
        }
        node
    }

    fn node_at_mut<'a>(root: &'a mut GameNode, path: &[usize]) -> &'a mut GameNode {
        let mut node = root;
        for &idx in path {
            node = &mut node.children[idx];
        }
        node
    }

    /// The node the cursor is sitting on.
    pub fn node(&self) -> &GameNode {
        Self::node_at(&self.root, &self.path)
    }

    /// The board derived for the current node.
    pub fn board(&self) -> &BoardState {
        &self.boards[self.path.len()]
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Child indices from the root down to the current node.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Move to the nth child. Returns `false` if the index is out of range.
    pub fn branch(&mut self, idx: usize) -> bool {
        let board = {
            let node = self.node();
            match node.children.get(idx) {
                Some(child) => self.board().child_board(child),
                None => return false,
            }
        };
        self.path.push(idx);
        self.boards.push(board);
        true
    }

    /// Move to the first child. Returns `false` if already at a leaf.
    pub fn advance(&mut self) -> bool {
        self.branch(0)
    }

    /// Move to the parent. Returns `false` if already at the root.
    pub fn retreat(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        self.path.pop();
        self.boards.pop();
        true
    }

    /// Move all the way back to the root.
    pub fn rewind(&mut self) {
        while self.retreat() {}
    }

    /// Boards for all children of the current node, each derived from the
    /// same base.
    pub fn child_boards(&self) -> Vec<BoardState> {
        let board = self.board();
        self.node()
            .children
            .iter()
            .map(|child| board.child_board(child))
            .collect()
    }

    /// The first child whose move property plays `mv` for the player whose
    /// turn it is.
    pub fn child_playing_at(&self, mv: &Move) -> Option<usize> {
        let color = self.board().player_turn;
        self.node().children.iter().position(|child| {
            child.properties.iter().any(|p| match (color, p) {
                (Color::Black, Property::B(m)) | (Color::White, Property::W(m)) => m == mv,
                _ => false,
            })
        })
    }

    /// Edit the current node in place and recompute its board. Ancestors
    /// and siblings are untouched; the change is immediately visible from
    /// [`Cursor::root`].
    pub fn modify_node(&mut self, f: impl FnOnce(&mut GameNode)) {
        f(Self::node_at_mut(&mut self.root, &self.path));
        trace!(depth = self.path.len(), "node modified, recomputing board");

        let depth = self.path.len();
        let board = if depth == 0 {
            root_board_state(&self.root)
        } else {
            let node = Self::node_at(&self.root, &self.path);
            self.boards[depth - 1].child_board(node)
        };
        self.boards.truncate(depth);
        self.boards.push(board);
    }

    /// The (possibly edited) root of the tree this cursor walks.
    pub fn root(&self) -> &GameNode {
        &self.root
    }

    pub fn into_root(self) -> GameNode {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgf::parse_sgf;
    use crate::sgf::types::Coord;

    fn coord(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn cursor_over(sgf: &str) -> Cursor {
        let collection = parse_sgf(sgf).unwrap();
        Cursor::new(collection.games.into_iter().next().unwrap())
    }

    #[test]
    fn root_cursor_board_matches_root_board_state() {
        let collection = parse_sgf("(;FF[4]GM[1]SZ[9])").unwrap();
        let root = collection.games[0].clone();
        let cursor = Cursor::new(root.clone());
        assert_eq!(*cursor.board(), root_board_state(&root));
    }

    #[test]
    fn boards_track_the_path() {
        let mut cursor = cursor_over("(;SZ[9];B[aa];W[bb])");
        assert_eq!(cursor.board().move_number, 0);
        assert!(cursor.advance());
        assert_eq!(cursor.board().move_number, 1);
        assert!(cursor.advance());
        assert_eq!(cursor.board().move_number, 2);
        assert_eq!(cursor.board().stone(coord("bb")), Some(Color::White));
        assert!(cursor.retreat());
        assert_eq!(cursor.board().move_number, 1);
        assert_eq!(cursor.board().stone(coord("bb")), None);
    }

    #[test]
    fn down_then_up_returns_to_the_same_node() {
        let mut cursor = cursor_over("(;SZ[9];B[aa](;W[bb])(;W[cc]))");
        let start = cursor.node().clone();
        assert!(cursor.advance());
        assert!(cursor.branch(1));
        cursor.rewind();
        assert_eq!(*cursor.node(), start);
    }

    #[test]
    fn navigation_at_edges_is_a_noop() {
        let mut cursor = cursor_over("(;SZ[9];B[aa])");
        assert!(!cursor.retreat());
        assert!(cursor.advance());
        assert!(!cursor.advance());
        assert!(!cursor.branch(5));
        assert_eq!(cursor.depth(), 1);
    }

    #[test]
    fn child_playing_at_matches_turn_color() {
        let mut cursor = cursor_over("(;SZ[9];B[aa](;W[bb])(;W[cc])(;B[cc]))");
        cursor.advance();
        // white to move: the B[cc] child does not count
        assert_eq!(cursor.child_playing_at(&Move::Play(coord("cc"))), Some(1));
        assert_eq!(cursor.child_playing_at(&Move::Play(coord("zz"))), None);
    }

    #[test]
    fn child_playing_at_finds_pass() {
        let cursor = cursor_over("(;SZ[9](;B[aa])(;B[]))");
        assert_eq!(cursor.child_playing_at(&Move::Pass), Some(1));
    }

    #[test]
    fn modify_node_updates_board_and_root() {
        let mut cursor = cursor_over("(;SZ[9];B[aa];W[bb];B[cc])");
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.depth(), 3);

        cursor.modify_node(|node| {
            node.set_property(Property::C(crate::sgf::types::Text::new("branch point")))
        });
        assert!(cursor.node().find_property("C").is_some());

        // the edit is visible from the root at the original path
        let edited = &cursor.root().children[0].children[0].children[0];
        assert!(edited.find_property("C").is_some());
        // siblings and ancestors otherwise unchanged
        assert_eq!(cursor.root().properties, vec![Property::SZ(9, 9)]);
    }

    #[test]
    fn modify_node_leaves_caller_tree_alone() {
        let collection = parse_sgf("(;SZ[9];B[aa])").unwrap();
        let original = collection.games[0].clone();
        let mut cursor = Cursor::new(collection.games[0].clone());
        cursor.advance();
        cursor.modify_node(|node| node.remove_property("B"));
        assert_eq!(collection.games[0], original);
        assert_ne!(*cursor.root(), original);
    }

    #[test]
    fn modify_root_recomputes_from_scratch() {
        let mut cursor = cursor_over("(;SZ[9])");
        assert_eq!(cursor.board().width(), 9);
        cursor.modify_node(|node| node.set_property(Property::SZ(13, 13)));
        assert_eq!(cursor.board().width(), 13);
    }

    #[test]
    fn modified_board_reflects_added_stones() {
        let mut cursor = cursor_over("(;SZ[9];B[aa])");
        cursor.advance();
        cursor.modify_node(|node| {
            node.set_property(Property::AW(crate::sgf::types::CoordList::from_coords([
                coord("ee"),
            ])))
        });
        assert_eq!(cursor.board().stone(coord("ee")), Some(Color::White));
        assert_eq!(cursor.board().stone(coord("aa")), Some(Color::Black));
    }

    #[test]
    fn child_boards_share_the_reset_base() {
        let mut cursor = cursor_over("(;SZ[9];B[aa]TR[aa](;W[bb])(;W[cc]))");
        cursor.advance();
        let boards = cursor.child_boards();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0].stone(coord("bb")), Some(Color::White));
        assert_eq!(boards[1].stone(coord("cc")), Some(Color::White));
        assert!(!boards[0].has_marks());
    }
}
