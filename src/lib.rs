pub mod editor;
pub mod sgf;

pub use editor::Cursor;
pub use sgf::{Collection, GameNode, Property, parse_sgf, write_sgf};
