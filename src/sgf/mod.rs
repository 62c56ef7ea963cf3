pub mod board;
pub mod game_info;
pub mod node;
pub mod property;
pub mod types;
mod parser;
mod serializer;

pub use board::{BoardState, CoordState, DEFAULT_SIZE, MoveError, MoveParams, root_board_state};
pub use game_info::{GameInfo, RootInfo};
pub use node::{Collection, GameNode};
pub use parser::{ParseError, parse_sgf};
pub use property::{Property, PropertyCategory};
pub use serializer::write_sgf;
