mod cursor;
pub use cursor::Cursor;
