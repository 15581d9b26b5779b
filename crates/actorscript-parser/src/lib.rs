//! Actor script parser: converts a script buffer into commands.

mod error;
mod parser;
mod program;

pub use error::ParseError;
pub use parser::{ParseResult, Parser};
pub use program::ParsedScript;
