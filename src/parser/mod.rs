mod error;
#[allow(clippy::module_inception)]
mod parser;
#[cfg(test)]
pub mod test_utils;
mod token_buffer;
pub mod types;

pub use error::ParserError;
pub use parser::Parser;
pub use token_buffer::TokenBuffer;
