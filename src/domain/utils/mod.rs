mod index;
mod repr;

pub use index::resolve_index;
pub use repr::{bytes_repr, comma_separated};
