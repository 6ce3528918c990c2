mod container;
mod utils;

pub use container::{Container, WeakContainer};
pub use utils::floats_equal;
