//! A tree-walking interpreter for the Python subset plugins are written in.

mod builtins;
mod interpreter;
mod raised_error;
mod registry;
mod result;
mod scope;
mod state;
pub mod stdlib;
#[cfg(test)]
pub mod test_utils;
pub mod types;
pub mod utils;
mod value;

pub use interpreter::{Frame, TreewalkInterpreter};
pub use raised_error::RaisedException;
pub use registry::ModuleRegistry;
pub use result::{DomainResult, Raise, TreewalkResult};
pub use scope::Scope;
pub use state::TreewalkState;
pub use value::TreewalkValue;
