mod debug_call_stack;
mod dunder;
mod identifier;
mod import_path;
mod module_name;
mod origin;
mod resolved_module;
pub mod resolver;
mod source;
mod text;
mod types;
pub mod utils;
mod value;

pub use debug_call_stack::{DebugCallStack, DebugStackFrame};
pub use dunder::Dunder;
pub use identifier::Identifier;
pub use import_path::{FromImportPath, ModulePath};
pub use module_name::ModuleName;
pub use origin::ModuleOrigin;
pub use resolved_module::{ModuleLocation, ResolvedModule};
pub use source::Source;
pub use text::Text;
pub use types::Type;
pub use value::{Opaque, Value};
