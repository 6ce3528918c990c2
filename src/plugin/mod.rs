//! Loading Python source files as plugins.
//!
//! A load runs in stages, each failing fast: the path is validated, the text is parsed, the
//! module's qualified name is derived from the project layout, and finally the module is
//! registered and executed. The resulting [`ModuleWrapper`] resolves callables and classes,
//! checks callables against a [`Contract`], and classifies the plugin's imports.

mod callable;
mod config;
mod dependencies;
mod error;
mod layout;
mod loader;
mod path;
mod signature;
mod syntax;
#[cfg(test)]
pub(crate) mod test_utils;
mod wrapper;

pub use callable::{PluginCallable, PluginClass};
pub use config::{LoaderConfig, DEFAULT_MAX_BYTES};
pub use dependencies::{classify, imported_names, Dependencies};
pub use error::{ContractMismatch, ErrorKind, LoaderError};
pub use layout::{find_project_root, qualified_name, QualifiedName};
pub use loader::{LoadedUnit, Loader};
pub use path::{validate_path, ValidatedPath};
pub use signature::{Contract, Parameter, ParameterKind, Signature, ANY};
pub use syntax::parse_source;
pub use wrapper::ModuleWrapper;
