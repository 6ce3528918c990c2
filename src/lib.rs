//! Load Python source files as plugins.
//!
//! A plugin file is validated, parsed, and executed by an embedded interpreter for the subset of
//! Python plugins are written in. The resulting [`ModuleWrapper`] looks up callables and classes
//! by name, checks callables against an expected [`Contract`], invokes them with host [`Value`]s,
//! and reports which of the plugin's imports come from the standard library, from elsewhere on the
//! search path, or from nowhere.
//!
//! ```no_run
//! use modwrap::{Contract, ModuleWrapper, Value};
//!
//! let plugin = ModuleWrapper::new("plugins/shell.py", false)?;
//! plugin.validate_signature("execute", &Contract::from([("command", "str")]))?;
//! let output = plugin.get_callable("execute")?.call([Value::from("ls")])?;
//! println!("{}", output.repr());
//! # Ok::<(), modwrap::LoaderError>(())
//! ```
//!
//! Loading runs the plugin's top-level code with the privileges of the host process. Only load
//! files you trust.

mod core;
pub mod domain;
pub mod lexer;
pub mod parser;
pub mod plugin;
pub mod treewalk;

pub use domain::{ModuleName, Opaque, Value};
pub use plugin::{
    classify, Contract, ContractMismatch, Dependencies, ErrorKind, Loader, LoaderConfig,
    LoaderError, ModuleWrapper, Parameter, ParameterKind, PluginCallable, PluginClass, Signature,
};
