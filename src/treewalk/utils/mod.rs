mod args;
mod bind_args;
mod environment_frame;
mod format;
mod hash_key;

pub(crate) use args::args;
pub use args::{check_args, check_arity, Args};
pub use bind_args::bind_args;
pub use environment_frame::EnvironmentFrame;
pub use format::{format_float, format_with_spec, repr_str};
pub use hash_key::HashKey;
