mod builtin_function;
mod class;
mod descriptor;
mod dict;
mod exception;
mod function;
mod list;
mod method;
mod module;
mod object;
mod range;
mod slice;
mod tuple;
mod typing;

pub use builtin_function::{BuiltinFn, BuiltinFunction};
pub use class::Class;
pub use descriptor::{Classmethod, Property, Staticmethod, Super};
pub use dict::Dict;
pub use exception::Exception;
pub use function::{Function, FunctionParam, FunctionSignature};
pub use list::List;
pub use method::Method;
pub use module::Module;
pub use object::Object;
pub use range::Range;
pub use slice::Slice;
pub use tuple::Tuple;
pub use typing::{render_annotation, GenericAlias, SpecialForm, UnionType};
