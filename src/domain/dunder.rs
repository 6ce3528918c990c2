use std::{fmt::Display, ops::Deref};

/// The double-underscore names the interpreter reads or writes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dunder {
    Main,
    Name,
    Package,
    File,
    Doc,
    Module,
    Qualname,
    Init,
    Call,
    Str,
    Repr,
    All,
    Class,
    Builtins,
    Annotations,
}

impl Dunder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "__main__",
            Self::Name => "__name__",
            Self::Package => "__package__",
            Self::File => "__file__",
            Self::Doc => "__doc__",
            Self::Module => "__module__",
            Self::Qualname => "__qualname__",
            Self::Init => "__init__",
            Self::Call => "__call__",
            Self::Str => "__str__",
            Self::Repr => "__repr__",
            Self::All => "__all__",
            Self::Class => "__class__",
            Self::Builtins => "builtins",
            Self::Annotations => "__annotations__",
        }
    }

    /// The file name for this dunder when it names a module, e.g. `__init__.py`.
    pub fn py_file(&self) -> String {
        format!("{}.py", self.as_str())
    }
}

impl Deref for Dunder {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for Dunder {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for Dunder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Dunder> for String {
    fn from(value: Dunder) -> Self {
        value.as_str().to_string()
    }
}
