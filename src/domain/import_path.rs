use crate::domain::Identifier;

/// A dotted module path as written in source, e.g. `os.path`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ModulePath(Vec<Identifier>);

impl ModulePath {
    pub fn new(segments: Vec<Identifier>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Identifier] {
        &self.0
    }

    pub fn segments_as_str(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.as_str()).collect()
    }

    pub fn head(&self) -> Option<&Identifier> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_dotted(&self) -> String {
        self.segments_as_str().join(".")
    }
}

/// The module part of a `from ... import` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FromImportPath {
    /// `from a.b import c`
    Absolute(ModulePath),
    /// `from ..a import b` is `Relative(2, a)`; `from . import b` is `Relative(1, <empty>)`.
    Relative(usize, ModulePath),
}

impl FromImportPath {
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Relative(..))
    }
}
