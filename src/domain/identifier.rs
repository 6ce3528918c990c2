use std::{
    borrow::Borrow,
    fmt::{Display, Error, Formatter},
    ops::Deref,
};

/// A syntactically valid Python identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if Self::is_valid(&name) {
            Some(Self(name))
        } else {
            None
        }
    }

    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c == '_' || c.is_alphanumeric())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Identifier {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers() {
        assert!(Identifier::new("execute").is_some());
        assert!(Identifier::new("_private").is_some());
        assert!(Identifier::new("café").is_some());
    }

    #[test]
    fn invalid_identifiers() {
        assert!(Identifier::new("").is_none());
        assert!(Identifier::new("123").is_none());
        assert!(Identifier::new("my-plugin").is_none());
    }
}
