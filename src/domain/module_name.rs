use std::fmt::{Display, Error, Formatter};

/// A resolved, absolute, dotted module name. This is the key a module is registered under and the
/// value of its `__name__`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(Vec<String>);

impl ModuleName {
    /// Returns `None` for an empty segment list or when any segment is empty.
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self(segments))
    }

    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Option<Self> {
        Self::new(segments.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// For names fixed in the interpreter itself, such as native modules.
    pub(crate) fn from_static(name: &'static str) -> Self {
        Self(name.split('.').map(|s| s.to_string()).collect())
    }

    pub fn from_dotted(s: &str) -> Option<Self> {
        Self::new(s.split('.').map(|s| s.to_string()).collect())
    }

    pub fn as_str(&self) -> String {
        self.0.join(".")
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn head(&self) -> &str {
        &self.0[0]
    }

    pub fn tail(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// A name with more than one segment lives inside a package.
    pub fn is_package_member(&self) -> bool {
        self.0.len() > 1
    }

    pub fn parent(&self) -> Option<ModuleName> {
        self.strip_last(1)
    }

    /// Removes `n` segments from the end of the module name.
    ///
    /// Returns `None` if removing `n` segments would erase the module name entirely.
    pub fn strip_last(&self, n: usize) -> Option<ModuleName> {
        if n >= self.0.len() {
            return None;
        }

        let new_len = self.0.len() - n;
        Some(ModuleName(self.0[..new_len].to_vec()))
    }

    /// Joins additional segments onto the module name (used for relative imports).
    pub fn join<I>(&self, tail: I) -> ModuleName
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut segments = self.0.clone();
        for s in tail {
            segments.push(s.as_ref().to_string());
        }
        ModuleName(segments)
    }

    /// Iterate from the full module name downward to its parents,
    /// excluding the full name itself.
    ///
    /// Example:
    ///   "a.b.c" -> yields ["a.b", "a"]
    pub fn parents(&self) -> impl DoubleEndedIterator<Item = ModuleName> + '_ {
        (1..self.0.len()).filter_map(move |n| self.strip_last(n))
    }
}

impl Display for ModuleName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.as_str())
    }
}

impl From<&ModuleName> for String {
    fn from(value: &ModuleName) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(segments: &[&str]) -> ModuleName {
        ModuleName::from_segments(segments).unwrap()
    }

    #[test]
    fn parents_of_three_segments() {
        let m = name(&["a", "b", "c"]);
        let parents: Vec<_> = m.parents().collect();

        assert_eq!(parents, vec![name(&["a", "b"]), name(&["a"])]);
    }

    #[test]
    fn parents_of_one_segment_is_empty() {
        let m = name(&["a"]);
        assert_eq!(m.parents().count(), 0);
    }

    #[test]
    fn parents_is_double_ended_iterator() {
        let m = name(&["x", "y", "z"]);
        let mut it = m.parents();

        assert_eq!(it.next(), Some(name(&["x", "y"])));
        assert_eq!(it.next_back(), Some(name(&["x"])));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn from_dotted() {
        assert_eq!(ModuleName::from_dotted("pkg.mod"), Some(name(&["pkg", "mod"])));
        assert_eq!(ModuleName::from_dotted(""), None);
        assert_eq!(ModuleName::from_dotted("pkg..mod"), None);
    }

    #[test]
    fn package_membership() {
        assert!(name(&["pkg", "plugin"]).is_package_member());
        assert!(!name(&["plugin"]).is_package_member());
    }

    #[test]
    fn parent_of_one_segment_is_none() {
        assert_eq!(name(&["a"]).parent(), None);
        assert_eq!(name(&["a", "b", "c"]).parent(), Some(name(&["a", "b"])));
    }
}
