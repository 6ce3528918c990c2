/// Represents a finished piece of Python code (not in progress!).
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Text(String);

impl Text {
    pub fn new(text: &str) -> Self {
        Self(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
