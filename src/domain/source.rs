use std::{
    io,
    path::{Path, PathBuf},
};

use crate::domain::Text;

/// Represents a Python source which comes from a file.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Source {
    path: PathBuf,
    size: u64,
    text: Text,
}

impl Source {
    pub fn from_path<P>(filepath: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(&filepath)?;
        let absolute_path = filepath.as_ref().canonicalize()?;
        Ok(Self::new(absolute_path, Text::new(&text)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes of the text as read from disk.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    /// The file name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn new(path: PathBuf, text: Text) -> Self {
        Self {
            path,
            size: text.len() as u64,
            text,
        }
    }
}
