use std::{
    fmt::{Display, Error, Formatter},
    path::PathBuf,
};

/// One entry of a Python-level traceback.
#[derive(Debug, PartialEq, Clone)]
pub struct DebugStackFrame {
    pub name: String,
    pub path: PathBuf,
    pub line: usize,
}

impl DebugStackFrame {
    pub fn new(name: impl Into<String>, path: PathBuf, line: usize) -> Self {
        Self {
            name: name.into(),
            path,
            line,
        }
    }
}

impl Display for DebugStackFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "File \"{}\", line {}, in {}",
            self.path.display(),
            self.line,
            self.name
        )
    }
}

/// The call stack at the point an exception was raised, outermost frame first.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct DebugCallStack {
    frames: Vec<DebugStackFrame>,
}

impl DebugCallStack {
    pub fn new(frames: Vec<DebugStackFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[DebugStackFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost frame, where the exception originated.
    pub fn last(&self) -> Option<&DebugStackFrame> {
        self.frames.last()
    }
}

impl Display for DebugCallStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "Traceback (most recent call last):")?;
        for frame in &self.frames {
            writeln!(f, "  {frame}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traceback_rendering() {
        let stack = DebugCallStack::new(vec![
            DebugStackFrame::new("<module>", PathBuf::from("/plugins/tool.py"), 4),
            DebugStackFrame::new("execute", PathBuf::from("/plugins/tool.py"), 2),
        ]);
        assert_eq!(
            stack.to_string(),
            "Traceback (most recent call last):\n  File \"/plugins/tool.py\", line 4, in <module>\n  File \"/plugins/tool.py\", line 2, in execute\n"
        );
        assert_eq!(stack.last().map(|f| f.line), Some(2));
    }
}
