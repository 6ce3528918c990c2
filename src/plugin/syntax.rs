use std::path::Path;

use tracing::debug;

use crate::{
    domain::Source,
    parser::{types::Ast, Parser},
    plugin::LoaderError,
};

/// Read a validated plugin file and parse it without executing anything.
pub fn parse_source(path: &Path) -> Result<(Source, Ast), LoaderError> {
    let source = Source::from_path(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ast = Parser::parse_text(source.text()).map_err(|e| LoaderError::Syntax {
        path: source.path().to_path_buf(),
        line: e.line(),
        message: e.message(),
        source: e,
    })?;

    debug!(path = %source.path().display(), statements = ast.len(), "plugin source parsed");
    Ok((source, ast))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    use crate::plugin::ErrorKind;

    #[test]
    fn parses_valid_source() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tool.py");
        fs::write(&file, "def run():\n    return 1\n").unwrap();

        let (source, ast) = parse_source(&file).unwrap();
        assert_eq!(source.stem(), "tool");
        assert_eq!(ast.len(), 1);
    }

    #[test]
    fn reports_the_failing_line() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.py");
        fs::write(&file, "x = 1\ndef run(:\n    pass\n").unwrap();

        let e = parse_source(&file).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Syntax);
        let LoaderError::Syntax { line, .. } = e else {
            unreachable!();
        };
        assert_eq!(line, 2);
    }
}
