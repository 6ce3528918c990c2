use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::plugin::{LoaderConfig, LoaderError};

/// A plugin path that passed every filesystem check. The text has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    pub path: PathBuf,
    pub size: u64,
}

/// Normalize `raw` to a canonical path and check it names a source file the loader will accept.
/// Only metadata is touched.
pub fn validate_path(
    raw: &OsStr,
    allow_large: bool,
    config: &LoaderConfig,
) -> Result<ValidatedPath, LoaderError> {
    let Some(text) = raw.to_str() else {
        return Err(LoaderError::input("path is not valid UTF-8"));
    };
    if text.is_empty() {
        return Err(LoaderError::input("path is empty"));
    }
    if text.contains('\0') {
        return Err(LoaderError::input("path contains a NUL byte"));
    }

    let expanded = expand_home(text);
    let path = expanded.canonicalize().map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoaderError::FileNotFound {
            path: expanded.clone(),
        },
        _ => LoaderError::Io {
            path: expanded.clone(),
            source,
        },
    })?;

    let metadata = fs::metadata(&path).map_err(|source| LoaderError::Io {
        path: path.clone(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(LoaderError::NotAFile { path });
    }

    if path.extension().and_then(OsStr::to_str) != Some(config.source_extension.as_str()) {
        return Err(LoaderError::InvalidExtension {
            path,
            expected: config.source_extension.clone(),
        });
    }

    let size = metadata.len();
    if size > config.max_bytes && !allow_large {
        return Err(LoaderError::TooLarge {
            path,
            size,
            limit: config.max_bytes,
        });
    }

    debug!(path = %path.display(), size, "plugin path validated");
    Ok(ValidatedPath { path, size })
}

/// `~` and `~/rest` expand to the home directory. Anything else, including `~user`, is left as is.
fn expand_home(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with(std::path::is_separator) => {
            home.join(&rest[1..])
        }
        _ => Path::new(path).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    use crate::plugin::ErrorKind;

    fn validate(path: &Path, allow_large: bool, config: &LoaderConfig) -> Result<ValidatedPath, LoaderError> {
        validate_path(path.as_os_str(), allow_large, config)
    }

    #[test]
    fn accepts_a_source_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tool.py");
        fs::write(&file, "x = 1\n").unwrap();

        let validated = validate(&file, false, &LoaderConfig::default()).unwrap();
        assert_eq!(validated.path, file.canonicalize().unwrap());
        assert_eq!(validated.size, 6);
    }

    #[test]
    fn rejects_bad_input() {
        let config = LoaderConfig::default();
        let e = validate_path(OsStr::new(""), false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Input);

        let e = validate_path(OsStr::new("a\0b.py"), false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Input);
    }

    #[test]
    fn filesystem_checks() {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig::default();

        let e = validate(&dir.path().join("missing.py"), false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e = validate(dir.path(), false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotAFile);

        let text = dir.path().join("notes.txt");
        fs::write(&text, "").unwrap();
        let e = validate(&text, false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidExtension);
        assert!(e.to_string().ends_with("is not a .py file"));
    }

    #[test]
    fn size_ceiling() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.py");
        fs::write(&file, "# padding\n".repeat(10)).unwrap();
        let config = LoaderConfig {
            max_bytes: 50,
            ..LoaderConfig::default()
        };

        let e = validate(&file, false, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TooLarge);
        assert!(validate(&file, true, &config).is_ok());
    }

    #[test]
    fn home_expansion() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/plugins/a.py"), home.join("plugins/a.py"));
        assert_eq!(expand_home("~other/a.py"), PathBuf::from("~other/a.py"));
        assert_eq!(expand_home("/srv/a.py"), PathBuf::from("/srv/a.py"));
    }
}
