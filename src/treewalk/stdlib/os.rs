use std::{
    env, fs,
    path::{Path, PathBuf, MAIN_SEPARATOR_STR},
};

use crate::{
    core::Container,
    treewalk::{
        types::{BuiltinFn, Dict, Exception, Module},
        utils::{check_args, Args},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

use super::new_module;

static FUNCTIONS: [(&str, BuiltinFn); 3] = [
    ("getcwd", getcwd),
    ("getenv", getenv),
    ("listdir", listdir),
];

static PATH_FUNCTIONS: [(&str, BuiltinFn); 11] = [
    ("abspath", abspath),
    ("basename", basename),
    ("dirname", dirname),
    ("exists", exists),
    ("expanduser", expanduser),
    ("isabs", isabs),
    ("isdir", isdir),
    ("isfile", isfile),
    ("join", join),
    ("split", split),
    ("splitext", splitext),
];

/// `os`, with `os.path` attached and cached so `import os.path` finds the same module.
pub(super) fn module(interpreter: &TreewalkInterpreter) -> Module {
    let mut module = new_module("os", &FUNCTIONS);
    module.insert("sep", TreewalkValue::str(MAIN_SEPARATOR_STR));
    module.insert("linesep", TreewalkValue::str(if cfg!(windows) { "\r\n" } else { "\n" }));
    module.insert("name", TreewalkValue::str(if cfg!(windows) { "nt" } else { "posix" }));

    let mut environ = Dict::default();
    for (key, value) in env::vars() {
        // String keys are always hashable.
        let _ = environ.insert(TreewalkValue::Str(key), TreewalkValue::Str(value));
    }
    module.insert("environ", TreewalkValue::new_dict(environ));

    let path = Container::new(path_module());
    interpreter.state.insert_native_module(path.clone());
    module.insert("path", TreewalkValue::Module(path));
    module
}

pub(super) fn path_module() -> Module {
    let mut module = new_module("os.path", &PATH_FUNCTIONS);
    module.insert("sep", TreewalkValue::str(MAIN_SEPARATOR_STR));
    module
}

fn path_arg(interpreter: &TreewalkInterpreter, args: &Args, name: &str) -> TreewalkResult<String> {
    check_args(args, name, 1, 1, &[]).raise(interpreter)?;
    args.get_arg(0).as_str().raise(interpreter)
}

fn path_str(path: &Path) -> TreewalkValue {
    TreewalkValue::Str(path.to_string_lossy().into_owned())
}

fn getcwd(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "getcwd", 0, 0, &[]).raise(interpreter)?;
    let cwd = env::current_dir()
        .map_err(|e| Exception::os_error(e.to_string()))
        .raise(interpreter)?;
    Ok(path_str(&cwd))
}

fn getenv(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "getenv", 1, 2, &["default"]).raise(interpreter)?;
    let key = args.get_arg(0).as_str().raise(interpreter)?;
    match env::var(&key) {
        Ok(value) => Ok(TreewalkValue::Str(value)),
        Err(_) => Ok(args
            .get_kwarg("default")
            .unwrap_or_else(|| args.get_arg(1))),
    }
}

fn listdir(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "listdir", 0, 1, &[]).raise(interpreter)?;
    let dir = match args.get_arg_opt(0) {
        Some(dir) => dir.as_str().raise(interpreter)?,
        None => ".".to_string(),
    };
    let entries = fs::read_dir(&dir)
        .map_err(|e| Exception::os_error(format!("{e}: '{dir}'")))
        .raise(interpreter)?;
    let mut names = vec![];
    for entry in entries {
        let entry = entry
            .map_err(|e| Exception::os_error(e.to_string()))
            .raise(interpreter)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(TreewalkValue::new_list(
        names.into_iter().map(TreewalkValue::Str).collect(),
    ))
}

fn join(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "join", 1, usize::MAX, &[]).raise(interpreter)?;
    let mut joined = PathBuf::new();
    for part in args.positional() {
        joined.push(part.as_str().raise(interpreter)?);
    }
    Ok(path_str(&joined))
}

fn exists(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "exists")?;
    Ok(TreewalkValue::Bool(Path::new(&path).exists()))
}

fn isfile(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "isfile")?;
    Ok(TreewalkValue::Bool(Path::new(&path).is_file()))
}

fn isdir(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "isdir")?;
    Ok(TreewalkValue::Bool(Path::new(&path).is_dir()))
}

fn isabs(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "isabs")?;
    Ok(TreewalkValue::Bool(Path::new(&path).is_absolute()))
}

/// Split at the last separator. Unlike `Path::parent`, a trailing separator leaves an empty tail.
fn split_at_separator(path: &str) -> (&str, &str) {
    match path.rfind(std::path::is_separator) {
        Some(0) => (&path[..1], &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

fn basename(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "basename")?;
    Ok(TreewalkValue::str(split_at_separator(&path).1))
}

fn dirname(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "dirname")?;
    Ok(TreewalkValue::str(split_at_separator(&path).0))
}

fn split(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "split")?;
    let (head, tail) = split_at_separator(&path);
    Ok(TreewalkValue::new_tuple(vec![
        TreewalkValue::str(head),
        TreewalkValue::str(tail),
    ]))
}

fn splitext(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "splitext")?;
    let name_start = path.len() - split_at_separator(&path).1.len();
    let name = &path[name_start..];
    // A leading dot names a hidden file, not an extension.
    let dot = name
        .trim_start_matches('.')
        .rfind('.')
        .map(|i| name_start + (name.len() - name.trim_start_matches('.').len()) + i);
    let (root, ext) = match dot {
        Some(i) => (&path[..i], &path[i..]),
        None => (path.as_str(), ""),
    };
    Ok(TreewalkValue::new_tuple(vec![
        TreewalkValue::str(root),
        TreewalkValue::str(ext),
    ]))
}

fn expanduser(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = path_arg(interpreter, &args, "expanduser")?;
    let expanded = match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(""), Some(home)) => path_str(&home),
        (Some(rest), Some(home)) if rest.starts_with(std::path::is_separator) => {
            path_str(&home.join(&rest[1..]))
        }
        _ => TreewalkValue::Str(path.clone()),
    };
    Ok(expanded)
}

fn abspath(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let path = PathBuf::from(path_arg(interpreter, &args, "abspath")?);
    let absolute = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .map_err(|e| Exception::os_error(e.to_string()))
            .raise(interpreter)?
            .join(path)
    };
    // Lexical normalization only; symlinks are not resolved.
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(path_str(&normalized))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    fn call(func: BuiltinFn, path: &str) -> TreewalkValue {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        func(&interpreter, args![path.into()]).unwrap()
    }

    fn pair(a: &str, b: &str) -> TreewalkValue {
        TreewalkValue::new_tuple(vec![a.into(), b.into()])
    }

    #[test]
    fn path_splitting() {
        assert_eq!(call(basename, "/srv/plugins/tool.py"), TreewalkValue::str("tool.py"));
        assert_eq!(call(dirname, "/srv/plugins/tool.py"), TreewalkValue::str("/srv/plugins"));
        assert_eq!(call(dirname, "/tool.py"), TreewalkValue::str("/"));
        assert_eq!(call(split, "plugins/"), pair("plugins", ""));
        assert_eq!(call(splitext, "/srv/tool.tar.gz"), pair("/srv/tool.tar", ".gz"));
        assert_eq!(call(splitext, "/srv/.bashrc"), pair("/srv/.bashrc", ""));
        assert_eq!(call(abspath, "/srv/a/../b/./c"), TreewalkValue::str("/srv/b/c"));
    }

    #[test]
    fn joining() {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        let joined = join(&interpreter, args!["/srv".into(), "plugins".into(), "tool.py".into()]);
        assert_eq!(joined.unwrap(), TreewalkValue::str("/srv/plugins/tool.py"));
        let absolute = join(&interpreter, args!["/srv".into(), "/etc".into()]);
        assert_eq!(absolute.unwrap(), TreewalkValue::str("/etc"));
    }

    #[test]
    fn os_path_is_cached() {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        let os = module(&interpreter);
        let Some(TreewalkValue::Module(path)) = os.get("path") else {
            panic!("os.path missing");
        };
        let cached = interpreter
            .state
            .native_module(path.borrow().name())
            .unwrap();
        assert!(cached.same_identity(&path));
    }
}
