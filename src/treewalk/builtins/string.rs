use crate::treewalk::{
    types::{BuiltinFn, Exception, Slice},
    utils::{check_args, format_with_spec, Args},
    Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
};

pub(super) static METHODS: &[(&str, BuiltinFn)] = &[
    ("capitalize", capitalize),
    ("casefold", lower),
    ("center", center),
    ("count", count),
    ("encode", encode),
    ("endswith", endswith),
    ("find", find),
    ("format", format),
    ("index", index),
    ("isalnum", isalnum),
    ("isalpha", isalpha),
    ("isdigit", isdigit),
    ("isidentifier", isidentifier),
    ("islower", islower),
    ("isspace", isspace),
    ("isupper", isupper),
    ("join", join),
    ("ljust", ljust),
    ("lower", lower),
    ("lstrip", lstrip),
    ("partition", partition),
    ("removeprefix", removeprefix),
    ("removesuffix", removesuffix),
    ("replace", replace),
    ("rfind", rfind),
    ("rjust", rjust),
    ("rpartition", rpartition),
    ("rsplit", rsplit),
    ("rstrip", rstrip),
    ("split", split),
    ("splitlines", splitlines),
    ("startswith", startswith),
    ("strip", strip),
    ("swapcase", swapcase),
    ("title", title),
    ("upper", upper),
    ("zfill", zfill),
];

fn receiver(interpreter: &TreewalkInterpreter, args: &Args, name: &str) -> TreewalkResult<String> {
    match args.get_arg_opt(0) {
        Some(TreewalkValue::Str(s)) => Ok(s),
        Some(other) => Exception::type_error(format!(
            "descriptor '{name}' for 'str' objects doesn't apply to a '{}' object",
            other.type_name()
        ))
        .raise(interpreter),
        None => Exception::type_error(format!("unbound method str.{name}() needs an argument"))
            .raise(interpreter),
    }
}

fn str_arg(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    index: usize,
) -> TreewalkResult<Option<String>> {
    match args.get_arg_opt(index) {
        None | Some(TreewalkValue::None) => Ok(None),
        Some(value) => value.as_str().raise(interpreter).map(Some),
    }
}

fn int_arg(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    index: usize,
) -> TreewalkResult<Option<i64>> {
    match args.get_arg_opt(index) {
        None | Some(TreewalkValue::None) => Ok(None),
        Some(value) => value.as_int().raise(interpreter).map(Some),
    }
}

/// Apply a `str -> str` transformation to the receiver.
fn map_str(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    f: impl FnOnce(&str) -> String,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, 1, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    Ok(TreewalkValue::Str(f(&s)))
}

/// Apply a character predicate to the receiver; empty strings are never matched.
fn test_str(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    f: impl Fn(char) -> bool,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, 1, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    Ok(TreewalkValue::Bool(!s.is_empty() && s.chars().all(f)))
}

fn capitalize(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    map_str(interpreter, args, "capitalize", |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
}

fn lower(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    map_str(interpreter, args, "lower", str::to_lowercase)
}

fn upper(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    map_str(interpreter, args, "upper", str::to_uppercase)
}

fn swapcase(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    map_str(interpreter, args, "swapcase", |s| {
        s.chars()
            .flat_map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<Vec<_>>()
                } else {
                    c.to_uppercase().collect::<Vec<_>>()
                }
            })
            .collect()
    })
}

fn title(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    map_str(interpreter, args, "title", |s| {
        let mut out = String::with_capacity(s.len());
        let mut previous_cased = false;
        for c in s.chars() {
            if previous_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_cased = c.is_alphabetic();
        }
        out
    })
}

fn isalnum(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    test_str(interpreter, args, "isalnum", char::is_alphanumeric)
}

fn isalpha(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    test_str(interpreter, args, "isalpha", char::is_alphabetic)
}

fn isdigit(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    test_str(interpreter, args, "isdigit", |c| c.is_ascii_digit())
}

fn isspace(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    test_str(interpreter, args, "isspace", char::is_whitespace)
}

fn islower(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "islower", 1, 1, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "islower")?;
    Ok(TreewalkValue::Bool(
        s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase),
    ))
}

fn isupper(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isupper", 1, 1, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "isupper")?;
    Ok(TreewalkValue::Bool(
        s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase),
    ))
}

fn isidentifier(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isidentifier", 1, 1, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "isidentifier")?;
    let mut chars = s.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first == '_' || first.is_alphabetic())
                && chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        None => false,
    };
    Ok(TreewalkValue::Bool(valid))
}

fn pad(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    place: fn(&str, usize, char) -> String,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 2, 3, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    let width = args.get_arg(1).as_int().raise(interpreter)?;
    let fill = match str_arg(interpreter, &args, 2)? {
        Some(fill) if fill.chars().count() == 1 => fill.chars().next().unwrap_or(' '),
        Some(_) => {
            return Exception::type_error("The fill character must be exactly one character long")
                .raise(interpreter)
        }
        None => ' ',
    };
    let missing = (width.max(0) as usize).saturating_sub(s.chars().count());
    Ok(TreewalkValue::Str(place(&s, missing, fill)))
}

fn center(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    pad(interpreter, args, "center", |s, missing, fill| {
        // The odd padding character goes left when the target width is odd.
        let width = missing + s.chars().count();
        let left = missing / 2 + (missing & width & 1);
        let right = missing - left;
        format!(
            "{}{s}{}",
            fill.to_string().repeat(left),
            fill.to_string().repeat(right)
        )
    })
}

fn ljust(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    pad(interpreter, args, "ljust", |s, missing, fill| {
        format!("{s}{}", fill.to_string().repeat(missing))
    })
}

fn rjust(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    pad(interpreter, args, "rjust", |s, missing, fill| {
        format!("{}{s}", fill.to_string().repeat(missing))
    })
}

fn zfill(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "zfill", 2, 2, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "zfill")?;
    let width = args.get_arg(1).as_int().raise(interpreter)?;
    let missing = (width.max(0) as usize).saturating_sub(s.chars().count());
    let zeros = "0".repeat(missing);
    Ok(TreewalkValue::Str(match s.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{zeros}{}", &s[1..]),
        _ => format!("{zeros}{s}"),
    }))
}

/// The receiver restricted to optional `start`/`end` arguments at `index` and `index + 1`,
/// returned with the character offset of its start.
fn window(
    interpreter: &TreewalkInterpreter,
    s: &str,
    args: &Args,
    index: usize,
) -> TreewalkResult<(String, usize)> {
    let len = s.chars().count();
    let (start, end) = Slice::new(
        int_arg(interpreter, args, index)?,
        int_arg(interpreter, args, index + 1)?,
        None,
    )
    .bounds(len);
    Ok((s.chars().skip(start).take(end - start).collect(), start))
}

fn char_offset(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset].chars().count()
}

fn count(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "count", 2, 4, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "count")?;
    let needle = args.get_arg(1).as_str().raise(interpreter)?;
    let (haystack, _) = window(interpreter, &s, &args, 2)?;
    let found = if needle.is_empty() {
        haystack.chars().count() + 1
    } else {
        haystack.matches(needle.as_str()).count()
    };
    Ok(TreewalkValue::Int(found as i64))
}

fn search(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    name: &str,
    from_end: bool,
) -> TreewalkResult<Option<usize>> {
    check_args(args, name, 2, 4, &[]).raise(interpreter)?;
    let s = receiver(interpreter, args, name)?;
    let needle = args.get_arg(1).as_str().raise(interpreter)?;
    let (haystack, offset) = window(interpreter, &s, args, 2)?;
    let found = if from_end {
        haystack.rfind(needle.as_str())
    } else {
        haystack.find(needle.as_str())
    };
    Ok(found.map(|byte| offset + char_offset(&haystack, byte)))
}

fn find(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let found = search(interpreter, &args, "find", false)?;
    Ok(TreewalkValue::Int(found.map_or(-1, |i| i as i64)))
}

fn rfind(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let found = search(interpreter, &args, "rfind", true)?;
    Ok(TreewalkValue::Int(found.map_or(-1, |i| i as i64)))
}

fn index(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    match search(interpreter, &args, "index", false)? {
        Some(i) => Ok(TreewalkValue::Int(i as i64)),
        None => Exception::value_error("substring not found").raise(interpreter),
    }
}

fn affix_test(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    test: fn(&str, &str) -> bool,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 2, 4, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    let (scope, _) = window(interpreter, &s, &args, 2)?;
    let candidates = match args.get_arg(1) {
        TreewalkValue::Str(affix) => vec![affix],
        TreewalkValue::Tuple(affixes) => affixes
            .iter()
            .map(|a| a.as_str())
            .collect::<Result<Vec<_>, _>>()
            .raise(interpreter)?,
        other => {
            return Exception::type_error(format!(
                "{name} first arg must be str or a tuple of str, not {}",
                other.type_name()
            ))
            .raise(interpreter)
        }
    };
    Ok(TreewalkValue::Bool(
        candidates.iter().any(|affix| test(&scope, affix)),
    ))
}

fn startswith(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    affix_test(interpreter, args, "startswith", |s, affix| s.starts_with(affix))
}

fn endswith(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    affix_test(interpreter, args, "endswith", |s, affix| s.ends_with(affix))
}

fn removeprefix(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "removeprefix", 2, 2, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "removeprefix")?;
    let prefix = args.get_arg(1).as_str().raise(interpreter)?;
    Ok(TreewalkValue::str(s.strip_prefix(prefix.as_str()).unwrap_or(&s)))
}

fn removesuffix(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "removesuffix", 2, 2, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "removesuffix")?;
    let suffix = args.get_arg(1).as_str().raise(interpreter)?;
    Ok(TreewalkValue::str(s.strip_suffix(suffix.as_str()).unwrap_or(&s)))
}

fn encode(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "encode", 1, 3, &["encoding", "errors"]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "encode")?;
    Ok(TreewalkValue::Bytes(s.into_bytes()))
}

fn join(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "join", 2, 2, &[]).raise(interpreter)?;
    let separator = receiver(interpreter, &args, "join")?;
    let mut parts = vec![];
    for (i, item) in interpreter.iterate(&args.get_arg(1))?.into_iter().enumerate() {
        match item {
            TreewalkValue::Str(s) => parts.push(s),
            other => {
                return Exception::type_error(format!(
                    "sequence item {i}: expected str instance, {} found",
                    other.type_name()
                ))
                .raise(interpreter)
            }
        }
    }
    Ok(TreewalkValue::Str(parts.join(&separator)))
}

fn replace(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "replace", 3, 4, &["count"]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "replace")?;
    let old = args.get_arg(1).as_str().raise(interpreter)?;
    let new = args.get_arg(2).as_str().raise(interpreter)?;
    let limit = match args.get_kwarg("count") {
        Some(count) => Some(count.as_int().raise(interpreter)?),
        None => int_arg(interpreter, &args, 3)?,
    };
    Ok(TreewalkValue::Str(match limit {
        Some(n) if n >= 0 => s.replacen(old.as_str(), &new, n as usize),
        _ => s.replace(old.as_str(), &new),
    }))
}

fn strip_with(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    strip: fn(&str, &[char]) -> String,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, 2, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    Ok(TreewalkValue::Str(match str_arg(interpreter, &args, 1)? {
        Some(chars) => strip(&s, &chars.chars().collect::<Vec<_>>()),
        None => strip(&s, &[]),
    }))
}

fn strip(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    strip_with(interpreter, args, "strip", |s, chars| match chars {
        [] => s.trim().to_string(),
        chars => s.trim_matches(chars).to_string(),
    })
}

fn lstrip(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    strip_with(interpreter, args, "lstrip", |s, chars| match chars {
        [] => s.trim_start().to_string(),
        chars => s.trim_start_matches(chars).to_string(),
    })
}

fn rstrip(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    strip_with(interpreter, args, "rstrip", |s, chars| match chars {
        [] => s.trim_end().to_string(),
        chars => s.trim_end_matches(chars).to_string(),
    })
}

fn split_args(
    interpreter: &TreewalkInterpreter,
    args: &Args,
    name: &str,
) -> TreewalkResult<(String, Option<String>, Option<usize>)> {
    check_args(args, name, 1, 3, &["sep", "maxsplit"]).raise(interpreter)?;
    let s = receiver(interpreter, args, name)?;
    let sep = match args.get_kwarg("sep") {
        Some(TreewalkValue::None) => None,
        Some(sep) => Some(sep.as_str().raise(interpreter)?),
        None => str_arg(interpreter, args, 1)?,
    };
    if sep.as_deref() == Some("") {
        return Exception::value_error("empty separator").raise(interpreter);
    }
    let maxsplit = match args.get_kwarg("maxsplit") {
        Some(n) => Some(n.as_int().raise(interpreter)?),
        None => int_arg(interpreter, args, 2)?,
    };
    Ok((s, sep, maxsplit.and_then(|n| usize::try_from(n).ok())))
}

fn to_list(parts: Vec<&str>) -> TreewalkValue {
    TreewalkValue::new_list(parts.into_iter().map(TreewalkValue::str).collect())
}

fn split(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let (s, sep, maxsplit) = split_args(interpreter, &args, "split")?;
    Ok(to_list(match (sep, maxsplit) {
        (Some(sep), Some(n)) => s.splitn(n + 1, sep.as_str()).collect(),
        (Some(sep), None) => s.split(sep.as_str()).collect(),
        (None, limit) => split_whitespace(&s, limit),
    }))
}

fn rsplit(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let (s, sep, maxsplit) = split_args(interpreter, &args, "rsplit")?;
    let mut parts: Vec<&str> = match (sep, maxsplit) {
        (Some(sep), Some(n)) => s.rsplitn(n + 1, sep.as_str()).collect(),
        (Some(sep), None) => s.rsplit(sep.as_str()).collect(),
        (None, None) => {
            let mut parts = split_whitespace(&s, None);
            parts.reverse();
            parts
        }
        (None, Some(n)) => {
            // Split from the right: peel words off the end until the limit is reached.
            let mut parts = vec![];
            let mut rest = s.trim_end();
            while parts.len() < n {
                match rest.rfind(char::is_whitespace) {
                    Some(i) => {
                        let word_start = i + rest[i..].chars().next().map_or(1, char::len_utf8);
                        parts.push(&rest[word_start..]);
                        rest = rest[..i].trim_end();
                    }
                    None => break,
                }
            }
            if !rest.is_empty() {
                parts.push(rest);
            }
            parts
        }
    };
    parts.reverse();
    Ok(to_list(parts))
}

/// `str.split()` with no separator: runs of whitespace separate words and leading or trailing
/// whitespace produces no empty strings.
fn split_whitespace(s: &str, limit: Option<usize>) -> Vec<&str> {
    let mut parts = vec![];
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if limit.is_some_and(|n| parts.len() == n) {
            parts.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(i) => {
                parts.push(&rest[..i]);
                rest = rest[i..].trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

fn splitlines(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "splitlines", 1, 2, &["keepends"]).raise(interpreter)?;
    let s = receiver(interpreter, &args, "splitlines")?;
    let keepends = match args.get_kwarg("keepends").or_else(|| args.get_arg_opt(1)) {
        Some(flag) => interpreter.truthy(&flag)?,
        None => false,
    };
    let lines: Vec<&str> = if keepends {
        s.split_inclusive('\n').collect()
    } else {
        s.lines().collect()
    };
    Ok(to_list(lines))
}

fn partition_at(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    from_end: bool,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 2, 2, &[]).raise(interpreter)?;
    let s = receiver(interpreter, &args, name)?;
    let sep = args.get_arg(1).as_str().raise(interpreter)?;
    if sep.is_empty() {
        return Exception::value_error("empty separator").raise(interpreter);
    }
    let found = if from_end { s.rfind(&sep) } else { s.find(&sep) };
    let parts = match found {
        Some(i) => [&s[..i], sep.as_str(), &s[i + sep.len()..]],
        None if from_end => ["", "", s.as_str()],
        None => [s.as_str(), "", ""],
    };
    Ok(TreewalkValue::new_tuple(
        parts.into_iter().map(TreewalkValue::str).collect(),
    ))
}

fn partition(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    partition_at(interpreter, args, "partition", false)
}

fn rpartition(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    partition_at(interpreter, args, "rpartition", true)
}

/// `str.format`: positional (`{}`, `{0}`) and named (`{name}`) fields, attribute and index
/// lookups on the field, `!r`/`!s` conversions and a format spec.
fn format(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    let template = receiver(interpreter, &args, "format")?;
    let positional = &args.positional()[1..];
    let mut auto_index = 0;
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Exception::value_error("Single '}' encountered in format string")
                    .raise(interpreter)
            }
            '{' => {
                let mut field = String::new();
                let mut depth = 1;
                for c in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    field.push(c);
                }
                if depth != 0 {
                    return Exception::value_error("expected '}' before end of string")
                        .raise(interpreter);
                }
                out.push_str(&format_field(
                    interpreter,
                    &field,
                    positional,
                    &args,
                    &mut auto_index,
                )?);
            }
            c => out.push(c),
        }
    }
    Ok(TreewalkValue::Str(out))
}

fn format_field(
    interpreter: &TreewalkInterpreter,
    field: &str,
    positional: &[TreewalkValue],
    args: &Args,
    auto_index: &mut usize,
) -> TreewalkResult<String> {
    let (field, spec) = match field.split_once(':') {
        Some((field, spec)) => (field, spec),
        None => (field, ""),
    };
    let (field, conversion) = match field.split_once('!') {
        Some((field, conversion)) => (field, Some(conversion)),
        None => (field, None),
    };

    let name_end = field.find(['.', '[']).unwrap_or(field.len());
    let (name, mut accessors) = field.split_at(name_end);
    let mut value = if name.is_empty() {
        let value = positional.get(*auto_index).cloned();
        *auto_index += 1;
        match value {
            Some(value) => value,
            None => {
                return Exception::index_error(format!(
                    "Replacement index {} out of range for positional args tuple",
                    *auto_index - 1
                ))
                .raise(interpreter)
            }
        }
    } else if let Ok(i) = name.parse::<usize>() {
        match positional.get(i) {
            Some(value) => value.clone(),
            None => {
                return Exception::index_error(format!(
                    "Replacement index {i} out of range for positional args tuple"
                ))
                .raise(interpreter)
            }
        }
    } else {
        match args.get_kwarg(name) {
            Some(value) => value,
            None => return Exception::key_error(TreewalkValue::str(name)).raise(interpreter),
        }
    };

    while !accessors.is_empty() {
        if let Some(rest) = accessors.strip_prefix('.') {
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            value = interpreter.get_attr(&value, &rest[..end])?;
            accessors = &rest[end..];
        } else if let Some(rest) = accessors.strip_prefix('[') {
            let Some(end) = rest.find(']') else {
                return Exception::value_error("Missing ']' in format string").raise(interpreter);
            };
            let key = &rest[..end];
            let key = match key.parse::<i64>() {
                Ok(i) => TreewalkValue::Int(i),
                Err(_) => TreewalkValue::str(key),
            };
            value = interpreter.get_item(&value, &key)?;
            accessors = &rest[end + 1..];
        } else {
            return Exception::value_error("Only '.' or '[' may follow ']' in format field specifier")
                .raise(interpreter);
        }
    }

    let text = match conversion {
        Some("r") => interpreter.repr(&value)?,
        Some("s") | None => interpreter.to_str(&value)?,
        Some(other) => {
            return Exception::value_error(format!(
                "Unknown conversion specifier {other}"
            ))
            .raise(interpreter)
        }
    };
    if conversion.is_some() {
        return format_with_spec(&TreewalkValue::Str(text.clone()), spec, &text).raise(interpreter);
    }
    format_with_spec(&value, spec, &text).raise(interpreter)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    fn call(func: BuiltinFn, args: Args) -> TreewalkValue {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        func(&interpreter, args).unwrap()
    }

    fn strs(values: &[&str]) -> TreewalkValue {
        TreewalkValue::new_list(values.iter().map(|s| TreewalkValue::str(*s)).collect())
    }

    #[test]
    fn split_variants() {
        assert_eq!(
            call(split, args!["  a  b c ".into()]),
            strs(&["a", "b", "c"])
        );
        assert_eq!(
            call(split, args!["a,b,,c".into(), ",".into()]),
            strs(&["a", "b", "", "c"])
        );
        assert_eq!(
            call(split, args!["a b c".into(), TreewalkValue::None, TreewalkValue::Int(1)]),
            strs(&["a", "b c"])
        );
        assert_eq!(
            call(rsplit, args!["a b c".into(), TreewalkValue::None, TreewalkValue::Int(1)]),
            strs(&["a b", "c"])
        );
        assert_eq!(
            call(rsplit, args!["a.b.c".into(), ".".into(), TreewalkValue::Int(1)]),
            strs(&["a.b", "c"])
        );
    }

    #[test]
    fn format_fields() {
        let args = Args::with_keywords(
            vec!["{0} + {1!r} = {total:>4}".into(), TreewalkValue::Int(1), "x".into()],
            vec![("total".into(), TreewalkValue::Int(3))],
        );
        assert_eq!(call(format, args), TreewalkValue::str("1 + 'x' =    3"));
    }

    #[test]
    fn padding_and_search() {
        assert_eq!(
            call(center, args!["ab".into(), TreewalkValue::Int(5), "*".into()]),
            TreewalkValue::str("**ab*")
        );
        assert_eq!(
            call(zfill, args!["-42".into(), TreewalkValue::Int(5)]),
            TreewalkValue::str("-0042")
        );
        assert_eq!(
            call(find, args!["héllo".into(), "l".into()]),
            TreewalkValue::Int(2)
        );
        assert_eq!(
            call(partition, args!["key=value=x".into(), "=".into()]),
            TreewalkValue::new_tuple(vec!["key".into(), "=".into(), "value=x".into()])
        );
    }
}
