use std::io;

use serde::Serialize;
use serde_json::{
    ser::{Formatter, PrettyFormatter},
    Map, Number, Serializer, Value as Json,
};

use crate::{
    domain::Type,
    treewalk::{
        types::{BuiltinFn, Dict, Exception, Module},
        utils::{check_args, format_float, Args},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

use super::new_module;

static FUNCTIONS: [(&str, BuiltinFn); 2] = [("dumps", dumps), ("loads", loads)];

pub(super) fn module(interpreter: &TreewalkInterpreter) -> Module {
    let mut module = new_module("json", &FUNCTIONS);
    module.insert(
        "JSONDecodeError",
        TreewalkValue::Class(interpreter.state.class(Type::ValueError)),
    );
    module
}

/// Python's default separators: `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn write_json<F: Formatter>(json: &Json, formatter: F) -> Result<String, Exception> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    json.serialize(&mut serializer)
        .map_err(|e| Exception::value_error(e.to_string()))?;
    String::from_utf8(out).map_err(|e| Exception::value_error(e.to_string()))
}

/// `json.dumps(obj, indent=None, sort_keys=False)`.
fn dumps(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "dumps", 1, 1, &["indent", "sort_keys"]).raise(interpreter)?;
    let sort_keys = match args.get_kwarg("sort_keys") {
        Some(flag) => interpreter.truthy(&flag)?,
        None => false,
    };
    let json = Encoder {
        interpreter,
        sort_keys,
        seen: vec![],
    }
    .encode(&args.get_arg(0))?;

    let text = match args.get_kwarg("indent") {
        None | Some(TreewalkValue::None) => write_json(&json, SpacedFormatter),
        Some(TreewalkValue::Str(indent)) => {
            write_json(&json, PrettyFormatter::with_indent(indent.as_bytes()))
        }
        Some(width) => {
            let indent = " ".repeat(width.as_int().raise(interpreter)?.max(0) as usize);
            write_json(&json, PrettyFormatter::with_indent(indent.as_bytes()))
        }
    };
    text.raise(interpreter).map(TreewalkValue::Str)
}

struct Encoder<'a> {
    interpreter: &'a TreewalkInterpreter,
    sort_keys: bool,
    /// Identities of the containers currently being encoded.
    seen: Vec<usize>,
}

impl Encoder<'_> {
    fn encode(&mut self, value: &TreewalkValue) -> TreewalkResult<Json> {
        match value {
            TreewalkValue::None => Ok(Json::Null),
            TreewalkValue::Bool(b) => Ok(Json::Bool(*b)),
            TreewalkValue::Int(i) => Ok(Json::Number((*i).into())),
            TreewalkValue::Float(f) => match Number::from_f64(*f) {
                Some(n) => Ok(Json::Number(n)),
                None => Exception::value_error("Out of range float values are not JSON compliant")
                    .raise(self.interpreter),
            },
            TreewalkValue::Str(s) => Ok(Json::String(s.clone())),
            TreewalkValue::List(list) => {
                let items = list.borrow().to_vec();
                self.nested(value, |encoder| encoder.encode_items(&items))
            }
            TreewalkValue::Tuple(tuple) => self.encode_items(tuple.items()),
            TreewalkValue::Dict(dict) => {
                let entries = dict.borrow().items();
                self.nested(value, |encoder| encoder.encode_entries(entries))
            }
            other => Exception::type_error(format!(
                "Object of type {} is not JSON serializable",
                other.type_name()
            ))
            .raise(self.interpreter),
        }
    }

    fn nested(
        &mut self,
        container: &TreewalkValue,
        encode: impl FnOnce(&mut Self) -> TreewalkResult<Json>,
    ) -> TreewalkResult<Json> {
        let identity = container.identity();
        if self.seen.contains(&identity) {
            return Exception::value_error("Circular reference detected").raise(self.interpreter);
        }
        self.seen.push(identity);
        let result = encode(self);
        self.seen.pop();
        result
    }

    fn encode_items(&mut self, items: &[TreewalkValue]) -> TreewalkResult<Json> {
        let mut array = Vec::with_capacity(items.len());
        for item in items {
            array.push(self.encode(item)?);
        }
        Ok(Json::Array(array))
    }

    fn encode_entries(
        &mut self,
        entries: Vec<(TreewalkValue, TreewalkValue)>,
    ) -> TreewalkResult<Json> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = match key {
                TreewalkValue::Str(s) => s,
                TreewalkValue::Int(i) => i.to_string(),
                TreewalkValue::Float(f) => format_float(f),
                TreewalkValue::Bool(b) => b.to_string(),
                TreewalkValue::None => "null".to_string(),
                other => {
                    return Exception::type_error(format!(
                        "keys must be str, int, float, bool or None, not {}",
                        other.type_name()
                    ))
                    .raise(self.interpreter)
                }
            };
            encoded.push((key, self.encode(&value)?));
        }
        if self.sort_keys {
            encoded.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        Ok(Json::Object(encoded.into_iter().collect::<Map<_, _>>()))
    }
}

fn loads(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "loads", 1, 1, &[]).raise(interpreter)?;
    let parsed = match args.get_arg(0) {
        TreewalkValue::Str(text) => serde_json::from_str::<Json>(&text),
        TreewalkValue::Bytes(bytes) => serde_json::from_slice::<Json>(&bytes),
        other => {
            return Exception::type_error(format!(
                "the JSON object must be str or bytes, not {}",
                other.type_name()
            ))
            .raise(interpreter)
        }
    };
    let json = parsed
        .map_err(|e| Exception::value_error(e.to_string()))
        .raise(interpreter)?;
    decode(json).raise(interpreter)
}

fn decode(json: Json) -> Result<TreewalkValue, Exception> {
    Ok(match json {
        Json::Null => TreewalkValue::None,
        Json::Bool(b) => TreewalkValue::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => TreewalkValue::Int(i),
            None => TreewalkValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => TreewalkValue::Str(s),
        Json::Array(items) => TreewalkValue::new_list(
            items
                .into_iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(map) => {
            let mut dict = Dict::default();
            for (key, value) in map {
                dict.insert(TreewalkValue::Str(key), decode(value)?)?;
            }
            TreewalkValue::new_dict(dict)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    fn interpreter() -> TreewalkInterpreter {
        TreewalkInterpreter::new(ModuleRegistry::new(), vec![])
    }

    #[test]
    fn dumps_uses_python_separators() {
        let interpreter = interpreter();
        let dict = Dict::from_items(vec![
            ("b".into(), TreewalkValue::new_list(vec![1i64.into(), TreewalkValue::None])),
            ("a".into(), TreewalkValue::Float(1.5)),
        ])
        .unwrap();
        let value = TreewalkValue::new_dict(dict);

        let text = dumps(&interpreter, args![value.clone()]).unwrap();
        assert_eq!(text, TreewalkValue::str(r#"{"b": [1, null], "a": 1.5}"#));

        let sorted = Args::with_keywords(vec![value], vec![("sort_keys".into(), true.into())]);
        let text = dumps(&interpreter, sorted).unwrap();
        assert_eq!(text, TreewalkValue::str(r#"{"a": 1.5, "b": [1, null]}"#));
    }

    #[test]
    fn loads_preserves_order() {
        let interpreter = interpreter();
        let value = loads(&interpreter, args![r#"{"z": 1, "a": [true, 2.5]}"#.into()]).unwrap();
        assert_eq!(value.repr(), "{'z': 1, 'a': [True, 2.5]}");

        let e = loads(&interpreter, args!["{".into()]).unwrap_err();
        assert!(e.exception.message().contains("EOF"));
    }

    #[test]
    fn circular_reference() {
        let interpreter = interpreter();
        let list = TreewalkValue::new_list(vec![]);
        if let TreewalkValue::List(inner) = &list {
            inner.borrow_mut().append(list.clone());
        }
        let e = dumps(&interpreter, args![list]).unwrap_err();
        assert_eq!(e.exception.message(), "Circular reference detected");
    }
}
