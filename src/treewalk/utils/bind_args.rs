use crate::treewalk::{
    types::{Dict, Exception, FunctionSignature},
    utils::Args,
    DomainResult, TreewalkValue,
};

/// Match call arguments to a function's parameters, producing the initial bindings of the call's
/// local scope in declaration order.
pub fn bind_args(
    name: &str,
    signature: &FunctionSignature,
    args: Args,
) -> DomainResult<Vec<(String, TreewalkValue)>> {
    let (positional, keywords) = args.into_parts();
    let params = &signature.params;

    let mut bound: Vec<Option<TreewalkValue>> = vec![None; params.len()];
    let mut kwonly_bound: Vec<Option<TreewalkValue>> = vec![None; signature.kwonly.len()];
    let mut extra_positional = vec![];
    let mut extra_keywords = vec![];

    let given = positional.len();
    for (i, value) in positional.into_iter().enumerate() {
        match bound.get_mut(i) {
            Some(slot) => *slot = Some(value),
            None => extra_positional.push(value),
        }
    }

    if !extra_positional.is_empty() && signature.args_var.is_none() {
        let required = params.iter().filter(|p| p.default.is_none()).count();
        let expected = if required == params.len() {
            plural(params.len(), "positional argument")
        } else {
            format!("from {} to {} positional arguments", required, params.len())
        };
        let was = if given == 1 { "was" } else { "were" };
        return Err(Exception::type_error(format!(
            "{name}() takes {expected} but {given} {was} given"
        )));
    }

    let mut positional_only_passed = vec![];
    for (key, value) in keywords {
        let slot = match params.iter().position(|p| p.name == key) {
            Some(pos) if pos < signature.positional_only => {
                if signature.kwargs_var.is_some() {
                    extra_keywords.push((key, value));
                } else {
                    positional_only_passed.push(key);
                }
                continue;
            }
            Some(pos) => &mut bound[pos],
            None => match signature.kwonly.iter().position(|p| p.name == key) {
                Some(pos) => &mut kwonly_bound[pos],
                None if signature.kwargs_var.is_some() => {
                    extra_keywords.push((key, value));
                    continue;
                }
                None => {
                    return Err(Exception::type_error(format!(
                        "{name}() got an unexpected keyword argument '{key}'"
                    )))
                }
            },
        };
        if slot.is_some() {
            return Err(Exception::type_error(format!(
                "{name}() got multiple values for argument '{key}'"
            )));
        }
        *slot = Some(value);
    }

    if !positional_only_passed.is_empty() {
        return Err(Exception::type_error(format!(
            "{name}() got some positional-only arguments passed as keyword arguments: '{}'",
            positional_only_passed.join(", ")
        )));
    }

    let mut bindings = vec![];
    let mut missing = vec![];
    for (param, slot) in params.iter().zip(bound) {
        match slot.or_else(|| param.default.clone()) {
            Some(value) => bindings.push((param.name.clone(), value)),
            None => missing.push(param.name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(missing_error(name, "positional", &missing));
    }

    if let Some(args_var) = &signature.args_var {
        bindings.push((
            args_var.name.clone(),
            TreewalkValue::new_tuple(extra_positional),
        ));
    }

    for (param, slot) in signature.kwonly.iter().zip(kwonly_bound) {
        match slot.or_else(|| param.default.clone()) {
            Some(value) => bindings.push((param.name.clone(), value)),
            None => missing.push(param.name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(missing_error(name, "keyword-only", &missing));
    }

    if let Some(kwargs_var) = &signature.kwargs_var {
        let items = extra_keywords
            .into_iter()
            .map(|(k, v)| (TreewalkValue::Str(k), v))
            .collect();
        bindings.push((
            kwargs_var.name.clone(),
            TreewalkValue::new_dict(Dict::from_items(items)?),
        ));
    }

    Ok(bindings)
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn missing_error(name: &str, kind: &str, missing: &[&str]) -> Exception {
    let quoted: Vec<_> = missing.iter().map(|m| format!("'{m}'")).collect();
    let names = match quoted.as_slice() {
        [single] => single.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        [] => String::new(),
    };
    Exception::type_error(format!(
        "{name}() missing {} required {kind} argument{}: {names}",
        missing.len(),
        if missing.len() == 1 { "" } else { "s" },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{types::FunctionParam, utils::args};

    fn param(name: &str, default: Option<TreewalkValue>) -> FunctionParam {
        FunctionParam {
            default,
            ..FunctionParam::new(name)
        }
    }

    fn signature() -> FunctionSignature {
        FunctionSignature {
            params: vec![param("a", None), param("b", Some(TreewalkValue::Int(2)))],
            ..Default::default()
        }
    }

    fn names(bindings: &[(String, TreewalkValue)]) -> Vec<&str> {
        bindings.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn defaults_fill_in() {
        let bindings = bind_args("f", &signature(), args![TreewalkValue::Int(1)]).unwrap();
        assert_eq!(
            bindings,
            vec![
                ("a".to_string(), TreewalkValue::Int(1)),
                ("b".to_string(), TreewalkValue::Int(2)),
            ]
        );
    }

    #[test]
    fn keywords_bind_by_name() {
        let args = Args::with_keywords(vec![], vec![
            ("b".into(), TreewalkValue::Int(5)),
            ("a".into(), TreewalkValue::Int(4)),
        ]);
        let bindings = bind_args("f", &signature(), args).unwrap();
        assert_eq!(bindings[0].1, TreewalkValue::Int(4));
        assert_eq!(bindings[1].1, TreewalkValue::Int(5));
    }

    #[test]
    fn arity_errors() {
        let e = bind_args("f", &signature(), args![]).unwrap_err();
        assert_eq!(e.message(), "f() missing 1 required positional argument: 'a'");

        let three = args![
            TreewalkValue::Int(1),
            TreewalkValue::Int(2),
            TreewalkValue::Int(3)
        ];
        let e = bind_args("f", &signature(), three).unwrap_err();
        assert_eq!(
            e.message(),
            "f() takes from 1 to 2 positional arguments but 3 were given"
        );

        let args = Args::with_keywords(
            vec![TreewalkValue::Int(1)],
            vec![("a".into(), TreewalkValue::Int(1))],
        );
        let e = bind_args("f", &signature(), args).unwrap_err();
        assert_eq!(e.message(), "f() got multiple values for argument 'a'");

        let args = Args::with_keywords(vec![], vec![("z".into(), TreewalkValue::Int(1))]);
        let e = bind_args("f", &signature(), args).unwrap_err();
        assert_eq!(e.message(), "f() got an unexpected keyword argument 'z'");
    }

    #[test]
    fn several_missing() {
        let signature = FunctionSignature {
            params: vec![param("a", None), param("b", None), param("c", None)],
            ..Default::default()
        };
        let e = bind_args("g", &signature, args![]).unwrap_err();
        assert_eq!(
            e.message(),
            "g() missing 3 required positional arguments: 'a', 'b', and 'c'"
        );
    }

    #[test]
    fn variadics() {
        let signature = FunctionSignature {
            params: vec![param("a", None)],
            args_var: Some(FunctionParam::new("rest")),
            kwonly: vec![param("flag", Some(TreewalkValue::Bool(false)))],
            kwargs_var: Some(FunctionParam::new("options")),
            ..Default::default()
        };
        let args = Args::with_keywords(
            vec![TreewalkValue::Int(1), TreewalkValue::Int(2)],
            vec![("color".into(), TreewalkValue::str("red"))],
        );
        let bindings = bind_args("h", &signature, args).unwrap();
        assert_eq!(names(&bindings), vec!["a", "rest", "flag", "options"]);
        assert_eq!(
            bindings[1].1,
            TreewalkValue::new_tuple(vec![TreewalkValue::Int(2)])
        );
        let TreewalkValue::Dict(options) = &bindings[3].1 else {
            panic!("Expected a dict");
        };
        assert_eq!(options.borrow().get_str("color"), Some(TreewalkValue::str("red")));
    }

    #[test]
    fn missing_keyword_only() {
        let signature = FunctionSignature {
            kwonly: vec![param("key", None)],
            ..Default::default()
        };
        let e = bind_args("k", &signature, args![]).unwrap_err();
        assert_eq!(
            e.message(),
            "k() missing 1 required keyword-only argument: 'key'"
        );
    }
}
