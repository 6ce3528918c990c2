use std::fmt::{Display, Error, Formatter};

use crate::{
    domain::{Dunder, Value},
    plugin::ContractMismatch,
    treewalk::{
        types::{render_annotation, FunctionParam, FunctionSignature},
        TreewalkValue,
    },
};

/// Reported as the type of a parameter without an annotation.
pub const ANY: &str = "Any";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// The rendered annotation, such as `str` or `list[int]`.
    pub annotation: Option<String>,
    pub default: Option<Value>,
}

impl Parameter {
    /// The annotation, or [`ANY`] when there is none.
    pub fn type_hint(&self) -> &str {
        self.annotation.as_deref().unwrap_or(ANY)
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self.kind {
            ParameterKind::VarPositional => write!(f, "*")?,
            ParameterKind::VarKeyword => write!(f, "**")?,
            _ => {}
        }
        write!(f, "{}", self.name)?;
        if let Some(annotation) = &self.annotation {
            write!(f, ": {annotation}")?;
        }
        match (&self.default, &self.annotation) {
            (Some(default), Some(_)) => write!(f, " = {}", default.repr()),
            (Some(default), None) => write!(f, "={}", default.repr()),
            _ => Ok(()),
        }
    }
}

/// The declared parameters of a plugin callable, without the receiver of a bound method.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub returns: Option<String>,
}

impl Signature {
    /// Reflect the parameters `callable` declares. Builtins accept anything, so they report
    /// `(*args, **kwargs)`.
    pub fn of(callable: &TreewalkValue) -> Self {
        match callable {
            TreewalkValue::Function(function) => Self::from_function(&function.borrow().signature),
            TreewalkValue::Method(method) => {
                Self::of(method.borrow().function()).without_receiver()
            }
            TreewalkValue::Staticmethod(inner) => Self::of(&inner.func),
            TreewalkValue::Class(class) => {
                let init = class.lookup_user(&Dunder::Init);
                match init {
                    Some(init) => Self::of(&init).without_receiver(),
                    None => Self::empty(),
                }
            }
            TreewalkValue::Object(object) => {
                let call = object.borrow().class().lookup_user(&Dunder::Call);
                match call {
                    Some(call) => Self::of(&call).without_receiver(),
                    None => Self::empty(),
                }
            }
            _ => Self::variadic(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    fn from_function(signature: &FunctionSignature) -> Self {
        let describe = |kind, param: &FunctionParam| Parameter {
            name: param.name.clone(),
            kind,
            annotation: param.annotation.as_ref().map(render_annotation),
            default: param.default.clone().map(Value::from),
        };

        let mut parameters = vec![];
        for (index, param) in signature.params.iter().enumerate() {
            let kind = if index < signature.positional_only {
                ParameterKind::PositionalOnly
            } else {
                ParameterKind::PositionalOrKeyword
            };
            parameters.push(describe(kind, param));
        }
        parameters.extend(
            signature
                .args_var
                .iter()
                .map(|p| describe(ParameterKind::VarPositional, p)),
        );
        parameters.extend(
            signature
                .kwonly
                .iter()
                .map(|p| describe(ParameterKind::KeywordOnly, p)),
        );
        parameters.extend(
            signature
                .kwargs_var
                .iter()
                .map(|p| describe(ParameterKind::VarKeyword, p)),
        );

        Self {
            parameters,
            returns: signature.returns.as_ref().map(render_annotation),
        }
    }

    /// Drop the leading positional parameter, which a bound receiver fills. A receiver
    /// absorbed by `*args` leaves the signature unchanged.
    fn without_receiver(mut self) -> Self {
        if matches!(
            self.parameters.first().map(|p| p.kind),
            Some(ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword)
        ) {
            self.parameters.remove(0);
        }
        self
    }

    fn empty() -> Self {
        Self {
            parameters: vec![],
            returns: None,
        }
    }

    fn variadic() -> Self {
        let param = |name: &str, kind| Parameter {
            name: name.to_string(),
            kind,
            annotation: None,
            default: None,
        };
        Self {
            parameters: vec![
                param("args", ParameterKind::VarPositional),
                param("kwargs", ParameterKind::VarKeyword),
            ],
            returns: None,
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut parts = vec![];
        let mut marked_keyword_only = false;
        for (index, param) in self.parameters.iter().enumerate() {
            if param.kind == ParameterKind::KeywordOnly && !marked_keyword_only {
                marked_keyword_only = true;
                if !self.parameters[..index]
                    .iter()
                    .any(|p| p.kind == ParameterKind::VarPositional)
                {
                    parts.push("*".to_string());
                }
            }
            parts.push(param.to_string());
            let next_is_positional_only = self
                .parameters
                .get(index + 1)
                .is_some_and(|p| p.kind == ParameterKind::PositionalOnly);
            if param.kind == ParameterKind::PositionalOnly && !next_is_positional_only {
                parts.push("/".to_string());
            }
        }
        write!(f, "({})", parts.join(", "))?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}

/// The parameters a host expects a callable to declare, optionally with their types.
///
/// Both forms check the same way: every name must be declared, and a given type must equal the
/// rendered annotation. Declared parameters the contract does not mention are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contract {
    List(Vec<(String, Option<String>)>),
    Map(Vec<(String, Option<String>)>),
}

impl Contract {
    /// An ordered list of `(name, type)` pairs.
    pub fn list<I, N, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Option<T>)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self::List(collect_entries(entries))
    }

    /// A `name -> type` mapping. A repeated name keeps its last type.
    pub fn map<I, N, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Option<T>)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut map: Vec<(String, Option<String>)> = vec![];
        for (name, hint) in collect_entries(entries) {
            match map.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = hint,
                None => map.push((name, hint)),
            }
        }
        Self::Map(map)
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        match self {
            Self::List(entries) | Self::Map(entries) => entries,
        }
    }

    /// Compare against the reflected signature of `callable`, reporting the first mismatch.
    pub fn check(&self, callable: &str, signature: &Signature) -> Result<(), ContractMismatch> {
        for (name, expected) in self.entries() {
            let Some(param) = signature.parameter(name) else {
                return Err(ContractMismatch::MissingParameter {
                    callable: callable.to_string(),
                    parameter: name.clone(),
                });
            };
            if let Some(expected) = expected {
                if param.annotation.as_deref() != Some(expected.as_str()) {
                    return Err(ContractMismatch::TypeMismatch {
                        callable: callable.to_string(),
                        parameter: name.clone(),
                        expected: expected.clone(),
                        actual: param.annotation.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn collect_entries<I, N, T>(entries: I) -> Vec<(String, Option<String>)>
where
    I: IntoIterator<Item = (N, Option<T>)>,
    N: Into<String>,
    T: Into<String>,
{
    entries
        .into_iter()
        .map(|(name, hint)| (name.into(), hint.map(Into::into)))
        .collect()
}

impl<const N: usize> From<[(&str, &str); N]> for Contract {
    /// A mapping in which every parameter has a type.
    fn from(entries: [(&str, &str); N]) -> Self {
        Self::map(entries.map(|(name, hint)| (name, Some(hint))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::test_utils::*;

    fn signature_of(text: &str, name: &str) -> Signature {
        let ctx = run(text);
        Signature::of(&read(&ctx, name))
    }

    #[test]
    fn reflects_every_parameter_kind() {
        let signature = signature_of(
            r#"
def tool(a, /, b: int, c: str = "x", *rest, flag: bool = False, **options) -> list[str]:
    pass
"#,
            "tool",
        );
        let kinds: Vec<_> = signature.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::PositionalOnly,
                ParameterKind::PositionalOrKeyword,
                ParameterKind::PositionalOrKeyword,
                ParameterKind::VarPositional,
                ParameterKind::KeywordOnly,
                ParameterKind::VarKeyword,
            ]
        );
        assert_eq!(signature.parameter("a").unwrap().type_hint(), ANY);
        assert_eq!(signature.parameter("c").unwrap().default, Some(Value::from("x")));
        assert_eq!(signature.returns.as_deref(), Some("list[str]"));
        assert_eq!(
            signature.to_string(),
            "(a, /, b: int, c: str = 'x', *rest, flag: bool = False, **options) -> list[str]"
        );
    }

    #[test]
    fn receivers_are_skipped() {
        let ctx = run(r#"
class Tool:
    def __init__(self, name: str):
        self.name = name

    def run(self, command: str) -> str:
        return command

    @classmethod
    def create(cls, name: str):
        return cls(name)

    @staticmethod
    def helper(value: int):
        return value

tool = Tool("t")
method = tool.run
create = Tool.create
helper = Tool.helper
length = len
"#);
        let names = |name: &str| -> Vec<String> {
            Signature::of(&read(&ctx, name))
                .names()
                .map(str::to_string)
                .collect()
        };
        assert_eq!(names("Tool"), vec!["name"]);
        assert_eq!(names("method"), vec!["command"]);
        assert_eq!(names("create"), vec!["name"]);
        assert_eq!(names("helper"), vec!["value"]);
        assert_eq!(names("length"), vec!["args", "kwargs"]);
    }

    #[test]
    fn annotations_render_like_source() {
        let ctx = run(r#"
from typing import Optional

class Config:
    pass

def tool(a: Optional[int], b: int | None, c: "Config", d: Config, e: dict[str, list[int]]):
    pass
"#);
        let signature = Signature::of(&read(&ctx, "tool"));
        let hints: Vec<_> = signature.parameters.iter().map(|p| p.type_hint().to_string()).collect();
        assert_eq!(
            hints,
            vec![
                "Optional[int]",
                "int | None",
                "Config",
                "__main__.Config",
                "dict[str, list[int]]",
            ]
        );
    }

    #[test]
    fn contract_checks() {
        let signature = signature_of(
            "def execute(command: str, timeout, verbose: bool = False) -> str:\n    pass\n",
            "execute",
        );

        assert!(Contract::from([("command", "str")]).check("execute", &signature).is_ok());
        assert!(Contract::list([("timeout", None::<&str>), ("command", Some("str"))])
            .check("execute", &signature)
            .is_ok());

        let e = Contract::from([("command", "int")])
            .check("execute", &signature)
            .unwrap_err();
        assert_eq!(
            e,
            ContractMismatch::TypeMismatch {
                callable: "execute".into(),
                parameter: "command".into(),
                expected: "int".into(),
                actual: Some("str".into()),
            }
        );

        let e = Contract::from([("timeout", "float")])
            .check("execute", &signature)
            .unwrap_err();
        assert!(matches!(e, ContractMismatch::TypeMismatch { actual: None, .. }));

        let e = Contract::from([("command", "str"), ("shell", "bool")])
            .check("execute", &signature)
            .unwrap_err();
        assert_eq!(e.parameter(), "shell");
        assert!(matches!(e, ContractMismatch::MissingParameter { .. }));
    }

    #[test]
    fn map_keeps_the_last_hint() {
        let contract = Contract::map([("a", Some("int")), ("a", Some("str"))]);
        assert_eq!(contract.entries(), &[("a".to_string(), Some("str".to_string()))]);
    }
}
