use crate::treewalk::TreewalkValue;

/// A subscripted type such as `list[str]` or `Optional[int]`.
#[derive(Debug, PartialEq, Clone)]
pub struct GenericAlias {
    pub origin: Box<TreewalkValue>,
    pub args: Vec<TreewalkValue>,
}

/// `int | None` or `Union[int, str]`.
#[derive(Debug, PartialEq, Clone)]
pub struct UnionType {
    pub members: Vec<TreewalkValue>,
}

impl UnionType {
    /// Build a union, flattening nested unions.
    pub fn of(members: impl IntoIterator<Item = TreewalkValue>) -> Self {
        let mut flat = vec![];
        for member in members {
            match member {
                TreewalkValue::Union(inner) => flat.extend(inner.members),
                other => flat.push(other),
            }
        }
        Self { members: flat }
    }
}

/// A `typing` construct that is only meaningful inside annotations, such as `Any` or `Optional`.
#[derive(Debug, PartialEq, Clone)]
pub struct SpecialForm {
    pub name: String,
}

impl SpecialForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Render an evaluated annotation the way it reads in source: builtins by name, user classes as
/// `module.QualName`, generics with their parameters.
pub fn render_annotation(value: &TreewalkValue) -> String {
    match value {
        TreewalkValue::None => "None".to_string(),
        TreewalkValue::Ellipsis => "...".to_string(),
        TreewalkValue::Str(s) => s.clone(),
        TreewalkValue::Class(class) => class.borrow().full_name(),
        TreewalkValue::GenericAlias(alias) => format!(
            "{}[{}]",
            render_annotation(&alias.origin),
            alias
                .args
                .iter()
                .map(render_annotation)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        TreewalkValue::Union(union) => union
            .members
            .iter()
            .map(render_annotation)
            .collect::<Vec<_>>()
            .join(" | "),
        TreewalkValue::SpecialForm(form) => form.name.clone(),
        TreewalkValue::List(items) => format!(
            "[{}]",
            items
                .borrow()
                .iter()
                .map(render_annotation)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        other => other.repr(),
    }
}
