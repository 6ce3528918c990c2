use std::{
    fmt::{Debug, Error, Formatter},
    rc::Rc,
};

use tracing::debug;

use crate::{
    core::Container,
    domain::Value,
    plugin::{LoadedUnit, LoaderError, Signature},
    treewalk::{
        types::{Class, Exception},
        utils::Args,
        TreewalkInterpreter, TreewalkValue,
    },
};

/// A callable found inside a loaded plugin, ready to be invoked with host values.
#[derive(Clone)]
pub struct PluginCallable {
    name: String,
    value: TreewalkValue,
    interpreter: Rc<TreewalkInterpreter>,
}

impl PluginCallable {
    /// The name it was looked up by, such as `run` or `Tool.run`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> Signature {
        Signature::of(&self.value)
    }

    pub fn doc(&self) -> Option<String> {
        doc_of(&self.value)
    }

    pub fn call(&self, args: impl IntoIterator<Item = Value>) -> Result<Value, LoaderError> {
        self.call_with_keywords(args, Vec::<(String, Value)>::new())
    }

    /// Invoke with positional and keyword arguments. An exception escaping the plugin is
    /// returned as [`LoaderError::Call`].
    pub fn call_with_keywords<K: Into<String>>(
        &self,
        args: impl IntoIterator<Item = Value>,
        kwargs: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<Value, LoaderError> {
        let fail = |exception: Exception| LoaderError::Call {
            name: self.name.clone(),
            source: self.interpreter.raise(exception),
        };

        let mut positional = vec![];
        for arg in args {
            positional.push(TreewalkValue::try_from(arg).map_err(fail)?);
        }
        let mut keywords = vec![];
        for (name, arg) in kwargs {
            keywords.push((name.into(), TreewalkValue::try_from(arg).map_err(fail)?));
        }

        debug!(callable = %self.name, args = positional.len(), "calling plugin code");
        self.interpreter
            .call(&self.value, Args::with_keywords(positional, keywords))
            .map(Value::from)
            .map_err(|source| LoaderError::Call {
                name: self.name.clone(),
                source,
            })
    }
}

impl Debug for PluginCallable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "PluginCallable({} = {})", self.name, self.value.repr())
    }
}

/// A class defined in, or imported into, a loaded plugin.
#[derive(Clone)]
pub struct PluginClass {
    class: Container<Class>,
}

impl PluginClass {
    pub fn name(&self) -> String {
        self.class.borrow().name().to_string()
    }

    /// The `__module__` the class was defined in.
    pub fn module(&self) -> String {
        self.class.borrow().module().to_string()
    }

    /// `module.QualName`, or the bare name for builtin classes.
    pub fn full_name(&self) -> String {
        self.class.borrow().full_name()
    }

    pub fn doc(&self) -> Option<String> {
        self.class.borrow().doc()
    }

    /// Whether `base` appears anywhere in this class's MRO, including the class itself.
    pub fn is_subclass_of(&self, base: &PluginClass) -> bool {
        self.class.is_subclass_of(&base.class)
    }

    /// The names of the direct bases, in declaration order.
    pub fn bases(&self) -> Vec<String> {
        self.class
            .borrow()
            .bases()
            .iter()
            .map(|base| base.borrow().full_name())
            .collect()
    }
}

impl PartialEq for PluginClass {
    fn eq(&self, other: &Self) -> bool {
        self.class.same_identity(&other.class)
    }
}

impl Debug for PluginClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "PluginClass({})", self.full_name())
    }
}

/// The first class defined in `unit` itself that matches `name` and subclasses `must_inherit`,
/// in the order the module bound them.
pub(crate) fn find_class(
    unit: &LoadedUnit,
    name: Option<&str>,
    must_inherit: Option<&PluginClass>,
) -> Option<PluginClass> {
    let module_name = unit.name().as_str();
    let module = unit.module().borrow();
    let found = module
        .scope()
        .iter()
        .filter_map(|(_, value)| value.as_class())
        .filter(|class| class.borrow().module() == module_name)
        .filter(|class| name.map_or(true, |name| class.borrow().name() == name))
        .find(|class| must_inherit.map_or(true, |base| class.is_subclass_of(&base.class)));
    found.map(|class| PluginClass { class })
}

/// Any class bound to `name` in the unit's namespace, wherever it was defined.
pub(crate) fn lookup_class(unit: &LoadedUnit, name: &str) -> Option<PluginClass> {
    let value = unit.module().borrow().get(name)?;
    value.as_class().map(|class| PluginClass { class })
}

/// Resolve `name` or `Class.member` to whatever it is bound to, callable or not.
pub(crate) fn resolve_name(unit: &LoadedUnit, name: &str) -> Result<TreewalkValue, LoaderError> {
    let module_name = unit.name().as_str();
    match name.split_once('.') {
        Some((container, member)) => {
            let Some(class) = find_class(unit, Some(container), None) else {
                return Err(LoaderError::name_not_found(container, module_name));
            };
            let found = unit
                .interpreter()
                .find_attr(&TreewalkValue::Class(class.class), member)
                .ok()
                .flatten();
            found.ok_or_else(|| LoaderError::name_not_found(name, module_name))
        }
        None => {
            let found = unit.module().borrow().get(name);
            found.ok_or_else(|| LoaderError::name_not_found(name, module_name))
        }
    }
}

pub(crate) fn resolve_callable(unit: &LoadedUnit, name: &str) -> Result<PluginCallable, LoaderError> {
    let value = resolve_name(unit, name)?;
    if !is_invocable(&value) {
        return Err(LoaderError::NotCallable {
            name: name.to_string(),
            type_name: value.type_name(),
        });
    }
    Ok(PluginCallable {
        name: name.to_string(),
        value,
        interpreter: unit.interpreter().clone(),
    })
}

fn is_invocable(value: &TreewalkValue) -> bool {
    match value {
        TreewalkValue::Staticmethod(inner) => is_invocable(&inner.func),
        other => other.is_callable(),
    }
}

/// The docstring of a function, method, or class.
pub(crate) fn doc_of(value: &TreewalkValue) -> Option<String> {
    match value {
        TreewalkValue::Function(function) => function.borrow().doc.clone(),
        TreewalkValue::Method(method) => doc_of(method.borrow().function()),
        TreewalkValue::Staticmethod(inner) => doc_of(&inner.func),
        TreewalkValue::Classmethod(inner) => doc_of(&inner.func),
        TreewalkValue::Class(class) => class.borrow().doc(),
        TreewalkValue::Object(object) => object.borrow().class().borrow().doc(),
        _ => None,
    }
}

/// The first non-blank line of a docstring, trimmed.
pub(crate) fn summary(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_skip_blank_lines() {
        assert_eq!(
            summary("\n    Executes a shell command.\n\n    Args: ...\n"),
            Some("Executes a shell command.".to_string())
        );
        assert_eq!(summary("One line."), Some("One line.".to_string()));
        assert_eq!(summary("  \n \n"), None);
    }
}
