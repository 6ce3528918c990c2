use std::{
    fmt::{Debug, Error, Formatter},
    ptr,
};

use crate::{
    core::Container,
    domain::{Dunder, Type},
    treewalk::{types::Exception, DomainResult, Scope, TreewalkValue},
};

/// A Python class. Builtin classes are created once per thread and carry the [`Type`] they back;
/// user classes are created by executing a `class` statement.
#[derive(Clone)]
pub struct Class {
    name: String,
    qualname: String,
    module: String,
    bases: Vec<Container<Class>>,
    /// The method resolution order, excluding the class itself.
    mro_tail: Vec<Container<Class>>,
    scope: Scope,
    builtin: Option<Type>,
}

impl Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<class '{}'>", self.full_name())
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Class {
    pub fn new_builtin(builtin: Type, parent: Option<Container<Class>>) -> Self {
        let mro_tail = match &parent {
            Some(parent) => parent.mro(),
            None => vec![],
        };
        Self {
            name: builtin.name().to_string(),
            qualname: builtin.name().to_string(),
            module: Dunder::Builtins.to_string(),
            bases: parent.into_iter().collect(),
            mro_tail,
            scope: Scope::default(),
            builtin: Some(builtin),
        }
    }

    /// Create a user class. `bases` must be non-empty; a class statement without bases passes
    /// `object`.
    pub fn new_user(
        name: &str,
        qualname: &str,
        module: &str,
        bases: Vec<Container<Class>>,
        scope: Scope,
    ) -> DomainResult<Self> {
        for (i, base) in bases.iter().enumerate() {
            if bases[..i].iter().any(|b| b.same_identity(base)) {
                return Err(Exception::type_error(format!(
                    "duplicate base class {}",
                    base.borrow().name()
                )));
            }
        }

        let mro_tail = c3_linearize(&bases).ok_or_else(|| {
            let names: Vec<_> = bases.iter().map(|b| b.borrow().name.clone()).collect();
            Exception::type_error(format!(
                "Cannot create a consistent method resolution order (MRO) for bases {}",
                names.join(", ")
            ))
        })?;

        Ok(Self {
            name: name.to_string(),
            qualname: qualname.to_string(),
            module: module.to_string(),
            bases,
            mro_tail,
            scope,
            builtin: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualname(&self) -> &str {
        &self.qualname
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn bases(&self) -> &[Container<Class>] {
        &self.bases
    }

    pub fn builtin(&self) -> Option<Type> {
        self.builtin
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }

    /// `module.QualName` for user classes, the bare name for builtins.
    pub fn full_name(&self) -> String {
        if self.is_builtin() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.qualname)
        }
    }

    pub fn doc(&self) -> Option<String> {
        match self.scope.get(&Dunder::Doc) {
            Some(TreewalkValue::Str(doc)) => Some(doc),
            _ => None,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn get(&self, name: &str) -> Option<TreewalkValue> {
        self.scope.get(name)
    }

    pub fn insert(&mut self, name: &str, value: TreewalkValue) {
        self.scope.insert(name, value);
    }

    pub fn delete(&mut self, name: &str) -> Option<TreewalkValue> {
        self.scope.delete(name)
    }
}

impl Container<Class> {
    /// The full method resolution order, starting with this class.
    pub fn mro(&self) -> Vec<Container<Class>> {
        let mut mro = vec![self.clone()];
        mro.extend(self.borrow().mro_tail.iter().cloned());
        mro
    }

    /// Look up an attribute along the MRO without binding it.
    pub fn lookup(&self, name: &str) -> Option<TreewalkValue> {
        self.mro().iter().find_map(|class| class.borrow().get(name))
    }

    /// Like [`lookup`](Self::lookup), but only consults classes defined in Python code.
    pub fn lookup_user(&self, name: &str) -> Option<TreewalkValue> {
        self.mro()
            .iter()
            .filter(|class| !class.borrow().is_builtin())
            .find_map(|class| class.borrow().get(name))
    }

    pub fn is_subclass_of(&self, other: &Container<Class>) -> bool {
        self.mro().iter().any(|class| class.same_identity(other))
    }

    /// The nearest builtin ancestor, which determines how instances are stored.
    pub fn nearest_builtin(&self) -> Type {
        self.mro()
            .iter()
            .find_map(|class| class.borrow().builtin())
            .unwrap_or(Type::Object)
    }

    /// The nearest builtin exception class in the MRO, if this is an exception class at all.
    pub fn exception_type(&self) -> Option<Type> {
        self.mro()
            .iter()
            .filter_map(|class| class.borrow().builtin())
            .find(|t| t.is_exception())
    }

    pub fn is_exception(&self) -> bool {
        self.exception_type().is_some()
    }
}

/// C3 linearization over the MROs of `bases`.
fn c3_linearize(bases: &[Container<Class>]) -> Option<Vec<Container<Class>>> {
    let mut sequences: Vec<Vec<Container<Class>>> = bases.iter().map(|b| b.mro()).collect();
    sequences.push(bases.to_vec());

    let mut result = vec![];
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        let in_any_tail =
            |c: &Container<Class>| sequences.iter().any(|s| s[1..].iter().any(|x| x.same_identity(c)));
        let candidate = sequences
            .iter()
            .map(|s| &s[0])
            .find(|head| !in_any_tail(head))?
            .clone();

        for sequence in sequences.iter_mut() {
            if sequence[0].same_identity(&candidate) {
                sequence.remove(0);
            }
        }
        result.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> Container<Class> {
        Container::new(Class::new_builtin(Type::Object, None))
    }

    fn user(name: &str, bases: Vec<Container<Class>>) -> Container<Class> {
        Container::new(Class::new_user(name, name, "plugin", bases, Scope::default()).unwrap())
    }

    fn names(mro: &[Container<Class>]) -> Vec<String> {
        mro.iter().map(|c| c.borrow().name().to_string()).collect()
    }

    #[test]
    fn diamond_mro() {
        let object = object();
        let a = user("A", vec![object.clone()]);
        let b = user("B", vec![a.clone()]);
        let c = user("C", vec![a.clone()]);
        let d = user("D", vec![b, c]);

        assert_eq!(names(&d.mro()), vec!["D", "B", "C", "A", "object"]);
        assert!(d.is_subclass_of(&a));
        assert!(!a.is_subclass_of(&d));
        assert_eq!(d.borrow().full_name(), "plugin.D");
    }

    #[test]
    fn inconsistent_mro() {
        let object = object();
        let a = user("A", vec![object.clone()]);
        let b = user("B", vec![a.clone()]);
        let e = Class::new_user("C", "C", "plugin", vec![a, b], Scope::default()).unwrap_err();
        assert_eq!(
            e.message(),
            "Cannot create a consistent method resolution order (MRO) for bases A, B"
        );
    }

    #[test]
    fn duplicate_base() {
        let object = object();
        let e = Class::new_user("C", "C", "plugin", vec![object.clone(), object], Scope::default())
            .unwrap_err();
        assert_eq!(e.message(), "duplicate base class object");
    }

    #[test]
    fn exception_type() {
        let object = object();
        let base_exception = Container::new(Class::new_builtin(
            Type::BaseException,
            Some(object.clone()),
        ));
        let exception = Container::new(Class::new_builtin(Type::Exception, Some(base_exception)));
        let custom = user("PluginError", vec![exception]);

        assert_eq!(custom.exception_type(), Some(Type::Exception));
        assert!(user("Plain", vec![object]).exception_type().is_none());
    }
}
