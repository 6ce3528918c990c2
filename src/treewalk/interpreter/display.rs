use crate::{
    domain::Dunder,
    treewalk::{types::Exception, utils::args, Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue},
};

impl TreewalkInterpreter {
    /// `str(value)`, honoring `__str__` and `__repr__` defined in Python.
    pub fn to_str(&self, value: &TreewalkValue) -> TreewalkResult<String> {
        match value {
            TreewalkValue::Str(s) => Ok(s.clone()),
            TreewalkValue::Object(_) => {
                match self.call_dunder(value, &Dunder::Str, args![])? {
                    Some(result) => self.expect_str(result, &Dunder::Str),
                    None if self.class_of(value).is_exception() => Ok(value.to_string()),
                    None => self.repr(value),
                }
            }
            TreewalkValue::List(_) | TreewalkValue::Tuple(_) | TreewalkValue::Dict(_) => {
                self.repr(value)
            }
            _ => Ok(value.to_string()),
        }
    }

    /// `repr(value)`, recursing into containers so user `__repr__` methods apply to elements.
    pub fn repr(&self, value: &TreewalkValue) -> TreewalkResult<String> {
        match value {
            TreewalkValue::Object(_) => match self.call_dunder(value, &Dunder::Repr, args![])? {
                Some(result) => self.expect_str(result, &Dunder::Repr),
                None => Ok(value.repr()),
            },
            TreewalkValue::List(list) => {
                if !self.state.enter_repr(list.address()) {
                    return Ok("[...]".into());
                }
                let items = list.borrow().to_vec();
                let result = self.join_repr(&items);
                self.state.leave_repr(list.address());
                Ok(format!("[{}]", result?))
            }
            TreewalkValue::Tuple(tuple) if tuple.len() == 1 => {
                Ok(format!("({},)", self.join_repr(tuple.items())?))
            }
            TreewalkValue::Tuple(tuple) => Ok(format!("({})", self.join_repr(tuple.items())?)),
            TreewalkValue::Dict(dict) => {
                if !self.state.enter_repr(dict.address()) {
                    return Ok("{...}".into());
                }
                let items = dict.borrow().items();
                let result = self.join_items(&items);
                self.state.leave_repr(dict.address());
                Ok(format!("{{{}}}", result?))
            }
            _ => Ok(value.repr()),
        }
    }

    fn join_repr(&self, items: &[TreewalkValue]) -> TreewalkResult<String> {
        let parts = items
            .iter()
            .map(|item| self.repr(item))
            .collect::<TreewalkResult<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn join_items(&self, items: &[(TreewalkValue, TreewalkValue)]) -> TreewalkResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        for (key, value) in items {
            parts.push(format!("{}: {}", self.repr(key)?, self.repr(value)?));
        }
        Ok(parts.join(", "))
    }

    fn expect_str(&self, result: TreewalkValue, dunder: &str) -> TreewalkResult<String> {
        match result {
            TreewalkValue::Str(s) => Ok(s),
            other => Exception::type_error(format!(
                "{dunder} returned non-string (type {})",
                other.type_name()
            ))
            .raise(self),
        }
    }
}
