use crate::treewalk::{types::Exception, DomainResult, TreewalkValue};

/// The arguments of a call after positional and keyword unpacking has been evaluated.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Args {
    positional: Vec<TreewalkValue>,
    keywords: Vec<(String, TreewalkValue)>,
}

impl Args {
    pub fn new(positional: Vec<TreewalkValue>) -> Self {
        Self {
            positional,
            keywords: vec![],
        }
    }

    pub fn with_keywords(
        positional: Vec<TreewalkValue>,
        keywords: Vec<(String, TreewalkValue)>,
    ) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    /// Bind a receiver as the first positional argument, as a method call does.
    pub fn prepend(mut self, receiver: TreewalkValue) -> Self {
        self.positional.insert(0, receiver);
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    /// The positional argument at `index`, or `None` when it was not passed. Builtins call
    /// [`check_args`] first, so a missing index here is only reachable for optional arguments.
    pub fn get_arg(&self, index: usize) -> TreewalkValue {
        self.get_arg_opt(index).unwrap_or(TreewalkValue::None)
    }

    pub fn get_arg_opt(&self, index: usize) -> Option<TreewalkValue> {
        self.positional.get(index).cloned()
    }

    pub fn get_kwarg(&self, name: &str) -> Option<TreewalkValue> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn positional(&self) -> &[TreewalkValue] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, TreewalkValue)] {
        &self.keywords
    }

    pub fn into_parts(self) -> (Vec<TreewalkValue>, Vec<(String, TreewalkValue)>) {
        (self.positional, self.keywords)
    }
}

/// Validate the positional arity of a builtin and reject keywords it does not accept.
pub fn check_args(
    args: &Args,
    name: &str,
    min: usize,
    max: usize,
    keywords: &[&str],
) -> DomainResult<()> {
    if let Some((key, _)) = args
        .keywords()
        .iter()
        .find(|(key, _)| !keywords.contains(&key.as_str()))
    {
        return Err(Exception::type_error(if keywords.is_empty() {
            format!("{name}() takes no keyword arguments")
        } else {
            format!("'{key}' is an invalid keyword argument for {name}()")
        }));
    }
    check_arity(args, name, min, max)
}

/// Validate only the positional arity, for builtins that take arbitrary keywords.
pub fn check_arity(args: &Args, name: &str, min: usize, max: usize) -> DomainResult<()> {
    let given = args.len();
    if given >= min && given <= max {
        return Ok(());
    }

    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let message = if min == max {
        match min {
            0 => format!("{name}() takes no arguments ({given} given)"),
            1 => format!("{name}() takes exactly one argument ({given} given)"),
            n => format!("{name}() takes exactly {n} arguments ({given} given)"),
        }
    } else if max == usize::MAX {
        format!(
            "{name}() takes at least {min} argument{} ({given} given)",
            plural(min)
        )
    } else if given < min {
        format!(
            "{name}() takes at least {min} argument{} ({given} given)",
            plural(min)
        )
    } else {
        format!(
            "{name}() takes at most {max} argument{} ({given} given)",
            plural(max)
        )
    };
    Err(Exception::type_error(message))
}

macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        $crate::treewalk::utils::Args::new(vec![$($arg),*])
    };
}

pub(crate) use args;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_messages() {
        let e = check_args(&args![], "len", 1, 1, &[]).unwrap_err();
        assert_eq!(e.message(), "len() takes exactly one argument (0 given)");

        let two = args![TreewalkValue::Int(1), TreewalkValue::Int(2)];
        let e = check_args(&two, "abs", 1, 1, &[]).unwrap_err();
        assert_eq!(e.message(), "abs() takes exactly one argument (2 given)");

        let e = check_args(&two, "getattr", 3, 3, &[]).unwrap_err();
        assert_eq!(e.message(), "getattr() takes exactly 3 arguments (2 given)");

        assert!(check_args(&two, "print", 0, usize::MAX, &[]).is_ok());
    }

    #[test]
    fn keyword_validation() {
        let args = Args::with_keywords(vec![], vec![("reverse".into(), TreewalkValue::Bool(true))]);
        assert!(check_args(&args, "sorted", 0, 1, &["key", "reverse"]).is_ok());

        let e = check_args(&args, "len", 0, 1, &[]).unwrap_err();
        assert_eq!(e.message(), "len() takes no keyword arguments");

        let e = check_args(&args, "sum", 0, 1, &["start"]).unwrap_err();
        assert_eq!(e.message(), "'reverse' is an invalid keyword argument for sum()");

        assert!(check_arity(&args, "update", 0, 1).is_ok());
        let e = check_arity(&args![], "update", 1, 2).unwrap_err();
        assert_eq!(e.message(), "update() takes at least 1 argument (0 given)");
    }

    #[test]
    fn receiver_binding() {
        let args = args![TreewalkValue::Int(2)].prepend(TreewalkValue::Str("self".into()));
        assert_eq!(args.len(), 2);
        assert_eq!(args.get_arg(0), TreewalkValue::Str("self".into()));
        assert_eq!(args.get_arg(5), TreewalkValue::None);
    }
}
