use std::rc::Rc;

use crate::{
    core::Container,
    domain::Type,
    parser::types::{
        Ast, CallArgs, DictOperation, Expr, ForClause, FStringPart, FormatOption, KwargsOperation,
        LogicalOp, Param, Params,
    },
    treewalk::{
        types::{Dict, Exception, Function, FunctionParam, FunctionSignature, Slice, Super},
        utils::{format_with_spec, Args},
        Frame, Raise, Scope, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

impl TreewalkInterpreter {
    pub(super) fn evaluate_expr(&self, expr: &Expr, frame: &Frame) -> TreewalkResult<TreewalkValue> {
        match expr {
            Expr::None => Ok(TreewalkValue::None),
            Expr::Ellipsis => Ok(TreewalkValue::Ellipsis),
            Expr::Boolean(b) => Ok(TreewalkValue::Bool(*b)),
            Expr::Integer(i) => Ok(TreewalkValue::Int(*i)),
            Expr::Float(f) => Ok(TreewalkValue::Float(*f)),
            Expr::StringLiteral(s) => Ok(TreewalkValue::Str(s.clone())),
            Expr::BytesLiteral(b) => Ok(TreewalkValue::Bytes(b.clone())),
            Expr::FString(parts) => self.evaluate_fstring(parts, frame),
            Expr::Variable(name) => self.load_name(name, frame),
            Expr::List(items) => Ok(TreewalkValue::new_list(self.evaluate_items(items, frame)?)),
            Expr::Tuple(items) => Ok(TreewalkValue::new_tuple(self.evaluate_items(items, frame)?)),
            Expr::Dict(ops) => self.evaluate_dict(ops, frame),
            Expr::Starred(_) => {
                Exception::syntax_error("can't use starred expression here").raise(self)
            }
            Expr::ListComprehension { body, clauses } => {
                let inner = frame.comprehension();
                let mut items = vec![];
                self.run_clauses(clauses, &inner, &mut |frame: &Frame| -> TreewalkResult<()> {
                    items.push(self.evaluate_expr(body, frame)?);
                    Ok(())
                })?;
                Ok(TreewalkValue::new_list(items))
            }
            Expr::DictComprehension {
                key,
                value,
                clauses,
            } => {
                let inner = frame.comprehension();
                let mut dict = Dict::default();
                self.run_clauses(clauses, &inner, &mut |frame: &Frame| -> TreewalkResult<()> {
                    let key = self.evaluate_expr(key, frame)?;
                    let value = self.evaluate_expr(value, frame)?;
                    dict.insert(key, value).raise(self)
                })?;
                Ok(TreewalkValue::new_dict(dict))
            }
            Expr::MemberAccess { object, field } => {
                let object = self.evaluate_expr(object, frame)?;
                self.get_attr(&object, field)
            }
            Expr::IndexAccess { object, index } => {
                let object = self.evaluate_expr(object, frame)?;
                let index = self.evaluate_expr(index, frame)?;
                self.get_item(&object, &index)
            }
            Expr::Slice { start, stop, step } => {
                let bound = |part: &Option<Box<Expr>>| -> TreewalkResult<Option<i64>> {
                    match part {
                        None => Ok(None),
                        Some(expr) => match self.evaluate_expr(expr, frame)? {
                            TreewalkValue::None => Ok(None),
                            value => value.as_int().raise(self).map(Some),
                        },
                    }
                };
                let (start, stop, step) = (bound(start)?, bound(stop)?, bound(step)?);
                Ok(TreewalkValue::Slice(Slice::new(start, stop, step)))
            }
            Expr::FunctionCall { callee, args } => {
                let callee = self.evaluate_expr(callee, frame)?;
                if is_super(&callee) && args.args.is_empty() && args.kwargs.is_empty() {
                    return self.zero_arg_super(frame);
                }
                let args = self.evaluate_call_args(args, frame)?;
                self.call(&callee, args)
            }
            Expr::BinaryOperation { left, op, right } => {
                let left = self.evaluate_expr(left, frame)?;
                let right = self.evaluate_expr(right, frame)?;
                self.binary_op(op, left, right)
            }
            Expr::UnaryOperation { op, right } => {
                let right = self.evaluate_expr(right, frame)?;
                self.unary_op(op, right)
            }
            Expr::LogicalOperation { left, op, right } => {
                let left = self.evaluate_expr(left, frame)?;
                let short_circuit = match op {
                    LogicalOp::And => !self.truthy(&left)?,
                    LogicalOp::Or => self.truthy(&left)?,
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate_expr(right, frame)
                }
            }
            Expr::ComparisonChain { left, ops } => {
                let mut left = self.evaluate_expr(left, frame)?;
                for (op, right) in ops {
                    let right = self.evaluate_expr(right, frame)?;
                    if !self.compare(op, &left, &right)? {
                        return Ok(TreewalkValue::Bool(false));
                    }
                    left = right;
                }
                Ok(TreewalkValue::Bool(true))
            }
            Expr::TernaryOp {
                condition,
                if_value,
                else_value,
            } => {
                let condition = self.evaluate_expr(condition, frame)?;
                if self.truthy(&condition)? {
                    self.evaluate_expr(if_value, frame)
                } else {
                    self.evaluate_expr(else_value, frame)
                }
            }
            Expr::Lambda { params, body } => self.define_lambda(params, body, frame),
        }
    }

    /// Evaluate the items of a list or tuple display, expanding `*iterable` entries.
    fn evaluate_items(&self, items: &[Expr], frame: &Frame) -> TreewalkResult<Vec<TreewalkValue>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Expr::Starred(inner) => {
                    let inner = self.evaluate_expr(inner, frame)?;
                    values.extend(self.iterate(&inner)?);
                }
                _ => values.push(self.evaluate_expr(item, frame)?),
            }
        }
        Ok(values)
    }

    fn evaluate_dict(&self, ops: &[DictOperation], frame: &Frame) -> TreewalkResult<TreewalkValue> {
        let mut dict = Dict::default();
        for op in ops {
            match op {
                DictOperation::Pair(key, value) => {
                    let key = self.evaluate_expr(key, frame)?;
                    let value = self.evaluate_expr(value, frame)?;
                    dict.insert(key, value).raise(self)?;
                }
                DictOperation::Unpack(expr) => match self.evaluate_expr(expr, frame)? {
                    TreewalkValue::Dict(other) => {
                        let other = other.borrow().clone();
                        dict.extend(&other).raise(self)?;
                    }
                    other => {
                        return Exception::type_error(format!(
                            "'{}' object is not a mapping",
                            other.type_name()
                        ))
                        .raise(self)
                    }
                },
            }
        }
        Ok(TreewalkValue::new_dict(dict))
    }

    fn evaluate_fstring(&self, parts: &[FStringPart], frame: &Frame) -> TreewalkResult<TreewalkValue> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::String(s) => out.push_str(s),
                FStringPart::Expr(format) => {
                    let value = self.evaluate_expr(&format.expr, frame)?;
                    let (value, text) = match format.format {
                        FormatOption::Str => {
                            let text = self.to_str(&value)?;
                            (value, text)
                        }
                        FormatOption::Repr => {
                            let text = self.repr(&value)?;
                            (TreewalkValue::Str(text.clone()), text)
                        }
                    };
                    match &format.spec {
                        Some(spec) => {
                            out.push_str(&format_with_spec(&value, spec, &text).raise(self)?)
                        }
                        None => out.push_str(&text),
                    }
                }
            }
        }
        Ok(TreewalkValue::Str(out))
    }

    /// Run the `for ... in ... if ...` clauses of a comprehension, calling `emit` for every
    /// combination that passes all conditions.
    fn run_clauses(
        &self,
        clauses: &[ForClause],
        frame: &Frame,
        emit: &mut dyn FnMut(&Frame) -> TreewalkResult<()>,
    ) -> TreewalkResult<()> {
        let Some((clause, rest)) = clauses.split_first() else {
            return emit(frame);
        };

        let iterable = self.evaluate_expr(&clause.iterable, frame)?;
        'items: for item in self.iterate(&iterable)? {
            self.assign(&clause.target, item, frame)?;
            for condition in &clause.conditions {
                let value = self.evaluate_expr(condition, frame)?;
                if !self.truthy(&value)? {
                    continue 'items;
                }
            }
            self.run_clauses(rest, frame, emit)?;
        }
        Ok(())
    }

    pub(super) fn evaluate_call_args(&self, args: &CallArgs, frame: &Frame) -> TreewalkResult<Args> {
        let positional = self.evaluate_items(&args.args, frame)?;

        let mut keywords: Vec<(String, TreewalkValue)> = vec![];
        let mut push = |name: String, value: TreewalkValue| -> TreewalkResult<()> {
            if keywords.iter().any(|(k, _)| *k == name) {
                return Exception::type_error(format!(
                    "got multiple values for keyword argument '{name}'"
                ))
                .raise(self);
            }
            keywords.push((name, value));
            Ok(())
        };

        for kwarg in &args.kwargs {
            match kwarg {
                KwargsOperation::Pair(name, expr) => {
                    let value = self.evaluate_expr(expr, frame)?;
                    push(name.to_string(), value)?;
                }
                KwargsOperation::Unpacking(expr) => match self.evaluate_expr(expr, frame)? {
                    TreewalkValue::Dict(dict) => {
                        for (key, value) in dict.borrow().items() {
                            let TreewalkValue::Str(key) = key else {
                                return Exception::type_error("keywords must be strings")
                                    .raise(self);
                            };
                            push(key, value)?;
                        }
                    }
                    other => {
                        return Exception::type_error(format!(
                            "argument after ** must be a mapping, not {}",
                            other.type_name()
                        ))
                        .raise(self)
                    }
                },
            }
        }

        Ok(Args::with_keywords(positional, keywords))
    }

    /// `super()` inside a method: the class the method was defined in and its first argument.
    fn zero_arg_super(&self, frame: &Frame) -> TreewalkResult<TreewalkValue> {
        let Some(function) = &frame.function else {
            return Exception::runtime_error("super(): no arguments").raise(self);
        };
        let (class, first) = {
            let function = function.borrow();
            let first = function.signature.params.first().map(|p| p.name.clone());
            (function.defining_class(), first)
        };
        let Some(class) = class else {
            return Exception::runtime_error("super(): __class__ cell not found").raise(self);
        };
        let receiver = match first.and_then(|name| self.lookup_local(&name, frame)) {
            Some(receiver) => receiver,
            None => return Exception::runtime_error("super(): no arguments").raise(self),
        };
        Ok(TreewalkValue::Super(Super {
            class,
            receiver: Box::new(receiver),
        }))
    }

    /// Evaluate a parameter list at definition time: defaults and annotations are bound once.
    pub(super) fn evaluate_signature(
        &self,
        params: &Params,
        returns: Option<&Expr>,
        frame: &Frame,
    ) -> TreewalkResult<FunctionSignature> {
        let evaluate_param = |param: &Param| -> TreewalkResult<FunctionParam> {
            let mut out = FunctionParam::new(param.arg.as_str());
            if let Some(annotation) = &param.annotation {
                out.annotation = Some(self.evaluate_annotation(annotation, frame)?);
            }
            if let Some(default) = &param.default {
                out.default = Some(self.evaluate_expr(default, frame)?);
            }
            Ok(out)
        };

        Ok(FunctionSignature {
            params: params
                .args
                .iter()
                .map(&evaluate_param)
                .collect::<TreewalkResult<_>>()?,
            positional_only: params.positional_only,
            args_var: params.args_var.as_ref().map(&evaluate_param).transpose()?,
            kwonly: params
                .kwonly
                .iter()
                .map(&evaluate_param)
                .collect::<TreewalkResult<_>>()?,
            kwargs_var: params.kwargs_var.as_ref().map(&evaluate_param).transpose()?,
            returns: returns
                .map(|r| self.evaluate_annotation(r, frame))
                .transpose()?,
        })
    }

    /// Annotations are evaluated eagerly. Names that do not resolve yet (forward references,
    /// imports guarded by `TYPE_CHECKING`) are kept as their source text.
    pub(super) fn evaluate_annotation(
        &self,
        annotation: &Expr,
        frame: &Frame,
    ) -> TreewalkResult<TreewalkValue> {
        match self.evaluate_expr(annotation, frame) {
            Ok(value) => Ok(value),
            Err(raised)
                if matches!(
                    raised.exception.kind,
                    Type::NameError | Type::AttributeError
                ) =>
            {
                Ok(TreewalkValue::Str(unparse(annotation)))
            }
            Err(raised) => Err(raised),
        }
    }

    fn define_lambda(
        &self,
        params: &Params,
        body: &Rc<Ast>,
        frame: &Frame,
    ) -> TreewalkResult<TreewalkValue> {
        let signature = self.evaluate_signature(params, None, frame)?;
        let line = body.first().map_or(0, |s| s.line);
        let function = Function {
            name: "<lambda>".into(),
            qualname: frame.qualify("<lambda>"),
            module: frame.module_name(),
            signature,
            body: Rc::clone(body),
            line,
            globals: frame.module.clone(),
            closure: frame.closure(),
            defining_class: None,
            doc: None,
            attrs: Scope::default(),
        };
        Ok(TreewalkValue::Function(Container::new(function)))
    }
}

fn is_super(callee: &TreewalkValue) -> bool {
    matches!(callee, TreewalkValue::Class(class) if class.borrow().builtin() == Some(Type::Super))
}

/// Source text for the annotation forms that commonly appear unresolved.
fn unparse(expr: &Expr) -> String {
    match expr {
        Expr::None => "None".into(),
        Expr::Ellipsis => "...".into(),
        Expr::Variable(name) => name.to_string(),
        Expr::StringLiteral(s) => s.clone(),
        Expr::MemberAccess { object, field } => format!("{}.{field}", unparse(object)),
        Expr::IndexAccess { object, index } => {
            let index = match index.as_ref() {
                Expr::Tuple(items) => items.iter().map(unparse).collect::<Vec<_>>().join(", "),
                other => unparse(other),
            };
            format!("{}[{index}]", unparse(object))
        }
        Expr::List(items) => format!(
            "[{}]",
            items.iter().map(unparse).collect::<Vec<_>>().join(", ")
        ),
        Expr::Tuple(items) => items.iter().map(unparse).collect::<Vec<_>>().join(", "),
        Expr::BinaryOperation { left, op, right } => {
            format!("{} {} {}", unparse(left), op.symbol(), unparse(right))
        }
        Expr::Integer(i) => i.to_string(),
        _ => "...".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{domain::Identifier, parser::types::BinOp};

    fn var(name: &str) -> Expr {
        Expr::Variable(Identifier::new(name).unwrap())
    }

    #[test]
    fn unparse_annotations() {
        let optional = Expr::IndexAccess {
            object: Box::new(Expr::MemberAccess {
                object: Box::new(var("typing")),
                field: Identifier::new("Optional").unwrap(),
            }),
            index: Box::new(var("Widget")),
        };
        assert_eq!(unparse(&optional), "typing.Optional[Widget]");

        let union = Expr::BinaryOperation {
            left: Box::new(var("Widget")),
            op: BinOp::BitwiseOr,
            right: Box::new(Expr::None),
        };
        assert_eq!(unparse(&union), "Widget | None");

        let mapping = Expr::IndexAccess {
            object: Box::new(var("dict")),
            index: Box::new(Expr::Tuple(vec![var("str"), var("Widget")])),
        };
        assert_eq!(unparse(&mapping), "dict[str, Widget]");
    }
}
