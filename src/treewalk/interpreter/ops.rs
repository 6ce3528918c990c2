use std::cmp::Ordering;

use crate::{
    core::Container,
    domain::{utils::resolve_index, Type},
    parser::types::{BinOp, CompareOp, UnaryOp},
    treewalk::{
        types::{Dict, Exception, GenericAlias, List, Slice, UnionType},
        utils::{args, format_with_spec, HashKey},
        Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
    },
};

/// The dunder implementing a binary operator, e.g. `__add__`.
fn dunder_for(op: &BinOp) -> &'static str {
    match op {
        BinOp::Add => "__add__",
        BinOp::Sub => "__sub__",
        BinOp::Mul => "__mul__",
        BinOp::Div => "__truediv__",
        BinOp::IntegerDiv => "__floordiv__",
        BinOp::Mod => "__mod__",
        BinOp::Expo => "__pow__",
        BinOp::MatMul => "__matmul__",
        BinOp::LeftShift => "__lshift__",
        BinOp::RightShift => "__rshift__",
        BinOp::BitwiseAnd => "__and__",
        BinOp::BitwiseOr => "__or__",
        BinOp::BitwiseXor => "__xor__",
    }
}

fn is_type_like(value: &TreewalkValue) -> bool {
    matches!(
        value,
        TreewalkValue::Class(_)
            | TreewalkValue::GenericAlias(_)
            | TreewalkValue::Union(_)
            | TreewalkValue::SpecialForm(_)
    )
}

fn int_like(value: &TreewalkValue) -> Option<i64> {
    match value {
        TreewalkValue::Int(i) => Some(*i),
        TreewalkValue::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn float_like(value: &TreewalkValue) -> Option<f64> {
    match value {
        TreewalkValue::Float(f) => Some(*f),
        other => int_like(other).map(|i| i as f64),
    }
}

fn overflow() -> Exception {
    Exception::overflow_error("integer overflow")
}

fn repeat<T: Clone>(items: &[T], times: i64) -> Vec<T> {
    if times <= 0 {
        return vec![];
    }
    let mut out = Vec::with_capacity(items.len() * times as usize);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

impl TreewalkInterpreter {
    pub fn binary_op(
        &self,
        op: &BinOp,
        left: TreewalkValue,
        right: TreewalkValue,
    ) -> TreewalkResult<TreewalkValue> {
        if let Some(result) = self.builtin_binary_op(op, &left, &right)? {
            return Ok(result);
        }

        let name = dunder_for(op);
        if let Some(result) = self.call_dunder(&left, name, args![right.clone()])? {
            if !result.is_none() {
                return Ok(result);
            }
        }
        let reflected = format!("__r{}", &name[2..]);
        if let Some(result) = self.call_dunder(&right, &reflected, args![left.clone()])? {
            if !result.is_none() {
                return Ok(result);
            }
        }

        let message = match (op, &left, &right) {
            (BinOp::Add, TreewalkValue::Str(_), other) => format!(
                "can only concatenate str (not \"{}\") to str",
                other.type_name()
            ),
            (BinOp::Add, TreewalkValue::List(_), other) => format!(
                "can only concatenate list (not \"{}\") to list",
                other.type_name()
            ),
            (
                BinOp::Mul,
                TreewalkValue::Str(_) | TreewalkValue::List(_) | TreewalkValue::Tuple(_),
                other,
            ) => format!(
                "can't multiply sequence by non-int of type '{}'",
                other.type_name()
            ),
            _ => format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        };
        Exception::type_error(message).raise(self)
    }

    fn builtin_binary_op(
        &self,
        op: &BinOp,
        left: &TreewalkValue,
        right: &TreewalkValue,
    ) -> TreewalkResult<Option<TreewalkValue>> {
        if let (TreewalkValue::Bool(a), TreewalkValue::Bool(b)) = (left, right) {
            match op {
                BinOp::BitwiseAnd => return Ok(Some(TreewalkValue::Bool(a & b))),
                BinOp::BitwiseOr => return Ok(Some(TreewalkValue::Bool(a | b))),
                BinOp::BitwiseXor => return Ok(Some(TreewalkValue::Bool(a ^ b))),
                _ => {}
            }
        }

        if let (Some(a), Some(b)) = (int_like(left), int_like(right)) {
            return self.int_op(op, a, b).raise(self).map(Some);
        }
        if let (Some(a), Some(b)) = (float_like(left), float_like(right)) {
            return self.float_op(op, a, b).raise(self);
        }

        let result = match (op, left, right) {
            (BinOp::Add, TreewalkValue::Str(a), TreewalkValue::Str(b)) => {
                TreewalkValue::Str(format!("{a}{b}"))
            }
            (BinOp::Add, TreewalkValue::Bytes(a), TreewalkValue::Bytes(b)) => {
                TreewalkValue::Bytes([a.as_slice(), b.as_slice()].concat())
            }
            (BinOp::Add, TreewalkValue::List(a), TreewalkValue::List(b)) => {
                let mut items = a.borrow().to_vec();
                items.extend(b.borrow().iter().cloned());
                TreewalkValue::new_list(items)
            }
            (BinOp::Add, TreewalkValue::Tuple(a), TreewalkValue::Tuple(b)) => {
                let mut items = a.to_vec();
                items.extend(b.iter().cloned());
                TreewalkValue::new_tuple(items)
            }
            (BinOp::Mul, TreewalkValue::Str(s), n) | (BinOp::Mul, n, TreewalkValue::Str(s))
                if int_like(n).is_some() =>
            {
                let times = int_like(n).unwrap_or_default();
                TreewalkValue::Str(s.repeat(times.max(0) as usize))
            }
            (BinOp::Mul, TreewalkValue::List(l), n) | (BinOp::Mul, n, TreewalkValue::List(l))
                if int_like(n).is_some() =>
            {
                TreewalkValue::new_list(repeat(l.borrow().items(), int_like(n).unwrap_or_default()))
            }
            (BinOp::Mul, TreewalkValue::Tuple(t), n) | (BinOp::Mul, n, TreewalkValue::Tuple(t))
                if int_like(n).is_some() =>
            {
                TreewalkValue::new_tuple(repeat(t.items(), int_like(n).unwrap_or_default()))
            }
            (BinOp::Mod, TreewalkValue::Str(format), args) => {
                TreewalkValue::Str(self.percent_format(format, args)?)
            }
            (BinOp::BitwiseOr, TreewalkValue::Dict(a), TreewalkValue::Dict(b)) => {
                let mut merged = a.borrow().clone();
                merged.extend(&b.borrow()).raise(self)?;
                TreewalkValue::new_dict(merged)
            }
            (BinOp::BitwiseOr, a, b)
                if (is_type_like(a) || is_type_like(b))
                    && (is_type_like(a) || a.is_none())
                    && (is_type_like(b) || b.is_none()) =>
            {
                TreewalkValue::Union(UnionType::of([a.clone(), b.clone()]))
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn int_op(&self, op: &BinOp, a: i64, b: i64) -> Result<TreewalkValue, Exception> {
        let value = match op {
            BinOp::Add => a.checked_add(b).ok_or_else(overflow)?,
            BinOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
            BinOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
            BinOp::Div => {
                if b == 0 {
                    return Err(Exception::zero_division_error("division by zero"));
                }
                return Ok(TreewalkValue::Float(a as f64 / b as f64));
            }
            BinOp::IntegerDiv => {
                if b == 0 {
                    return Err(Exception::zero_division_error(
                        "integer division or modulo by zero",
                    ));
                }
                let q = a.checked_div(b).ok_or_else(overflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(Exception::zero_division_error(
                        "integer division or modulo by zero",
                    ));
                }
                let r = a.checked_rem(b).ok_or_else(overflow)?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    r + b
                } else {
                    r
                }
            }
            BinOp::Expo => {
                if b < 0 {
                    if a == 0 {
                        return Err(Exception::zero_division_error(
                            "0.0 cannot be raised to a negative power",
                        ));
                    }
                    return Ok(TreewalkValue::Float((a as f64).powf(b as f64)));
                }
                let exp = u32::try_from(b).map_err(|_| overflow())?;
                a.checked_pow(exp).ok_or_else(overflow)?
            }
            BinOp::LeftShift => {
                if b < 0 {
                    return Err(Exception::value_error("negative shift count"));
                }
                if a == 0 {
                    0
                } else if b >= 63 {
                    return Err(overflow());
                } else {
                    let shifted = a << b;
                    if shifted >> b != a {
                        return Err(overflow());
                    }
                    shifted
                }
            }
            BinOp::RightShift => {
                if b < 0 {
                    return Err(Exception::value_error("negative shift count"));
                }
                if b >= 64 {
                    if a < 0 {
                        -1
                    } else {
                        0
                    }
                } else {
                    a >> b
                }
            }
            BinOp::BitwiseAnd => a & b,
            BinOp::BitwiseOr => a | b,
            BinOp::BitwiseXor => a ^ b,
            BinOp::MatMul => {
                return Err(Exception::type_error(
                    "unsupported operand type(s) for @: 'int' and 'int'",
                ))
            }
        };
        Ok(TreewalkValue::Int(value))
    }

    fn float_op(&self, op: &BinOp, a: f64, b: f64) -> Result<Option<TreewalkValue>, Exception> {
        let value = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                if b == 0.0 {
                    return Err(Exception::zero_division_error("float division by zero"));
                }
                a / b
            }
            BinOp::IntegerDiv => {
                if b == 0.0 {
                    return Err(Exception::zero_division_error(
                        "float floor division by zero",
                    ));
                }
                (a / b).floor()
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(Exception::zero_division_error("float modulo"));
                }
                let r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    r + b
                } else {
                    r
                }
            }
            BinOp::Expo => {
                if a == 0.0 && b < 0.0 {
                    return Err(Exception::zero_division_error(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                a.powf(b)
            }
            _ => return Ok(None),
        };
        Ok(Some(TreewalkValue::Float(value)))
    }

    /// printf-style `str % args`.
    fn percent_format(&self, format: &str, args: &TreewalkValue) -> TreewalkResult<String> {
        let (positional, mapping) = match args {
            TreewalkValue::Tuple(items) => (items.to_vec(), None),
            TreewalkValue::Dict(dict) => (vec![], Some(dict.clone())),
            other => (vec![other.clone()], None),
        };
        let mut positional = positional.into_iter();

        let mut out = String::new();
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }

            let value = if chars.peek() == Some(&'(') {
                chars.next();
                let key: String = chars.by_ref().take_while(|c| *c != ')').collect();
                let Some(mapping) = &mapping else {
                    return Exception::type_error("format requires a mapping").raise(self);
                };
                let found = mapping.borrow().get_str(&key);
                match found {
                    Some(value) => value,
                    None => return Exception::key_error(TreewalkValue::Str(key)).raise(self),
                }
            } else {
                match positional.next() {
                    Some(value) => value,
                    None => {
                        return Exception::type_error("not enough arguments for format string")
                            .raise(self)
                    }
                }
            };

            let mut flags = String::new();
            while let Some(&f) = chars.peek() {
                if !matches!(f, '-' | '+' | ' ' | '0' | '#') {
                    break;
                }
                flags.push(f);
                chars.next();
            }
            let mut width = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                width.push(d);
                chars.next();
            }
            let mut precision = String::new();
            if chars.peek() == Some(&'.') {
                chars.next();
                precision.push('.');
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    precision.push(d);
                    chars.next();
                }
            }
            let Some(kind) = chars.next() else {
                return Exception::value_error("incomplete format").raise(self);
            };

            let align = if flags.contains('-') { "<" } else { ">" };
            let sign = if flags.contains('+') { "+" } else { "" };
            let zero = if flags.contains('0') && !flags.contains('-') { "0" } else { "" };
            let (value, text, kind) = match kind {
                's' => {
                    let text = self.to_str(&value)?;
                    (TreewalkValue::Str(text.clone()), text, 's')
                }
                'r' => {
                    let text = self.repr(&value)?;
                    (TreewalkValue::Str(text.clone()), text, 's')
                }
                'd' | 'i' | 'u' => {
                    let int = match value {
                        TreewalkValue::Float(f) => TreewalkValue::Int(f.trunc() as i64),
                        other => TreewalkValue::Int(
                            other.as_int().map_err(|_| {
                                Exception::type_error(format!(
                                    "%d format: a real number is required, not {}",
                                    other.type_name()
                                ))
                            })
                            .raise(self)?,
                        ),
                    };
                    let text = int.to_string();
                    (int, text, 'd')
                }
                'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'x' | 'X' | 'o' => {
                    let text = value.to_string();
                    (value, text, kind)
                }
                other => {
                    return Exception::value_error(format!(
                        "unsupported format character '{other}'"
                    ))
                    .raise(self)
                }
            };
            let spec = format!("{align}{sign}{zero}{width}{precision}{kind}");
            let spec = if zero.is_empty() { spec } else { spec.replacen('>', "", 1) };
            out.push_str(&format_with_spec(&value, &spec, &text).raise(self)?);
        }

        if positional.next().is_some() {
            return Exception::type_error("not all arguments converted during string formatting")
                .raise(self);
        }
        Ok(out)
    }

    pub(super) fn unary_op(&self, op: &UnaryOp, right: TreewalkValue) -> TreewalkResult<TreewalkValue> {
        let result = match (op, &right) {
            (UnaryOp::Not, value) => return Ok(TreewalkValue::Bool(!self.truthy(value)?)),
            (UnaryOp::Minus, TreewalkValue::Float(f)) => Some(TreewalkValue::Float(-f)),
            (UnaryOp::Minus, value) => match int_like(value) {
                Some(i) => Some(TreewalkValue::Int(i.checked_neg().ok_or_else(overflow).raise(self)?)),
                None => None,
            },
            (UnaryOp::Plus, TreewalkValue::Float(f)) => Some(TreewalkValue::Float(*f)),
            (UnaryOp::Plus, value) => int_like(value).map(TreewalkValue::Int),
            (UnaryOp::BitwiseNot, value) => int_like(value).map(|i| TreewalkValue::Int(!i)),
        };
        if let Some(result) = result {
            return Ok(result);
        }

        let (dunder, symbol) = match op {
            UnaryOp::Minus => ("__neg__", "-"),
            UnaryOp::Plus => ("__pos__", "+"),
            UnaryOp::BitwiseNot => ("__invert__", "~"),
            UnaryOp::Not => unreachable!("handled above"),
        };
        match self.call_dunder(&right, dunder, args![])? {
            Some(result) => Ok(result),
            None => Exception::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                right.type_name()
            ))
            .raise(self),
        }
    }

    pub fn compare(
        &self,
        op: &CompareOp,
        left: &TreewalkValue,
        right: &TreewalkValue,
    ) -> TreewalkResult<bool> {
        match op {
            CompareOp::Equals => self.equals(left, right),
            CompareOp::NotEquals => {
                if let Some(result) = self.call_dunder(left, "__ne__", args![right.clone()])? {
                    return self.truthy(&result);
                }
                Ok(!self.equals(left, right)?)
            }
            CompareOp::In => self.contains(right, left),
            CompareOp::NotIn => Ok(!self.contains(right, left)?),
            CompareOp::Is => Ok(is_same(left, right)),
            CompareOp::IsNot => Ok(!is_same(left, right)),
            CompareOp::LessThan
            | CompareOp::LessThanOrEqual
            | CompareOp::GreaterThan
            | CompareOp::GreaterThanOrEqual => self.order(op, left, right),
        }
    }

    pub fn equals(&self, left: &TreewalkValue, right: &TreewalkValue) -> TreewalkResult<bool> {
        for (receiver, other) in [(left, right), (right, left)] {
            if let Some(result) = self.call_dunder(receiver, "__eq__", args![other.clone()])? {
                return self.truthy(&result);
            }
        }

        match (left, right) {
            (TreewalkValue::List(a), TreewalkValue::List(b)) => {
                if a.same_identity(b) {
                    return Ok(true);
                }
                let (a, b) = (a.borrow().to_vec(), b.borrow().to_vec());
                self.sequences_equal(&a, &b)
            }
            (TreewalkValue::Tuple(a), TreewalkValue::Tuple(b)) => {
                self.sequences_equal(a.items(), b.items())
            }
            (TreewalkValue::Dict(a), TreewalkValue::Dict(b)) => {
                if a.same_identity(b) {
                    return Ok(true);
                }
                let (a, b) = (a.borrow().clone(), b.borrow().clone());
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (key, value) in a.iter() {
                    match b.get(key).raise(self)? {
                        Some(other) if self.equals(value, &other)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            _ => Ok(left == right),
        }
    }

    fn sequences_equal(&self, a: &[TreewalkValue], b: &[TreewalkValue]) -> TreewalkResult<bool> {
        if a.len() != b.len() {
            return Ok(false);
        }
        for (x, y) in a.iter().zip(b) {
            if !self.equals(x, y)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn order(
        &self,
        op: &CompareOp,
        left: &TreewalkValue,
        right: &TreewalkValue,
    ) -> TreewalkResult<bool> {
        let (dunder, reflected) = match op {
            CompareOp::LessThan => ("__lt__", "__gt__"),
            CompareOp::LessThanOrEqual => ("__le__", "__ge__"),
            CompareOp::GreaterThan => ("__gt__", "__lt__"),
            _ => ("__ge__", "__le__"),
        };
        if let Some(result) = self.call_dunder(left, dunder, args![right.clone()])? {
            return self.truthy(&result);
        }
        if let Some(result) = self.call_dunder(right, reflected, args![left.clone()])? {
            return self.truthy(&result);
        }

        let ordering = match self.ordering(left, right)? {
            Some(ordering) => ordering,
            None => {
                // NaN compares false with everything.
                if float_like(left).is_some() && float_like(right).is_some() {
                    return Ok(false);
                }
                return Exception::type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ))
                .raise(self);
            }
        };

        Ok(match op {
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        })
    }

    /// Total ordering between two builtin values, or `None` when they are not orderable.
    pub fn ordering(
        &self,
        left: &TreewalkValue,
        right: &TreewalkValue,
    ) -> TreewalkResult<Option<Ordering>> {
        if let (Some(a), Some(b)) = (int_like(left), int_like(right)) {
            return Ok(Some(a.cmp(&b)));
        }
        if let (Some(a), Some(b)) = (float_like(left), float_like(right)) {
            return Ok(a.partial_cmp(&b));
        }
        match (left, right) {
            (TreewalkValue::Str(a), TreewalkValue::Str(b)) => Ok(Some(a.cmp(b))),
            (TreewalkValue::Bytes(a), TreewalkValue::Bytes(b)) => Ok(Some(a.cmp(b))),
            (TreewalkValue::List(a), TreewalkValue::List(b)) => {
                let (a, b) = (a.borrow().to_vec(), b.borrow().to_vec());
                self.lexicographic(&a, &b)
            }
            (TreewalkValue::Tuple(a), TreewalkValue::Tuple(b)) => {
                self.lexicographic(a.items(), b.items())
            }
            _ => Ok(None),
        }
    }

    fn lexicographic(
        &self,
        a: &[TreewalkValue],
        b: &[TreewalkValue],
    ) -> TreewalkResult<Option<Ordering>> {
        for (x, y) in a.iter().zip(b) {
            if !self.equals(x, y)? {
                return Ok(Some(if self.compare(&CompareOp::LessThan, x, y)? {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }));
            }
        }
        Ok(Some(a.len().cmp(&b.len())))
    }

    pub fn contains(&self, container: &TreewalkValue, item: &TreewalkValue) -> TreewalkResult<bool> {
        match container {
            TreewalkValue::Str(s) => match item {
                TreewalkValue::Str(needle) => Ok(s.contains(needle.as_str())),
                other => Exception::type_error(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))
                .raise(self),
            },
            TreewalkValue::Dict(dict) => dict.borrow().contains(item).raise(self),
            TreewalkValue::Range(range) => Ok(int_like(item).is_some_and(|i| range.contains(i))),
            TreewalkValue::Bytes(bytes) => match item {
                TreewalkValue::Int(i) => Ok(bytes.iter().any(|b| *b as i64 == *i)),
                TreewalkValue::Bytes(needle) if needle.is_empty() => Ok(true),
                TreewalkValue::Bytes(needle) => {
                    Ok(bytes.windows(needle.len()).any(|w| w == needle.as_slice()))
                }
                other => Exception::type_error(format!(
                    "a bytes-like object is required, not '{}'",
                    other.type_name()
                ))
                .raise(self),
            },
            TreewalkValue::Object(_) => {
                match self.call_dunder(container, "__contains__", args![item.clone()])? {
                    Some(result) => self.truthy(&result),
                    None => self.contains_by_iteration(container, item),
                }
            }
            _ => self.contains_by_iteration(container, item),
        }
    }

    fn contains_by_iteration(
        &self,
        container: &TreewalkValue,
        item: &TreewalkValue,
    ) -> TreewalkResult<bool> {
        let items = match self.iterate(container) {
            Ok(items) => items,
            Err(raised) if raised.exception.kind == Type::TypeError => {
                return Exception::type_error(format!(
                    "argument of type '{}' is not iterable",
                    container.type_name()
                ))
                .raise(self)
            }
            Err(raised) => return Err(raised),
        };
        for candidate in &items {
            if is_same(candidate, item) || self.equals(candidate, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn truthy(&self, value: &TreewalkValue) -> TreewalkResult<bool> {
        Ok(match value {
            TreewalkValue::None => false,
            TreewalkValue::Bool(b) => *b,
            TreewalkValue::Int(i) => *i != 0,
            TreewalkValue::Float(f) => *f != 0.0,
            TreewalkValue::Str(s) => !s.is_empty(),
            TreewalkValue::Bytes(b) => !b.is_empty(),
            TreewalkValue::List(l) => !l.borrow().is_empty(),
            TreewalkValue::Tuple(t) => !t.is_empty(),
            TreewalkValue::Dict(d) => !d.borrow().is_empty(),
            TreewalkValue::Range(r) => !r.is_empty(),
            TreewalkValue::Object(_) => {
                if let Some(result) = self.call_dunder(value, "__bool__", args![])? {
                    return match result {
                        TreewalkValue::Bool(b) => Ok(b),
                        other => Exception::type_error(format!(
                            "__bool__ should return bool, returned {}",
                            other.type_name()
                        ))
                        .raise(self),
                    };
                }
                if let Some(result) = self.call_dunder(value, "__len__", args![])? {
                    return Ok(result.as_int().raise(self)? != 0);
                }
                true
            }
            _ => true,
        })
    }

    /// Collect every item an iterable produces.
    pub fn iterate(&self, value: &TreewalkValue) -> TreewalkResult<Vec<TreewalkValue>> {
        match value {
            TreewalkValue::List(list) => Ok(list.borrow().to_vec()),
            TreewalkValue::Tuple(tuple) => Ok(tuple.to_vec()),
            TreewalkValue::Str(s) => Ok(s.chars().map(|c| TreewalkValue::Str(c.to_string())).collect()),
            TreewalkValue::Bytes(b) => Ok(b.iter().map(|b| TreewalkValue::Int(*b as i64)).collect()),
            TreewalkValue::Dict(dict) => Ok(dict.borrow().keys()),
            TreewalkValue::Range(range) => Ok(range.iter().map(TreewalkValue::Int).collect()),
            TreewalkValue::Object(_) => {
                let Some(iterator) = self.call_dunder(value, "__iter__", args![])? else {
                    return Exception::type_error_not_iterable(&value.type_name()).raise(self);
                };
                if !matches!(iterator, TreewalkValue::Object(_)) {
                    return self.iterate(&iterator);
                }

                let mut items = vec![];
                loop {
                    match self.call_dunder(&iterator, "__next__", args![]) {
                        Ok(Some(item)) => items.push(item),
                        Ok(None) => {
                            return Exception::type_error(format!(
                                "iter() returned non-iterator of type '{}'",
                                iterator.type_name()
                            ))
                            .raise(self)
                        }
                        Err(raised)
                            if raised.exception.kind == Type::StopIteration =>
                        {
                            return Ok(items)
                        }
                        Err(raised) => return Err(raised),
                    }
                }
            }
            _ => Exception::type_error_not_iterable(&value.type_name()).raise(self),
        }
    }

    pub fn hash_key(&self, value: &TreewalkValue) -> TreewalkResult<HashKey> {
        HashKey::try_from(value).raise(self)
    }

    pub fn get_item(
        &self,
        object: &TreewalkValue,
        index: &TreewalkValue,
    ) -> TreewalkResult<TreewalkValue> {
        match object {
            TreewalkValue::List(list) => {
                let items = list.borrow().to_vec();
                Ok(match self.index_sequence(&items, index, "list")? {
                    Selection::Item(_, item) => item,
                    Selection::Slice(items) => TreewalkValue::new_list(items),
                })
            }
            TreewalkValue::Tuple(tuple) => Ok(match self.index_sequence(tuple.items(), index, "tuple")? {
                Selection::Item(_, item) => item,
                Selection::Slice(items) => TreewalkValue::new_tuple(items),
            }),
            TreewalkValue::Str(s) => {
                let chars: Vec<_> = s.chars().map(|c| TreewalkValue::Str(c.to_string())).collect();
                Ok(match self.index_sequence(&chars, index, "string")? {
                    Selection::Item(_, item) => item,
                    Selection::Slice(items) => {
                        TreewalkValue::Str(items.iter().map(|c| c.to_string()).collect())
                    }
                })
            }
            TreewalkValue::Bytes(bytes) => {
                let items: Vec<_> = bytes.iter().map(|b| TreewalkValue::Int(*b as i64)).collect();
                Ok(match self.index_sequence(&items, index, "index")? {
                    Selection::Item(_, item) => item,
                    Selection::Slice(items) => TreewalkValue::Bytes(
                        items.iter().filter_map(|i| int_like(i).map(|i| i as u8)).collect(),
                    ),
                })
            }
            TreewalkValue::Range(range) => {
                let i = int_like(index).ok_or_else(|| {
                    Exception::type_error(format!(
                        "range indices must be integers or slices, not {}",
                        index.type_name()
                    ))
                });
                let i = i.raise(self)?;
                match resolve_index(i, range.len()).and_then(|i| range.get(i)) {
                    Some(value) => Ok(TreewalkValue::Int(value)),
                    None => Exception::index_error("range object index out of range").raise(self),
                }
            }
            TreewalkValue::Dict(dict) => {
                let found = dict.borrow().get(index).raise(self)?;
                match found {
                    Some(value) => Ok(value),
                    None => Exception::key_error(index.clone()).raise(self),
                }
            }
            TreewalkValue::Class(_) | TreewalkValue::GenericAlias(_) => {
                Ok(TreewalkValue::GenericAlias(GenericAlias {
                    origin: Box::new(object.clone()),
                    args: type_args(index),
                }))
            }
            TreewalkValue::SpecialForm(form) => Ok(match form.name.as_str() {
                "Union" => TreewalkValue::Union(UnionType::of(type_args(index))),
                _ => TreewalkValue::GenericAlias(GenericAlias {
                    origin: Box::new(object.clone()),
                    args: type_args(index),
                }),
            }),
            TreewalkValue::Object(_) => {
                match self.call_dunder(object, "__getitem__", args![index.clone()])? {
                    Some(value) => Ok(value),
                    None => self.not_subscriptable(object),
                }
            }
            _ => self.not_subscriptable(object),
        }
    }

    fn not_subscriptable<T>(&self, object: &TreewalkValue) -> TreewalkResult<T> {
        Exception::type_error(format!(
            "'{}' object is not subscriptable",
            object.type_name()
        ))
        .raise(self)
    }

    /// Index or slice a sequence.
    fn index_sequence(
        &self,
        items: &[TreewalkValue],
        index: &TreewalkValue,
        kind: &str,
    ) -> TreewalkResult<Selection> {
        match index {
            TreewalkValue::Slice(slice) => {
                let selected = slice
                    .indices(items.len())
                    .raise(self)?
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect();
                Ok(Selection::Slice(selected))
            }
            other => match int_like(other) {
                Some(i) => match resolve_index(i, items.len()) {
                    Some(position) => Ok(Selection::Item(position, items[position].clone())),
                    None => Exception::index_error(format!("{kind} index out of range")).raise(self),
                },
                None => Exception::type_error(format!(
                    "{kind} indices must be integers or slices, not {}",
                    other.type_name()
                ))
                .raise(self),
            },
        }
    }

    pub fn set_item(
        &self,
        object: &TreewalkValue,
        index: TreewalkValue,
        value: TreewalkValue,
    ) -> TreewalkResult<()> {
        match object {
            TreewalkValue::List(list) => match &index {
                TreewalkValue::Slice(slice) => self.assign_slice(list, slice, value),
                other => {
                    let Some(i) = int_like(other) else {
                        return Exception::type_error(format!(
                            "list indices must be integers or slices, not {}",
                            other.type_name()
                        ))
                        .raise(self);
                    };
                    let len = list.borrow().len();
                    match resolve_index(i, len) {
                        Some(position) => {
                            list.borrow_mut().set(position, value);
                            Ok(())
                        }
                        None => Exception::index_error("list assignment index out of range")
                            .raise(self),
                    }
                }
            },
            TreewalkValue::Dict(dict) => dict.borrow_mut().insert(index, value).raise(self),
            TreewalkValue::Object(_) => {
                match self.call_dunder(object, "__setitem__", args![index, value])? {
                    Some(_) => Ok(()),
                    None => self.no_item_assignment(object),
                }
            }
            _ => self.no_item_assignment(object),
        }
    }

    fn no_item_assignment<T>(&self, object: &TreewalkValue) -> TreewalkResult<T> {
        Exception::type_error(format!(
            "'{}' object does not support item assignment",
            object.type_name()
        ))
        .raise(self)
    }

    fn assign_slice(
        &self,
        list: &Container<List>,
        slice: &Slice,
        value: TreewalkValue,
    ) -> TreewalkResult<()> {
        let new_items = self.iterate(&value)?;
        let len = list.borrow().len();
        let indices = slice.indices(len).raise(self)?;

        if slice.step.unwrap_or(1) == 1 {
            let start = indices.first().copied().unwrap_or_else(|| {
                let start = slice.start.unwrap_or(0);
                let start = if start < 0 { (len as i64 + start).max(0) } else { start };
                (start as usize).min(len)
            });
            let end = indices.last().map_or(start, |i| i + 1);
            let mut items = list.borrow().to_vec();
            items.splice(start..end, new_items);
            list.borrow_mut().replace(items);
            return Ok(());
        }

        if indices.len() != new_items.len() {
            return Exception::value_error(format!(
                "attempt to assign sequence of size {} to extended slice of size {}",
                new_items.len(),
                indices.len()
            ))
            .raise(self);
        }
        let mut list = list.borrow_mut();
        for (i, item) in indices.into_iter().zip(new_items) {
            list.set(i, item);
        }
        Ok(())
    }

    pub(super) fn delete_item(
        &self,
        object: &TreewalkValue,
        index: &TreewalkValue,
    ) -> TreewalkResult<()> {
        match object {
            TreewalkValue::List(list) => {
                let items = list.borrow().to_vec();
                match self.index_sequence(&items, index, "list")? {
                    Selection::Item(position, _) => {
                        list.borrow_mut().remove_at(position);
                    }
                    Selection::Slice(_) => {
                        let TreewalkValue::Slice(slice) = index else {
                            return Ok(());
                        };
                        let mut doomed = slice.indices(items.len()).raise(self)?;
                        doomed.sort_unstable();
                        let mut list = list.borrow_mut();
                        for position in doomed.into_iter().rev() {
                            list.remove_at(position);
                        }
                    }
                }
                Ok(())
            }
            TreewalkValue::Dict(dict) => {
                let removed = dict.borrow_mut().remove(index).raise(self)?;
                match removed {
                    Some(_) => Ok(()),
                    None => Exception::key_error(index.clone()).raise(self),
                }
            }
            TreewalkValue::Object(_) => {
                match self.call_dunder(object, "__delitem__", args![index.clone()])? {
                    Some(_) => Ok(()),
                    None => self.no_item_deletion(object),
                }
            }
            _ => self.no_item_deletion(object),
        }
    }

    fn no_item_deletion<T>(&self, object: &TreewalkValue) -> TreewalkResult<T> {
        Exception::type_error(format!(
            "'{}' object doesn't support item deletion",
            object.type_name()
        ))
        .raise(self)
    }

    /// Build a `dict` from key/value pairs, hashing through the interpreter.
    pub fn dict_from_pairs(
        &self,
        pairs: Vec<(TreewalkValue, TreewalkValue)>,
    ) -> TreewalkResult<TreewalkValue> {
        Dict::from_items(pairs).raise(self).map(TreewalkValue::new_dict)
    }
}

enum Selection {
    Item(usize, TreewalkValue),
    Slice(Vec<TreewalkValue>),
}

/// The arguments of a subscripted type: `X[a, b]` has two, `X[a]` one.
fn type_args(index: &TreewalkValue) -> Vec<TreewalkValue> {
    match index {
        TreewalkValue::Tuple(items) => items.to_vec(),
        other => vec![other.clone()],
    }
}

/// Python's `is`.
pub fn is_same(left: &TreewalkValue, right: &TreewalkValue) -> bool {
    match (left, right) {
        (TreewalkValue::None, TreewalkValue::None)
        | (TreewalkValue::Ellipsis, TreewalkValue::Ellipsis) => true,
        (TreewalkValue::Bool(a), TreewalkValue::Bool(b)) => a == b,
        (TreewalkValue::Int(a), TreewalkValue::Int(b)) => a == b,
        (TreewalkValue::Str(a), TreewalkValue::Str(b)) => a == b,
        (TreewalkValue::Tuple(a), TreewalkValue::Tuple(b)) => a.is_empty() && b.is_empty(),
        (TreewalkValue::BuiltinFunction(a), TreewalkValue::BuiltinFunction(b)) => a == b,
        (TreewalkValue::SpecialForm(a), TreewalkValue::SpecialForm(b)) => a == b,
        _ => {
            let (a, b) = (left.identity(), right.identity());
            a != 0 && a == b
        }
    }
}
