macro_rules! assert_eval_eq {
    ($input:expr, $expected:expr) => {
        assert_eq!(eval($input), $crate::treewalk::TreewalkValue::from($expected));
    };
}

macro_rules! assert_read_eq {
    ($ctx:expr, $input:expr, $expected:expr) => {
        assert_eq!(
            read(&$ctx, $input),
            $crate::treewalk::TreewalkValue::from($expected)
        );
    };
}

/// Compare the `repr()` of an expression, for values without a convenient Rust constructor.
macro_rules! assert_eval_repr {
    ($input:expr, $expected:expr) => {
        assert_eq!(eval($input).repr(), $expected);
    };
}

pub(crate) use assert_eval_eq;
pub(crate) use assert_eval_repr;
pub(crate) use assert_read_eq;
