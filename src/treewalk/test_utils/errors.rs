/// Assert that a raised exception has the given builtin type and, optionally, message.
macro_rules! assert_error {
    ($raised:expr, $kind:ident) => {{
        let raised = &$raised;
        assert_eq!(
            raised.exception.get_type(),
            $crate::domain::Type::$kind,
            "Unexpected exception: {}",
            raised.exception
        );
    }};
    ($raised:expr, $kind:ident, $message:expr) => {{
        let raised = &$raised;
        assert_eq!(
            raised.exception.get_type(),
            $crate::domain::Type::$kind,
            "Unexpected exception: {}",
            raised.exception
        );
        assert_eq!(raised.exception.message(), $message, "Unexpected message");
    }};
}

pub(crate) use assert_error;
