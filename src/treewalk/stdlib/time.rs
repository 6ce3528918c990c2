use std::{
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::treewalk::{
    types::{BuiltinFn, Exception, Module},
    utils::{check_args, Args},
    Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
};

use super::new_module;

static FUNCTIONS: [(&str, BuiltinFn); 5] = [
    ("monotonic", monotonic),
    ("perf_counter", monotonic),
    ("sleep", sleep),
    ("time", time),
    ("time_ns", time_ns),
];

thread_local! {
    static START: Instant = Instant::now();
}

pub(super) fn module() -> Module {
    new_module("time", &FUNCTIONS)
}

fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

fn time(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "time", 0, 0, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Float(since_epoch().as_secs_f64()))
}

fn time_ns(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "time_ns", 0, 0, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Int(since_epoch().as_nanos() as i64))
}

fn monotonic(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "monotonic", 0, 0, &[]).raise(interpreter)?;
    Ok(TreewalkValue::Float(
        START.with(|start| start.elapsed().as_secs_f64()),
    ))
}

fn sleep(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "sleep", 1, 1, &[]).raise(interpreter)?;
    let seconds = args.get_arg(0).as_float().raise(interpreter)?;
    if seconds < 0.0 || !seconds.is_finite() {
        return Exception::value_error("sleep length must be non-negative").raise(interpreter);
    }
    thread::sleep(Duration::from_secs_f64(seconds));
    Ok(TreewalkValue::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    #[test]
    fn clocks_advance() {
        let interpreter = TreewalkInterpreter::new(ModuleRegistry::new(), vec![]);
        let first = monotonic(&interpreter, args![]).unwrap().as_float().unwrap();
        sleep(&interpreter, args![TreewalkValue::Float(0.001)]).unwrap();
        let second = monotonic(&interpreter, args![]).unwrap().as_float().unwrap();
        assert!(second > first);

        let e = sleep(&interpreter, args![TreewalkValue::Int(-1)]).unwrap_err();
        assert_eq!(e.exception.message(), "sleep length must be non-negative");
    }
}
