use crate::treewalk::{types::Module, TreewalkValue};

use super::new_module;

/// Features are accepted and have no effect: annotations are always evaluated eagerly.
const FEATURES: [&str; 4] = ["annotations", "division", "absolute_import", "print_function"];

pub(super) fn module() -> Module {
    let mut module = new_module("__future__", &[]);
    for feature in FEATURES {
        module.insert(feature, TreewalkValue::Bool(true));
    }
    module
}
