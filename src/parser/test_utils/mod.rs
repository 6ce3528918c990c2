mod helpers;

pub(crate) use helpers::*;
