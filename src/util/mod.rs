pub(crate) mod arith;
