//! Structural equality over parameter values.
//!
//! Cyclic values cannot be built from [`Value`] without an [`OpaqueRef`], and
//! opaque handles are never traversed, so recursion always terminates.
//!
//! [`OpaqueRef`]: shared::OpaqueRef

use std::collections::BTreeMap;

use shared::{Args, Value};

/// Deep equality: primitives by value, arrays elementwise, records over the
/// union of their keys, opaque handles by identity.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => float_eq(*x, *y),
        (Value::Int(i), Value::Float(x)) | (Value::Float(x), Value::Int(i)) => {
            int_float_eq(*i, *x)
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => slices_equal(xs, ys),
        (Value::Record(xs), Value::Record(ys)) => records_equal(xs, ys),
        (Value::Opaque(x), Value::Opaque(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// Parameter snapshots are equal when they have the same length and every
/// position is structurally equal.
pub fn args_equal(a: &Args, b: &Args) -> bool {
    slices_equal(a.values(), b.values())
}

fn slices_equal(xs: &[Value], ys: &[Value]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equal(x, y))
}

fn records_equal(xs: &BTreeMap<String, Value>, ys: &BTreeMap<String, Value>) -> bool {
    // A key missing on one side reads as `Undefined`, so `{a: undefined}` equals `{}`.
    let covers = |this: &BTreeMap<String, Value>, other: &BTreeMap<String, Value>| {
        this.iter().all(|(key, x)| match other.get(key) {
            Some(y) => equal(x, y),
            None => x.is_undefined(),
        })
    };
    covers(xs, ys) && covers(ys, xs)
}

fn float_eq(x: f64, y: f64) -> bool {
    x == y || (x.is_nan() && y.is_nan())
}

/// Exact: the float must be integral and inside the `i64` range, and the
/// comparison happens on integers so no precision is lost.
fn int_float_eq(i: i64, x: f64) -> bool {
    const LOWER: f64 = i64::MIN as f64;
    const UPPER: f64 = -(i64::MIN as f64);
    x.fract() == 0.0 && (LOWER..UPPER).contains(&x) && i == x as i64
}

#[cfg(test)]
#[path = "tests/compare_tests.rs"]
mod tests;
