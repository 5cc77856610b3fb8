//! Comparison and arithmetic kernel over the value model.
//!
//! `equal` and `less` are the primitives; the remaining comparisons are
//! derived from them and propagate their errors unchanged. Arithmetic
//! follows a fixed operand table with `__add__` dispatch for instances.

use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

const EQ_METHOD: &str = "__eq__";
const LT_METHOD: &str = "__lt__";
const ADD_METHOD: &str = "__add__";

pub fn equal(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(l == r),
        (Value::Bool(l), Value::Bool(r)) => Ok(l == r),
        (Value::String(l), Value::String(r)) => Ok(l == r),
        (Value::None, Value::None) => Ok(true),
        (Value::Instance(handle), _) if handle.has_method(EQ_METHOD, 1) => {
            expect_bool(handle.call(EQ_METHOD, vec![rhs.clone()], ctx)?, EQ_METHOD)
        }
        _ => Err(incomparable("equality", lhs, rhs)),
    }
}

pub fn less(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(l < r),
        (Value::Bool(l), Value::Bool(r)) => Ok(l < r),
        (Value::String(l), Value::String(r)) => Ok(l < r),
        (Value::Instance(handle), _) if handle.has_method(LT_METHOD, 1) => {
            expect_bool(handle.call(LT_METHOD, vec![rhs.clone()], ctx)?, LT_METHOD)
        }
        _ => Err(incomparable("ordering", lhs, rhs)),
    }
}

pub fn not_equal(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, ctx)?)
}

pub fn greater(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    // Both constituents are evaluated so either one's error surfaces.
    let eq = equal(lhs, rhs, ctx)?;
    let lt = less(lhs, rhs, ctx)?;
    Ok(!eq && !lt)
}

pub fn less_or_equal(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    let eq = equal(lhs, rhs, ctx)?;
    let lt = less(lhs, rhs, ctx)?;
    Ok(eq || lt)
}

pub fn greater_or_equal(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, ctx)?)
}

pub fn add(lhs: &Value, rhs: &Value, ctx: &mut Context) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{l}{r}"))),
        (Value::Instance(handle), _) if handle.has_method(ADD_METHOD, 1) => {
            handle.call(ADD_METHOD, vec![rhs.clone()], ctx)
        }
        _ => Err(unsupported("+", lhs, rhs)),
    }
}

pub fn sub(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
        _ => Err(unsupported("-", lhs, rhs)),
    }
}

pub fn mul(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
        _ => Err(unsupported("*", lhs, rhs)),
    }
}

/// Integer division, truncated toward zero.
pub fn div(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(0)) => Err(RuntimeError::DivisionByZero),
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l / r)),
        _ => Err(unsupported("/", lhs, rhs)),
    }
}

fn expect_bool(value: Value, method: &'static str) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::ComparisonNotBoolean {
            method,
            type_name: other.type_name(),
        }),
    }
}

fn incomparable(comparison: &'static str, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::Incomparable {
        comparison,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn unsupported(operation: &'static str, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperands {
        operation,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}
