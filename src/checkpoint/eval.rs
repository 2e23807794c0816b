//! Expression evaluation over JSON values

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use super::parser::{ArithOp, CmpOp, Expr};
use super::{EvalError, EvalErrorKind, Scope};

fn type_error(message: String) -> EvalError {
    EvalError::new(EvalErrorKind::Type, message)
}

fn key_error(message: String) -> EvalError {
    EvalError::new(EvalErrorKind::Key, message)
}

/// Name of a value's type, as shown in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Truthiness: empty and zero values are false
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::new(EvalErrorKind::Name, format!("name '{}' is not defined", name))),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Dict(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                let key = match evaluate(key, scope)? {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(type_error(format!(
                            "unhashable type: '{}'",
                            type_name(&other)
                        )))
                    }
                };
                map.insert(key, evaluate(value, scope)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Index(target, index) => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            subscript(&target, &index)
        }
        Expr::Field(target, name) => match evaluate(target, scope)? {
            Value::Object(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| key_error(format!("'{}'", name))),
            other => Err(type_error(format!(
                "'{}' object has no attribute '{}'",
                type_name(&other),
                name
            ))),
        },
        Expr::Call(function, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(function, &args, scope)
        }
        Expr::Neg(operand) => match evaluate(operand, scope)? {
            Value::Number(n) => match n.as_i64() {
                Some(i) => i
                    .checked_neg()
                    .map(Value::from)
                    .ok_or_else(|| type_error("integer overflow".to_string())),
                None => number(-n.as_f64().unwrap_or(0.0)),
            },
            other => Err(type_error(format!(
                "bad operand type for unary -: '{}'",
                type_name(&other)
            ))),
        },
        Expr::Not(operand) => Ok(Value::Bool(!truthy(&evaluate(operand, scope)?))),
        Expr::Arith(op, left, right) => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            arith(*op, left, right)
        }
        Expr::Compare(first, rest) => {
            let mut left = evaluate(first, scope)?;
            for (op, right) in rest {
                let right = evaluate(right, scope)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::And(left, right) => {
            let left = evaluate(left, scope)?;
            if truthy(&left) {
                evaluate(right, scope)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = evaluate(left, scope)?;
            if truthy(&left) {
                Ok(left)
            } else {
                evaluate(right, scope)
            }
        }
    }
}

fn number(f: f64) -> Result<Value, EvalError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| type_error("numeric result is not finite".to_string()))
}

/// Resolve a possibly negative list index
fn list_index(len: usize, index: &Value) -> Result<Option<usize>, EvalError> {
    let Some(i) = index.as_i64() else {
        return Err(type_error(format!(
            "indices must be integers, not '{}'",
            type_name(index)
        )));
    };
    let resolved = if i < 0 { len as i64 + i } else { i };
    Ok((0..len as i64).contains(&resolved).then_some(resolved as usize))
}

pub fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Object(map) => {
            let key = match index {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(type_error(format!(
                        "unhashable type: '{}'",
                        type_name(other)
                    )))
                }
            };
            map.get(&key)
                .cloned()
                .ok_or_else(|| key_error(format!("'{}'", key)))
        }
        Value::Array(items) => list_index(items.len(), index)?
            .map(|i| items[i].clone())
            .ok_or_else(|| key_error("list index out of range".to_string())),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            list_index(chars.len(), index)?
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| key_error("string index out of range".to_string()))
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            type_name(other)
        ))),
    }
}

/// Equality with numeric coercion (`1 == 1.0`)
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| loose_eq(x, y)))
        }
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let unsupported = || {
        type_error(format!(
            "ordering not supported between '{}' and '{}'",
            type_name(left),
            type_name(right)
        ))
    };
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Ok(x.cmp(&y)),
            _ => a
                .as_f64()
                .zip(b.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .ok_or_else(unsupported),
        },
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                match order(x, y)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(unsupported()),
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                type_name(other)
            ))),
        },
        Value::Array(items) => Ok(items.iter().any(|x| loose_eq(x, item))),
        Value::Object(map) => match item {
            Value::String(key) => Ok(map.contains_key(key)),
            Value::Number(n) => Ok(map.contains_key(&n.to_string())),
            Value::Null | Value::Bool(_) => Ok(false),
            other => Err(type_error(format!(
                "unhashable type: '{}'",
                type_name(other)
            ))),
        },
        other => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            type_name(other)
        ))),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => loose_eq(left, right),
        CmpOp::Ne => !loose_eq(left, right),
        CmpOp::Lt => order(left, right)? == Ordering::Less,
        CmpOp::Le => order(left, right)? != Ordering::Greater,
        CmpOp::Gt => order(left, right)? == Ordering::Greater,
        CmpOp::Ge => order(left, right)? != Ordering::Less,
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
        CmpOp::Is => left == right,
        CmpOp::IsNot => left != right,
    })
}

fn arith(op: ArithOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (op, &left, &right) {
        (_, Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => {
                let result = match op {
                    ArithOp::Add => x.checked_add(y),
                    ArithOp::Sub => x.checked_sub(y),
                };
                result
                    .map(Value::from)
                    .ok_or_else(|| type_error("integer overflow".to_string()))
            }
            _ => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                number(match op {
                    ArithOp::Add => x + y,
                    ArithOp::Sub => x - y,
                })
            }
        },
        (ArithOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (ArithOp::Add, Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b).cloned().collect()))
        }
        _ => Err(type_error(format!(
            "unsupported operand types for {}: '{}' and '{}'",
            if op == ArithOp::Add { "+" } else { "-" },
            type_name(&left),
            type_name(&right)
        ))),
    }
}

/// Render a value the way `str()` does
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn arity(function: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(type_error(format!(
            "{}() takes {} argument(s) but {} were given",
            function,
            expected,
            args.len()
        )))
    }
}

fn call(function: &str, args: &[Value], scope: &Scope) -> Result<Value, EvalError> {
    match function {
        "len" => {
            arity(function, args, 1)?;
            let len = match &args[0] {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => {
                    return Err(type_error(format!(
                        "object of type '{}' has no len()",
                        type_name(other)
                    )))
                }
            };
            Ok(Value::from(len))
        }
        "str" => {
            arity(function, args, 1)?;
            Ok(Value::String(render(&args[0])))
        }
        "int" => {
            arity(function, args, 1)?;
            match &args[0] {
                Value::Number(n) => Ok(n
                    .as_i64()
                    .map(Value::from)
                    .unwrap_or_else(|| Value::from(n.as_f64().unwrap_or(0.0).trunc() as i64))),
                Value::Bool(b) => Ok(Value::from(*b as i64)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| type_error(format!("invalid literal for int(): '{}'", s))),
                other => Err(type_error(format!(
                    "int() argument must be a string or a number, not '{}'",
                    type_name(other)
                ))),
            }
        }
        "role_id" => {
            arity(function, args, 2)?;
            role_id(&args[0], &args[1])
        }
        "export_rows" => {
            arity(function, args, 1)?;
            export_rows(&args[0], scope)
        }
        _ => Err(EvalError::new(
            EvalErrorKind::Name,
            format!("name '{}' is not defined", function),
        )),
    }
}

/// Id of the entry in `query.data.list` whose `name` equals `name`
///
/// Returns null when no entry matches, so a checkpoint comparing against it
/// simply fails.
fn role_id(query: &Value, name: &Value) -> Result<Value, EvalError> {
    let data = subscript(query, &Value::from("data"))?;
    let list = subscript(&data, &Value::from("list"))?;
    let Value::Array(entries) = list else {
        return Err(type_error(format!(
            "role list must be a list, not '{}'",
            type_name(&list)
        )));
    };
    for entry in &entries {
        if entry.get("name").map_or(false, |n| loose_eq(n, name)) {
            return subscript(entry, &Value::from("id"));
        }
    }
    tracing::error!("Could not find a role named '{}'", render(name));
    Ok(Value::Null)
}

/// Data rows (header excluded) of the first sheet of a saved export file
fn export_rows(name: &Value, scope: &Scope) -> Result<Value, EvalError> {
    let Value::String(name) = name else {
        return Err(type_error(format!(
            "export_rows() argument must be a str, not '{}'",
            type_name(name)
        )));
    };
    let path = scope
        .export_path(name)
        .ok_or_else(|| key_error(format!("no export file '{}' was saved", name)))?;
    crate::workbook::data_rows(path)
        .map(Value::from)
        .map_err(|e| EvalError::new(EvalErrorKind::Io, e.to_string()))
}
