//! Built-in function dispatch: the bodies behind the ids in
//! [`rill_par::BUILTINS`]. Builtins are pure — they take their arguments by
//! value off the stack and return a single `Value` — rather than by address,
//! so `append`/`remove` return a new collection instead of mutating their
//! argument in place; callers that want the effect to stick reassign it
//! (`xs = append(xs, 1);`), same as any other expression result.

use rill_value::{Collection, Tag, Value};

use crate::error::{VmError, VmResult};

pub fn dispatch(id: usize, args: Vec<Value>) -> VmResult<Value> {
    match id {
        0 => print(args),
        1 => len(args),
        2 => type_of(args),
        3 => to_string(args),
        4 => keys(args),
        5 => append(args),
        6 => remove(args),
        7 => parse_json(args),
        8 => to_json(args),
        other => Err(VmError::UnknownBuiltin(other)),
    }
}

fn arg(args: &[Value], i: usize) -> VmResult<&Value> {
    args.get(i).ok_or(VmError::StackUnderflow)
}

fn print(args: Vec<Value>) -> VmResult<Value> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::default_unit())
}

fn len(args: Vec<Value>) -> VmResult<Value> {
    let v = arg(&args, 0)?;
    let n = match v {
        Value::Collection(c) => c.len(),
        Value::String(s) => s.chars().count(),
        other => return Err(VmError::Builtin(format!("len() is not defined for {}", other.tag()))),
    };
    Ok(Value::Integer(n as i64))
}

fn type_of(args: Vec<Value>) -> VmResult<Value> {
    Ok(Value::String(arg(&args, 0)?.tag().to_string()))
}

fn to_string(args: Vec<Value>) -> VmResult<Value> {
    Ok(rill_value::convert(arg(&args, 0)?, Tag::String))
}

fn keys(args: Vec<Value>) -> VmResult<Value> {
    match arg(&args, 0)? {
        Value::Collection(c) => {
            let out = Collection::from_positional(c.keys().map(|k| Value::String(k.to_string())));
            Ok(Value::Collection(out))
        }
        other => Err(VmError::NotACollection(other.to_string())),
    }
}

fn append(args: Vec<Value>) -> VmResult<Value> {
    let collection = arg(&args, 0)?;
    let value = arg(&args, 1)?.clone();
    match collection {
        Value::Collection(c) => {
            let mut out = c.clone();
            let next = out.contiguous_len();
            out.insert(next.to_string(), value);
            Ok(Value::Collection(out))
        }
        other => Err(VmError::NotACollection(other.to_string())),
    }
}

/// `parseJson(text)` — returns the parsed collection, or a `String` holding
/// the one-line diagnostic if `text` is not well-formed JSON (§4.5).
fn parse_json(args: Vec<Value>) -> VmResult<Value> {
    let text = arg(&args, 0)?.to_string();
    Ok(rill_json::parse_or_error_value(&text))
}

fn to_json(args: Vec<Value>) -> VmResult<Value> {
    Ok(Value::String(rill_json::serialize(arg(&args, 0)?)))
}

fn remove(args: Vec<Value>) -> VmResult<Value> {
    let collection = arg(&args, 0)?;
    let key = arg(&args, 1)?.to_string();
    match collection {
        Value::Collection(c) => {
            let mut out = Collection::new();
            for (k, v) in c.iter() {
                if k != key {
                    out.insert(k.to_string(), v.clone());
                }
            }
            Ok(Value::Collection(out))
        }
        other => Err(VmError::NotACollection(other.to_string())),
    }
}
