//! Global objects and the methods of built-in types.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use serde::Serialize;
use uuid::Uuid;

use super::error::ErrorKind;
use super::interpreter::{Eval, Interpreter};
use super::value::{number_to_string, NativeFn, Object, ObjectClass, Value};
use crate::console::ConsoleLevel;

/// Nesting depth at which `JSON.stringify` assumes a cycle
const JSON_MAX_DEPTH: usize = 128;

/// Largest string `repeat`/`padStart`/`padEnd` will build
const MAX_STRING_LEN: usize = 1 << 24;

/// Largest array `Array(n)` will allocate
const MAX_ARRAY_LEN: usize = 1 << 20;

const GLOBAL_FUNCTIONS: &[(&str, NativeFn)] = &[
    ("String", global_string),
    ("Number", global_number),
    ("Boolean", global_boolean),
    ("Array", global_array),
    ("Object", global_object),
    ("parseInt", parse_int),
    ("parseFloat", parse_float),
    ("isNaN", is_nan),
    ("isFinite", is_finite),
    ("Error", error_ctor),
    ("TypeError", type_error_ctor),
    ("RangeError", range_error_ctor),
    ("ReferenceError", reference_error_ctor),
    ("SyntaxError", syntax_error_ctor),
];

const CONSOLE_METHODS: &[(&str, NativeFn)] = &[
    ("log", console_log),
    ("info", console_info),
    ("warn", console_warn),
    ("error", console_error),
    ("debug", console_debug),
];

const MATH_METHODS: &[(&str, NativeFn)] = &[
    ("abs", math_abs),
    ("floor", math_floor),
    ("ceil", math_ceil),
    ("round", math_round),
    ("trunc", math_trunc),
    ("sign", math_sign),
    ("sqrt", math_sqrt),
    ("cbrt", math_cbrt),
    ("exp", math_exp),
    ("log", math_log),
    ("log2", math_log2),
    ("log10", math_log10),
    ("sin", math_sin),
    ("cos", math_cos),
    ("tan", math_tan),
    ("atan2", math_atan2),
    ("pow", math_pow),
    ("hypot", math_hypot),
    ("min", math_min),
    ("max", math_max),
    ("random", math_random),
];

const JSON_METHODS: &[(&str, NativeFn)] = &[("stringify", json_stringify), ("parse", json_parse)];

const DATE_METHODS: &[(&str, NativeFn)] = &[("now", date_now)];

/// Members reachable through a global constructor, e.g. `Array.isArray`
const STATIC_METHODS: &[(&str, &str, NativeFn)] = &[
    ("Array", "isArray", array_is_array),
    ("Array", "from", array_from),
    ("Array", "of", array_of),
    ("Object", "keys", object_keys),
    ("Object", "values", object_values),
    ("Object", "entries", object_entries),
    ("Object", "assign", object_assign),
    ("Number", "isInteger", number_is_integer),
    ("Number", "isFinite", number_is_finite),
    ("Number", "isNaN", number_is_nan),
    ("Number", "parseFloat", parse_float),
    ("Number", "parseInt", parse_int),
    ("String", "fromCharCode", string_from_char_code),
];

/// Populate the global scope.
pub fn install(interp: &mut Interpreter<'_>) {
    interp.define_global("undefined", Value::Undefined);
    interp.define_global("NaN", Value::Number(f64::NAN));
    interp.define_global("Infinity", Value::Number(f64::INFINITY));

    for (name, func) in GLOBAL_FUNCTIONS {
        interp.define_global(name, Value::native(*name, *func));
    }

    let console = namespace(CONSOLE_METHODS);
    let console = interp.new_object(console);
    interp.define_global("console", console);

    let mut math = namespace(MATH_METHODS);
    math.set("PI", Value::Number(std::f64::consts::PI));
    math.set("E", Value::Number(std::f64::consts::E));
    math.set("SQRT2", Value::Number(std::f64::consts::SQRT_2));
    math.set("LN2", Value::Number(std::f64::consts::LN_2));
    math.set("LN10", Value::Number(std::f64::consts::LN_10));
    let math = interp.new_object(math);
    interp.define_global("Math", math);

    let json = interp.new_object(namespace(JSON_METHODS));
    interp.define_global("JSON", json);

    let date = interp.new_object(namespace(DATE_METHODS));
    interp.define_global("Date", date);
}

fn namespace(methods: &[(&'static str, NativeFn)]) -> Object {
    let mut object = Object::new(ObjectClass::Plain);
    for (name, func) in methods {
        object.set(name, Value::native(*name, *func));
    }
    object
}

/// Look up a member of a global constructor.
pub fn static_property(owner: &str, key: &str) -> Option<Value> {
    match (owner, key) {
        ("Number", "MAX_SAFE_INTEGER") => return Some(Value::Number(9_007_199_254_740_991.0)),
        ("Number", "MIN_SAFE_INTEGER") => return Some(Value::Number(-9_007_199_254_740_991.0)),
        ("Number", "EPSILON") => return Some(Value::Number(f64::EPSILON)),
        ("Number", "MAX_VALUE") => return Some(Value::Number(f64::MAX)),
        _ => {}
    }
    STATIC_METHODS
        .iter()
        .find(|(o, k, _)| *o == owner && *k == key)
        .map(|(_, name, func)| Value::native(*name, *func))
}

/// Dispatch a method call on a built-in receiver.
///
/// Returns `None` when the receiver has no built-in method of that name, in
/// which case the caller falls back to an ordinary property lookup.
pub fn call_method(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    key: &str,
    args: &[Value],
) -> Option<Eval<Value>> {
    match receiver {
        Value::Array(items) => array_method(interp, items, key, args),
        Value::Str(text) => string_method(interp, text, key, args),
        Value::Number(n) => number_method(interp, *n, key, args),
        Value::Bool(b) if key == "toString" => Some(Ok(Value::str(if *b { "true" } else { "false" }))),
        Value::Object(object) => {
            if object.borrow().get(key).is_some() {
                return None;
            }
            match key {
                "hasOwnProperty" => {
                    let name = arg(args, 0).to_js_string();
                    let found = object.borrow().get(&name).is_some();
                    Some(Ok(Value::Bool(found)))
                }
                "toString" => Some(Ok(Value::str(&receiver.to_js_string()))),
                _ => None,
            }
        }
        _ => None,
    }
}

// ----- argument helpers -----

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    args.get(index).map(Value::to_number).unwrap_or(f64::NAN)
}

/// ToIntegerOrInfinity
fn to_integer(value: &Value) -> f64 {
    let n = value.to_number();
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a possibly negative index argument against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = to_integer(value);
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                n.min(len as f64) as usize
            }
        }
    }
}

fn slice_range(len: usize, args: &[Value]) -> (usize, usize) {
    let start = relative_index(args.first(), len, 0);
    let end = relative_index(args.get(1), len, len);
    (start, end.max(start))
}

fn expect_function(interp: &mut Interpreter<'_>, value: &Value) -> Eval<()> {
    match value {
        Value::Function(_) => Ok(()),
        other => {
            let description = other.to_js_string();
            interp.throw(ErrorKind::TypeError, format!("{description} is not a function"))
        }
    }
}

fn chars_to_values(text: &str) -> Vec<Value> {
    text.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()
}

// ----- console -----

fn console_write(interp: &mut Interpreter<'_>, level: ConsoleLevel, args: &[Value]) -> Eval<Value> {
    let text = args.iter().map(Value::to_js_string).collect::<Vec<_>>().join(" ");
    interp.write(level, &text);
    Ok(Value::Undefined)
}

fn console_log(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    console_write(interp, ConsoleLevel::Log, args)
}

fn console_info(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    console_write(interp, ConsoleLevel::Info, args)
}

fn console_warn(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    console_write(interp, ConsoleLevel::Warn, args)
}

fn console_error(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    console_write(interp, ConsoleLevel::Error, args)
}

fn console_debug(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    console_write(interp, ConsoleLevel::Debug, args)
}

// ----- global functions -----

fn global_string(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(match args.first() {
        None => Value::str(""),
        Some(value) => Value::str(&value.to_js_string()),
    })
}

fn global_number(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0)))
}

fn global_boolean(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(arg(args, 0).is_truthy()))
}

fn global_array(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    if let [Value::Number(len)] = args {
        if *len < 0.0 || len.fract() != 0.0 || *len > MAX_ARRAY_LEN as f64 {
            return interp.throw(ErrorKind::RangeError, "Invalid array length");
        }
        return Ok(interp.new_array(vec![Value::Undefined; *len as usize]));
    }
    Ok(interp.new_array(args.to_vec()))
}

fn global_object(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    match args.first() {
        Some(value @ (Value::Object(_) | Value::Array(_) | Value::Function(_))) => Ok(value.clone()),
        _ => Ok(interp.new_object(Object::new(ObjectClass::Plain))),
    }
}

fn parse_int(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let text = arg(args, 0).to_js_string();
    let mut rest = text.trim_start();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let mut radix = match args.get(1) {
        None | Some(Value::Undefined) => 0,
        Some(value) => to_integer(value) as u32,
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    if radix == 0 || radix == 16 {
        if let Some(stripped) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = stripped;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }

    let mut value = None;
    for digit in rest.chars().map_while(|c| c.to_digit(radix)) {
        value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
    }
    Ok(Value::Number(value.map(|v| sign * v).unwrap_or(f64::NAN)))
}

fn parse_float(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let text = arg(args, 0).to_js_string();
    Ok(Value::Number(parse_float_prefix(text.trim_start())))
}

/// Longest prefix of `text` that reads as a decimal literal.
fn parse_float_prefix(text: &str) -> f64 {
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") && text.len() - unsigned.len() <= 1 {
        return if text.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while bytes.get(fraction_end).is_some_and(u8::is_ascii_digit) {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - fraction_start;
        end = fraction_end;
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }
        let exponent_digits_start = exponent_end;
        while bytes.get(exponent_end).is_some_and(u8::is_ascii_digit) {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }
    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn is_nan(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(number_arg(args, 0).is_nan()))
}

fn is_finite(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(number_arg(args, 0).is_finite()))
}

fn make_error(interp: &mut Interpreter<'_>, kind: ErrorKind, args: &[Value]) -> Eval<Value> {
    let message = match args.first() {
        None | Some(Value::Undefined) => String::new(),
        Some(value) => value.to_js_string(),
    };
    Ok(interp.new_error(kind, &message))
}

fn error_ctor(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    make_error(interp, ErrorKind::Error, args)
}

fn type_error_ctor(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    make_error(interp, ErrorKind::TypeError, args)
}

fn range_error_ctor(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    make_error(interp, ErrorKind::RangeError, args)
}

fn reference_error_ctor(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    make_error(interp, ErrorKind::ReferenceError, args)
}

fn syntax_error_ctor(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    make_error(interp, ErrorKind::SyntaxError, args)
}

// ----- Math -----

fn math_abs(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).abs()))
}

fn math_floor(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).floor()))
}

fn math_ceil(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).ceil()))
}

/// Halves round toward positive infinity: `Math.round(-2.5) === -2`
fn math_round(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let n = number_arg(args, 0);
    let floor = n.floor();
    Ok(Value::Number(if n - floor >= 0.5 { floor + 1.0 } else { floor }))
}

fn math_trunc(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).trunc()))
}

fn math_sign(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let n = number_arg(args, 0);
    Ok(Value::Number(if n == 0.0 || n.is_nan() { n } else { n.signum() }))
}

fn math_sqrt(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).sqrt()))
}

fn math_cbrt(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).cbrt()))
}

fn math_exp(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).exp()))
}

fn math_log(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).ln()))
}

fn math_log2(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).log2()))
}

fn math_log10(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).log10()))
}

fn math_sin(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).sin()))
}

fn math_cos(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).cos()))
}

fn math_tan(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).tan()))
}

fn math_atan2(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Number(number_arg(args, 0).atan2(number_arg(args, 1))))
}

fn math_pow(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let (base, exponent) = (number_arg(args, 0), number_arg(args, 1));
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(base.powf(exponent)))
}

fn math_hypot(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(Value::Number(sum.sqrt()))
}

fn math_min(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let mut result = f64::INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Value::Number(result))
}

fn math_max(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let mut result = f64::NEG_INFINITY;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Value::Number(result))
}

/// Uniform in [0, 1), taken from the random bits of a v4 UUID
fn math_random(_: &mut Interpreter<'_>, _: &[Value]) -> Eval<Value> {
    const MANTISSA_BITS: u32 = 53;
    let bits = (Uuid::new_v4().as_u128() as u64) & ((1 << MANTISSA_BITS) - 1);
    Ok(Value::Number(bits as f64 / (1u64 << MANTISSA_BITS) as f64))
}

fn date_now(_: &mut Interpreter<'_>, _: &[Value]) -> Eval<Value> {
    Ok(Value::Number(chrono::Utc::now().timestamp_millis() as f64))
}

// ----- JSON -----

fn json_stringify(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let Some(json) = to_json(interp, &arg(args, 0), 0)? else {
        return Ok(Value::Undefined);
    };

    let indent = match args.get(2) {
        Some(Value::Number(n)) if *n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Some(Value::Str(s)) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let text = if indent.is_empty() {
        serde_json::to_string(&json)
    } else {
        to_pretty_json(&json, &indent)
    };
    match text {
        Ok(text) => Ok(Value::str(&text)),
        Err(err) => interp.throw(ErrorKind::TypeError, err.to_string()),
    }
}

fn to_pretty_json(json: &serde_json::Value, indent: &str) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    json.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// `None` for values JSON skips: `undefined` and functions
fn to_json(interp: &mut Interpreter<'_>, value: &Value, depth: usize) -> Eval<Option<serde_json::Value>> {
    if depth > JSON_MAX_DEPTH {
        return interp.throw(ErrorKind::TypeError, "Converting circular structure to JSON");
    }
    Ok(match value {
        Value::Undefined | Value::Function(_) => None,
        Value::Null => Some(serde_json::Value::Null),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Number(n) => Some(json_number(*n)),
        Value::Str(s) => Some(serde_json::Value::String(s.to_string())),
        Value::Array(items) => {
            let items = items.borrow().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(to_json(interp, item, depth + 1)?.unwrap_or(serde_json::Value::Null));
            }
            Some(serde_json::Value::Array(out))
        }
        Value::Object(object) => {
            let entries: Vec<(String, Value)> = {
                let object = object.borrow();
                let entries = match object.class {
                    // name and message are not enumerable
                    ObjectClass::Error(_) => Vec::new(),
                    ObjectClass::Plain => object.entries().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                };
                entries
            };
            let mut map = serde_json::Map::new();
            for (key, value) in entries {
                if let Some(json) = to_json(interp, &value, depth + 1)? {
                    map.insert(key, json);
                }
            }
            Some(serde_json::Value::Object(map))
        }
    })
}

fn json_number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    // Integral values print without a trailing ".0"
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn json_parse(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let text = arg(args, 0).to_js_string();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => Ok(from_json(interp, json)),
        Err(err) => interp.throw(ErrorKind::SyntaxError, format!("Invalid JSON: {err}")),
    }
}

fn from_json(interp: &mut Interpreter<'_>, json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::str(&s),
        serde_json::Value::Array(items) => {
            let items = items.into_iter().map(|item| from_json(interp, item)).collect();
            interp.new_array(items)
        }
        serde_json::Value::Object(map) => {
            let mut object = Object::new(ObjectClass::Plain);
            for (key, value) in map {
                let value = from_json(interp, value);
                object.set(&key, value);
            }
            interp.new_object(object)
        }
    }
}

// ----- constructor statics -----

fn array_is_array(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Array(_)))))
}

fn array_from(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let items = match args.first() {
        Some(Value::Array(items)) => items.borrow().clone(),
        Some(Value::Str(text)) => chars_to_values(text),
        Some(Value::Object(object)) => {
            let len = object.borrow().get("length").map(to_integer).unwrap_or(0.0);
            vec![Value::Undefined; len.clamp(0.0, MAX_ARRAY_LEN as f64) as usize]
        }
        _ => Vec::new(),
    };

    let items = match args.get(1) {
        Some(map @ Value::Function(_)) => {
            let mut mapped = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                mapped.push(interp.call_value(map, &[item, Value::Number(index as f64)], "mapFn")?);
            }
            mapped
        }
        _ => items,
    };
    Ok(interp.new_array(items))
}

fn array_of(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(interp.new_array(args.to_vec()))
}

/// Enumerable own properties, in insertion order.
fn own_entries(interp: &mut Interpreter<'_>, value: &Value) -> Eval<Vec<(String, Value)>> {
    match value {
        Value::Undefined | Value::Null => {
            interp.throw(ErrorKind::TypeError, "Cannot convert undefined or null to object")
        }
        Value::Object(object) => {
            let object = object.borrow();
            let entries = match object.class {
                ObjectClass::Error(_) => Vec::new(),
                ObjectClass::Plain => object.entries().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            };
            Ok(entries)
        }
        Value::Array(items) => Ok(items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect()),
        Value::Str(text) => Ok(chars_to_values(text)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect()),
        Value::Bool(_) | Value::Number(_) | Value::Function(_) => Ok(Vec::new()),
    }
}

fn object_keys(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let keys = own_entries(interp, &arg(args, 0))?
        .into_iter()
        .map(|(key, _)| Value::str(&key))
        .collect();
    Ok(interp.new_array(keys))
}

fn object_values(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let values = own_entries(interp, &arg(args, 0))?
        .into_iter()
        .map(|(_, value)| value)
        .collect();
    Ok(interp.new_array(values))
}

fn object_entries(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let entries = own_entries(interp, &arg(args, 0))?;
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        pairs.push(interp.new_array(vec![Value::str(&key), value]));
    }
    Ok(interp.new_array(pairs))
}

fn object_assign(interp: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let target = arg(args, 0);
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for (key, value) in own_entries(interp, source)? {
            interp.set_property(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn number_is_integer(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Number(n)) if n.is_finite() && n.fract() == 0.0)))
}

fn number_is_finite(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Number(n)) if n.is_finite())))
}

fn number_is_nan(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    Ok(Value::Bool(matches!(args.first(), Some(Value::Number(n)) if n.is_nan())))
}

fn string_from_char_code(_: &mut Interpreter<'_>, args: &[Value]) -> Eval<Value> {
    let text: String = args
        .iter()
        .map(|code| char::from_u32(to_integer(code) as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    Ok(Value::str(&text))
}

// ----- Array.prototype -----

fn array_method(
    interp: &mut Interpreter<'_>,
    array: &Rc<RefCell<Vec<Value>>>,
    key: &str,
    args: &[Value],
) -> Option<Eval<Value>> {
    let result = match key {
        "push" => {
            let mut items = array.borrow_mut();
            items.extend_from_slice(args);
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => Ok(array.borrow_mut().pop().unwrap_or(Value::Undefined)),
        "shift" => {
            let mut items = array.borrow_mut();
            Ok(if items.is_empty() { Value::Undefined } else { items.remove(0) })
        }
        "unshift" => {
            let mut items = array.borrow_mut();
            items.splice(0..0, args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }
        "slice" => {
            let part = {
                let items = array.borrow();
                let (start, end) = slice_range(items.len(), args);
                items[start..end].to_vec()
            };
            Ok(interp.new_array(part))
        }
        "splice" => {
            let removed = {
                let mut items = array.borrow_mut();
                let len = items.len();
                let start = relative_index(args.first(), len, 0);
                let delete = match args.get(1) {
                    None => len - start,
                    Some(count) => to_integer(count).clamp(0.0, (len - start) as f64) as usize,
                };
                items
                    .splice(start..start + delete, args.iter().skip(2).cloned())
                    .collect::<Vec<_>>()
            };
            Ok(interp.new_array(removed))
        }
        "concat" => {
            let mut out = array.borrow().clone();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Ok(interp.new_array(out))
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(value) => value.to_js_string(),
            };
            let pieces: Vec<String> = array
                .borrow()
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
                .collect();
            Ok(Value::str(&pieces.join(&separator)))
        }
        "toString" => Ok(Value::str(&Value::Array(array.clone()).to_js_string())),
        "reverse" => {
            array.borrow_mut().reverse();
            Ok(Value::Array(array.clone()))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = array.borrow().iter().position(|item| item.strict_equals(&needle));
            Ok(Value::Number(position.map(|p| p as f64).unwrap_or(-1.0)))
        }
        "includes" => {
            let needle = arg(args, 0);
            let found = array.borrow().iter().any(|item| item.same_value_zero(&needle));
            Ok(Value::Bool(found))
        }
        "at" => {
            let items = array.borrow();
            let n = to_integer(&arg(args, 0));
            let index = if n < 0.0 { items.len() as f64 + n } else { n };
            Ok(if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or(Value::Undefined)
            })
        }
        "fill" => {
            let value = arg(args, 0);
            {
                let mut items = array.borrow_mut();
                let (start, end) = slice_range(items.len(), args.get(1..).unwrap_or(&[]));
                items[start..end].fill(value);
            }
            Ok(Value::Array(array.clone()))
        }
        "flat" => {
            let depth = match args.first() {
                None | Some(Value::Undefined) => 1.0,
                Some(value) => to_integer(value),
            };
            let items = array.borrow().clone();
            let mut out = Vec::new();
            flatten_into(&mut out, items, depth.clamp(0.0, 64.0) as usize);
            Ok(interp.new_array(out))
        }
        "map" | "filter" | "forEach" | "find" | "findIndex" | "some" | "every" => {
            array_iterate(interp, array, key, args)
        }
        "reduce" => array_reduce(interp, array, args),
        "sort" => array_sort(interp, array, args),
        _ => return None,
    };
    Some(result)
}

fn flatten_into(out: &mut Vec<Value>, items: Vec<Value>, depth: usize) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => {
                let inner = inner.borrow().clone();
                flatten_into(out, inner, depth - 1);
            }
            other => out.push(other),
        }
    }
}

fn array_iterate(
    interp: &mut Interpreter<'_>,
    array: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: &[Value],
) -> Eval<Value> {
    let callback = arg(args, 0);
    expect_function(interp, &callback)?;

    let mut collected = Vec::new();
    let len = array.borrow().len();
    for index in 0..len {
        let next = array.borrow().get(index).cloned();
        let Some(item) = next else { break };
        let call_args = [item.clone(), Value::Number(index as f64), Value::Array(array.clone())];
        let result = interp.call_value(&callback, &call_args, "callback")?;
        match method {
            "map" => collected.push(result),
            "filter" if result.is_truthy() => collected.push(item),
            "find" if result.is_truthy() => return Ok(item),
            "findIndex" if result.is_truthy() => return Ok(Value::Number(index as f64)),
            "some" if result.is_truthy() => return Ok(Value::Bool(true)),
            "every" if !result.is_truthy() => return Ok(Value::Bool(false)),
            _ => {}
        }
    }

    Ok(match method {
        "map" | "filter" => interp.new_array(collected),
        "findIndex" => Value::Number(-1.0),
        "some" => Value::Bool(false),
        "every" => Value::Bool(true),
        _ => Value::Undefined,
    })
}

fn array_reduce(interp: &mut Interpreter<'_>, array: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> Eval<Value> {
    let callback = arg(args, 0);
    expect_function(interp, &callback)?;

    let len = array.borrow().len();
    let mut index = 0;
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None if len == 0 => {
            return interp.throw(ErrorKind::TypeError, "Reduce of empty array with no initial value");
        }
        None => {
            index = 1;
            array.borrow().first().cloned().unwrap_or(Value::Undefined)
        }
    };

    while index < len {
        let next = array.borrow().get(index).cloned();
        let Some(item) = next else { break };
        let call_args = [accumulator, item, Value::Number(index as f64), Value::Array(array.clone())];
        accumulator = interp.call_value(&callback, &call_args, "callback")?;
        index += 1;
    }
    Ok(accumulator)
}

fn array_sort(interp: &mut Interpreter<'_>, array: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> Eval<Value> {
    let comparator = match args.first() {
        None | Some(Value::Undefined) => None,
        Some(function @ Value::Function(_)) => Some(function.clone()),
        Some(_) => {
            return interp.throw(
                ErrorKind::TypeError,
                "The comparison function must be either a function or undefined",
            );
        }
    };
    let items = array.borrow().clone();
    let sorted = merge_sort(interp, items, comparator.as_ref())?;
    *array.borrow_mut() = sorted;
    Ok(Value::Array(array.clone()))
}

/// Stable sort with a comparator that may throw.
fn merge_sort(interp: &mut Interpreter<'_>, mut items: Vec<Value>, comparator: Option<&Value>) -> Eval<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(interp, items, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => sort_compare(interp, b, a, comparator)? == Ordering::Less,
            _ => break,
        };
        merged.extend(if take_right { right.next() } else { left.next() });
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn sort_compare(interp: &mut Interpreter<'_>, a: &Value, b: &Value, comparator: Option<&Value>) -> Eval<Ordering> {
    // undefined always sorts last and never reaches the comparator
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
        (Value::Undefined, _) => return Ok(Ordering::Greater),
        (_, Value::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    match comparator {
        Some(function) => {
            let result = interp.call_value(function, &[a.clone(), b.clone()], "comparator")?.to_number();
            Ok(if result < 0.0 {
                Ordering::Less
            } else if result > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        }
        None => Ok(a.to_js_string().cmp(&b.to_js_string())),
    }
}

// ----- String.prototype -----

fn string_method(interp: &mut Interpreter<'_>, text: &Rc<str>, key: &str, args: &[Value]) -> Option<Eval<Value>> {
    let string_arg = |index: usize| arg(args, index).to_js_string();
    let char_count = || text.chars().count();

    let result = match key {
        "toUpperCase" => Ok(Value::str(&text.to_uppercase())),
        "toLowerCase" => Ok(Value::str(&text.to_lowercase())),
        "trim" => Ok(Value::str(text.trim())),
        "trimStart" => Ok(Value::str(text.trim_start())),
        "trimEnd" => Ok(Value::str(text.trim_end())),
        "includes" => Ok(Value::Bool(text.contains(string_arg(0).as_str()))),
        "startsWith" => Ok(Value::Bool(text.starts_with(string_arg(0).as_str()))),
        "endsWith" => Ok(Value::Bool(text.ends_with(string_arg(0).as_str()))),
        "indexOf" => {
            let position = text
                .find(string_arg(0).as_str())
                .map(|byte| text[..byte].chars().count() as f64);
            Ok(Value::Number(position.unwrap_or(-1.0)))
        }
        "slice" => {
            let (start, end) = slice_range(char_count(), args);
            Ok(Value::str(&text.chars().skip(start).take(end - start).collect::<String>()))
        }
        "substring" => {
            let len = char_count() as f64;
            let bound = |index: usize, default: f64| match args.get(index) {
                None | Some(Value::Undefined) => default,
                Some(value) => to_integer(value).clamp(0.0, len),
            };
            let (a, b) = (bound(0, 0.0), bound(1, len));
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Ok(Value::str(
                &text.chars().skip(start as usize).take((end - start) as usize).collect::<String>(),
            ))
        }
        "charAt" => {
            let index = to_integer(&arg(args, 0));
            let found = (index >= 0.0).then(|| text.chars().nth(index as usize)).flatten();
            Ok(Value::str(&found.map(String::from).unwrap_or_default()))
        }
        "charCodeAt" => {
            let index = to_integer(&arg(args, 0));
            let found = (index >= 0.0).then(|| text.chars().nth(index as usize)).flatten();
            Ok(Value::Number(found.map(|c| f64::from(u32::from(c))).unwrap_or(f64::NAN)))
        }
        "at" => {
            let n = to_integer(&arg(args, 0));
            let index = if n < 0.0 { char_count() as f64 + n } else { n };
            let found = (index >= 0.0).then(|| text.chars().nth(index as usize)).flatten();
            Ok(found.map(|c| Value::str(&c.to_string())).unwrap_or(Value::Undefined))
        }
        "repeat" => {
            let count = arg(args, 0).to_number();
            if count < 0.0 || count.is_infinite() {
                return Some(interp.throw(
                    ErrorKind::RangeError,
                    format!("Invalid count value: {}", number_to_string(count)),
                ));
            }
            let count = if count.is_nan() { 0 } else { count as usize };
            if text.len().saturating_mul(count) > MAX_STRING_LEN {
                return Some(interp.throw(ErrorKind::RangeError, "Invalid string length"));
            }
            Ok(Value::str(&text.repeat(count)))
        }
        "padStart" | "padEnd" => {
            let target = to_integer(&arg(args, 0)).clamp(0.0, MAX_STRING_LEN as f64) as usize;
            let filler = match args.get(1) {
                None | Some(Value::Undefined) => " ".to_string(),
                Some(value) => value.to_js_string(),
            };
            let current = char_count();
            if target <= current || filler.is_empty() {
                return Some(Ok(Value::Str(text.clone())));
            }
            let padding: String = filler.chars().cycle().take(target - current).collect();
            Ok(Value::str(&if key == "padStart" {
                format!("{padding}{text}")
            } else {
                format!("{text}{padding}")
            }))
        }
        "split" => {
            let pieces = match args.first() {
                None | Some(Value::Undefined) => vec![Value::Str(text.clone())],
                Some(separator) => {
                    let separator = separator.to_js_string();
                    if separator.is_empty() {
                        chars_to_values(text)
                    } else {
                        text.split(separator.as_str()).map(Value::str).collect()
                    }
                }
            };
            Ok(interp.new_array(pieces))
        }
        "replace" | "replaceAll" => string_replace(interp, text, key == "replaceAll", args),
        "concat" => {
            let mut out = text.to_string();
            for value in args {
                out.push_str(&value.to_js_string());
            }
            Ok(Value::str(&out))
        }
        "toString" => Ok(Value::Str(text.clone())),
        _ => return None,
    };
    Some(result)
}

fn string_replace(interp: &mut Interpreter<'_>, text: &str, all: bool, args: &[Value]) -> Eval<Value> {
    let pattern = arg(args, 0).to_js_string();
    let replacement = arg(args, 1);

    let mut out = String::new();
    let mut rest = text;
    loop {
        let Some(found) = rest.find(pattern.as_str()) else { break };
        out.push_str(&rest[..found]);
        let piece = match &replacement {
            function @ Value::Function(_) => interp
                .call_value(function, &[Value::str(&pattern)], "replacer")?
                .to_js_string(),
            other => other.to_js_string(),
        };
        out.push_str(&piece);

        if pattern.is_empty() {
            // Empty pattern matches before every character
            let Some(c) = rest.chars().next() else {
                rest = "";
                break;
            };
            out.push(c);
            rest = &rest[c.len_utf8()..];
            if !all {
                break;
            }
            continue;
        }
        rest = &rest[found + pattern.len()..];
        if !all {
            break;
        }
    }
    out.push_str(rest);
    Ok(Value::str(&out))
}

// ----- Number.prototype -----

fn number_method(interp: &mut Interpreter<'_>, n: f64, key: &str, args: &[Value]) -> Option<Eval<Value>> {
    let result = match key {
        "toFixed" => {
            let digits = to_integer(&arg(args, 0));
            if !(0.0..=100.0).contains(&digits) {
                return Some(interp.throw(
                    ErrorKind::RangeError,
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            if !n.is_finite() || n.abs() >= 1e21 {
                return Some(Ok(Value::str(&number_to_string(n))));
            }
            Ok(Value::str(&to_fixed(n, digits as usize)))
        }
        "toString" => {
            let radix = match args.first() {
                None | Some(Value::Undefined) => 10.0,
                Some(value) => to_integer(value),
            };
            if !(2.0..=36.0).contains(&radix) {
                return Some(interp.throw(ErrorKind::RangeError, "toString() radix must be between 2 and 36"));
            }
            Ok(Value::str(&number_to_radix_string(n, radix as u32)))
        }
        _ => return None,
    };
    Some(result)
}

/// Fixed-point decimal. Exact halves round away from zero.
fn to_fixed(n: f64, digits: usize) -> String {
    let magnitude = n.abs();
    // A half at the last digit is representable only when magnitude * 2^(digits+1) is odd
    let scaled = magnitude * 2f64.powi(digits as i32 + 1);
    let tie = scaled.fract() == 0.0 && scaled % 2.0 == 1.0;
    let magnitude = if tie {
        magnitude + 0.5 * 10f64.powi(-(digits as i32))
    } else {
        magnitude
    };
    let sign = if n < 0.0 { "-" } else { "" };
    format!("{sign}{magnitude:.digits$}")
}

/// Integers in any radix; fractional values fall back to decimal.
fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 || n.abs() > 9_007_199_254_740_991.0 {
        return number_to_string(n);
    }
    let mut magnitude = n.abs() as u64;
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % u64::from(radix)) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('0'));
        magnitude /= u64::from(radix);
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("3.14abc"), 3.14);
        assert_eq!(parse_float_prefix("-.5"), -0.5);
        assert_eq!(parse_float_prefix("1e3x"), 1000.0);
        assert_eq!(parse_float_prefix("2e"), 2.0);
        assert_eq!(parse_float_prefix("-Infinity and beyond"), f64::NEG_INFINITY);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(parse_float_prefix(".").is_nan());
    }

    #[test]
    fn test_to_fixed_rounds_halves_away_from_zero() {
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(1.25, 1), "1.3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        // 1.005 is stored just below the half
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1.005, 1), "1.0");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(-0.0001, 2), "-0.00");
        assert_eq!(to_fixed(3.14159, 3), "3.142");
    }

    #[test]
    fn test_radix_strings() {
        assert_eq!(number_to_radix_string(255.0, 16), "ff");
        assert_eq!(number_to_radix_string(-5.0, 2), "-101");
        assert_eq!(number_to_radix_string(0.5, 2), "0.5");
    }

    #[test]
    fn test_json_numbers_drop_trailing_zero() {
        assert_eq!(json_number(3.0).to_string(), "3");
        assert_eq!(json_number(0.25).to_string(), "0.25");
        assert_eq!(json_number(f64::NAN), serde_json::Value::Null);
    }

    #[test]
    fn test_static_property_lookup() {
        assert!(matches!(static_property("Array", "isArray"), Some(Value::Function(_))));
        assert!(matches!(static_property("Number", "EPSILON"), Some(Value::Number(_))));
        assert!(static_property("Array", "nope").is_none());
    }
}
