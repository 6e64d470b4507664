//! Runtime values and the JavaScript conversion rules the interpreter needs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::ast::FunctionDef;
use super::error::ErrorKind;
use super::interpreter::{Control, Env, Interpreter};

/// Array levels `String(value)` descends into
pub const MAX_STRING_NESTING: usize = 128;

pub type NativeFn = fn(&mut Interpreter<'_>, &[Value]) -> Result<Value, Control>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<Object>>),
    Function(Rc<Function>),
}

pub enum Function {
    Script { def: Rc<FunctionDef>, env: Env },
    Native { name: &'static str, func: NativeFn },
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Script { def, .. } => def.name.as_deref().unwrap_or(""),
            Function::Native { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Plain,
    Error(ErrorKind),
}

/// Insertion-ordered property bag.
pub struct Object {
    pub class: ObjectClass,
    props: Vec<(Rc<str>, Value)>,
}

impl Object {
    pub fn new(class: ObjectClass) -> Self {
        Object {
            class,
            props: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.iter().find(|(k, _)| &**k == key).map(|(_, v)| v)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        match self.props.iter_mut().find(|(k, _)| &**k == key) {
            Some((_, slot)) => *slot = value,
            None => self.props.push((Rc::from(key), value)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (&**k, v))
    }

    pub fn clear(&mut self) {
        self.props.clear();
    }
}

impl Value {
    pub fn str(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(object: Object) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn native(name: &'static str, func: NativeFn) -> Value {
        Value::Function(Rc::new(Function::Native { name, func }))
    }

    /// A fresh error object with `name` and `message` set
    pub fn error(kind: ErrorKind, message: &str) -> Value {
        let mut object = Object::new(ObjectClass::Error(kind));
        object.set("name", Value::str(kind.name()));
        object.set("message", Value::str(message));
        Value::object(object)
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// `String(value)`
    pub fn to_js_string(&self) -> String {
        let mut out = String::new();
        self.write_js_string(&mut out, &mut Vec::new());
        out
    }

    fn write_js_string(&self, out: &mut String, open_arrays: &mut Vec<*const RefCell<Vec<Value>>>) {
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&number_to_string(*n)),
            Value::Str(s) => out.push_str(s),
            Value::Array(items) => {
                // An array nested inside itself prints as empty, like Array.prototype.join.
                // So does anything past MAX_STRING_NESTING levels.
                let id = Rc::as_ptr(items);
                if open_arrays.len() >= MAX_STRING_NESTING || open_arrays.contains(&id) {
                    return;
                }
                let Ok(items) = items.try_borrow() else {
                    return;
                };
                open_arrays.push(id);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if !item.is_nullish() {
                        item.write_js_string(out, open_arrays);
                    }
                }
                open_arrays.pop();
            }
            Value::Object(object) => {
                let Ok(object) = object.try_borrow() else {
                    out.push_str("[object Object]");
                    return;
                };
                match object.class {
                    ObjectClass::Error(kind) => {
                        let name = object.get("name").map(Value::to_js_string).unwrap_or_else(|| kind.name().to_string());
                        let message = object.get("message").map(Value::to_js_string).unwrap_or_default();
                        out.push_str(&name);
                        if !message.is_empty() {
                            out.push_str(": ");
                            out.push_str(&message);
                        }
                    }
                    ObjectClass::Plain => out.push_str("[object Object]"),
                }
            }
            Value::Function(function) => {
                out.push_str("function ");
                out.push_str(function.name());
                out.push_str("() { [code] }");
            }
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::Str(_)) | (Value::Str(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::Str(_)) => {
                Value::str(&self.to_js_string()).loose_equals(other)
            }
            (Value::Number(_) | Value::Str(_), Value::Array(_) | Value::Object(_)) => {
                self.loose_equals(&Value::str(&other.to_js_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Same-value-zero, used by `includes`
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_js_string()),
        }
    }
}

/// `Number.prototype.toString()` for base 10.
///
/// ```rust
/// use playpen_core::script::value::number_to_string;
///
/// assert_eq!(number_to_string(1.0), "1");
/// assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
/// assert_eq!(number_to_string(1e21), "1e+21");
/// assert_eq!(number_to_string(-0.0), "0");
/// ```
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        // Rust's shortest round-trip formatting matches JS in this range
        return format!("{n}");
    }

    // Exponential form: "1e21" -> "1e+21", "1.5e-7" stays
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => formatted,
    }
}

/// `Number(string)`
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    // Rust also accepts "inf" and "nan"; JavaScript does not
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-3.5), "-3.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(123456789012.0), "123456789012");
        assert_eq!(number_to_string(2.5e25), "2.5e+25");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 12 "), 12.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_js_string_conversion() {
        let nested = Value::array(vec![Value::Number(1.0), Value::Null, Value::array(vec![Value::str("a")])]);
        assert_eq!(nested.to_js_string(), "1,,a");
        assert_eq!(Value::object(Object::new(ObjectClass::Plain)).to_js_string(), "[object Object]");
        assert_eq!(Value::error(ErrorKind::TypeError, "bad").to_js_string(), "TypeError: bad");
    }

    fn nested_array(levels: usize) -> Value {
        let mut value = Value::Number(7.0);
        for _ in 0..levels {
            value = Value::array(vec![value]);
        }
        value
    }

    #[test]
    fn test_deeply_nested_array_string_is_bounded() {
        assert_eq!(nested_array(MAX_STRING_NESTING).to_js_string(), "7");
        assert_eq!(nested_array(MAX_STRING_NESTING + 1).to_js_string(), "");
        assert_eq!(nested_array(1_000).to_js_string(), "");
    }

    #[test]
    fn test_self_containing_array_prints_empty_slot() {
        let items = Rc::new(RefCell::new(vec![Value::Number(1.0)]));
        let array = Value::Array(items.clone());
        items.borrow_mut().push(array.clone());
        items.borrow_mut().push(array.clone());
        assert_eq!(array.to_js_string(), "1,,");
        items.borrow_mut().clear();
    }

    #[test]
    fn test_equality() {
        assert!(Value::Number(1.0).loose_equals(&Value::str("1")));
        assert!(!Value::Number(1.0).strict_equals(&Value::str("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
        assert!(Value::Number(f64::NAN).same_value_zero(&Value::Number(f64::NAN)));

        let array = Value::array(vec![]);
        assert!(array.strict_equals(&array.clone()));
        assert!(!array.strict_equals(&Value::array(vec![])));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }
}
