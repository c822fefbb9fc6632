use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A runtime value in a render context.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Falsy: null, `false`, `0`, `NaN` and `""`. Everything else is truthy,
    /// empty arrays and maps included.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Maps and arrays have properties; scalars don't.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// Property access: a key on a map, a non-negative integer index on an
    /// array or string, or `length` on either. Anything else, null
    /// included, has no properties.
    ///
    /// String lengths and indices count UTF-16 code units, so `"é".length`
    /// is 1 and `"🌍".length` is 2.
    pub fn get(&self, key: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Map(map) => map.get(key).map(Cow::Borrowed),
            Value::Array(items) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
            Value::Array(items) => index(key).and_then(|i| items.get(i)).map(Cow::Borrowed),
            Value::String(s) if key == "length" => {
                Some(Cow::Owned(Value::from(s.encode_utf16().count())))
            }
            Value::String(s) => {
                let unit = s.encode_utf16().nth(index(key)?)?;
                Some(Cow::Owned(Value::String(String::from_utf16_lossy(&[unit]))))
            }
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Canonical array indices only: `1` is an index, `01` and `+1` are not.
fn index(key: &str) -> Option<usize> {
    let i = key.parse::<usize>().ok()?;
    (i.to_string() == key).then_some(i)
}

/// The canonical string form used when a value is interpolated.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // -0 prints as 0
        f.write_str("0")
    } else if (1e-6..1e21).contains(&n.abs()) {
        // f64's Display already drops the fraction of integral values.
        write!(f, "{n}")
    } else {
        // Exponent form outside that range, with an explicit `+` on
        // positive exponents: 1e+21, 1.5e-7.
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                write!(f, "{mantissa}e+{power}")
            }
            _ => f.write_str(&exp),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values() {
        for v in [
            Value::Null,
            Value::Bool(false),
            Value::Number(0.0),
            Value::Number(-0.0),
            Value::Number(f64::NAN),
            Value::String(String::new()),
        ] {
            assert!(!v.is_truthy(), "{v:?} should be falsy");
        }
    }

    #[test]
    fn empty_containers_are_truthy() {
        assert!(Value::Array(vec![]).is_truthy());
        assert!(Value::Map(HashMap::new()).is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::from(-1).is_truthy());
    }

    #[test]
    fn string_forms() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::from(json!([1, null, "a", [2, 3]])).to_string(),
            "1,,a,2,3"
        );
        assert_eq!(Value::from(json!({"a": 1})).to_string(), "[object Object]");
    }

    #[test]
    fn large_and_small_numbers_use_exponent_form() {
        assert_eq!(Value::from(1e21).to_string(), "1e+21");
        assert_eq!(Value::from(-2.5e30).to_string(), "-2.5e+30");
        assert_eq!(Value::from(1e-7).to_string(), "1e-7");
        assert_eq!(Value::from(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Value::from(0.000001).to_string(), "0.000001");
        assert_eq!(Value::from(1e20).to_string(), "100000000000000000000");
    }

    #[test]
    fn property_access() {
        let v = Value::from(json!({"items": ["a", "b"], "n": null}));
        let items = v.get("items").unwrap();
        assert_eq!(items.get("1").as_deref(), Some(&Value::from("b")));
        assert_eq!(items.get("2"), None);
        assert_eq!(items.get("-1"), None);
        assert_eq!(items.get("01"), None);
        assert_eq!(v.get("n").as_deref(), Some(&Value::Null));
        assert_eq!(Value::Null.get("anything"), None);
        assert_eq!(Value::from(3).get("length"), None);
    }

    #[test]
    fn length_of_arrays_and_strings() {
        let v = Value::from(json!({"items": ["a", "b"], "length": "own key"}));
        assert_eq!(v.get("items").unwrap().get("length").as_deref(), Some(&Value::from(2)));
        assert_eq!(v.get("length").as_deref(), Some(&Value::from("own key")));
        assert_eq!(Value::from("abc").get("length").as_deref(), Some(&Value::from(3)));
        assert_eq!(Value::from("🌍").get("length").as_deref(), Some(&Value::from(2)));
        assert_eq!(Value::from(Vec::<Value>::new()).get("length").as_deref(), Some(&Value::from(0)));
    }

    #[test]
    fn string_index() {
        let s = Value::from("abc");
        assert_eq!(s.get("0").as_deref(), Some(&Value::from("a")));
        assert_eq!(s.get("2").as_deref(), Some(&Value::from("c")));
        assert_eq!(s.get("3"), None);
        assert_eq!(s.get("x"), None);
    }
}
