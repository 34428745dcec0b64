use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Runtime value. Shared variants are `Rc` handles: cloning a value is taking a new
/// reference, dropping it releases one. Cycles built through lists or dictionaries are never
/// collected.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Num(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    NativeFn(Rc<NativeFunction>),
}

#[derive(Debug)]
pub struct NativeFunction {
    pub name: Rc<str>,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

/// Insertion-ordered dictionary. Only string keys ever compare equal, so a non-string key
/// never finds an existing entry.
#[derive(Debug, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
}

impl Dict {
    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.iter().position(|(k, _)| key_matches(k, key))
    }

    pub fn set(&mut self, key: Value, value: Value) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.position(key).map(|i| self.entries[i].1.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_matches(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

impl Value {
    pub fn new_list() -> Self {
        Value::List(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn new_dict() -> Self {
        Value::Dict(Rc::new(RefCell::new(Dict::default())))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::NativeFn(_) => "function",
        }
    }

    /// Numbers are truthy when non-zero, strings when non-empty, everything else always.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Live owners of a shared value, `None` for numbers and null which are copied.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::Null | Value::Num(_) => None,
            Value::Str(s) => Some(Rc::strong_count(s)),
            Value::List(l) => Some(Rc::strong_count(l)),
            Value::Dict(d) => Some(Rc::strong_count(d)),
            Value::NativeFn(f) => Some(Rc::strong_count(f)),
        }
    }

    pub fn list_append(&self, element: Value) -> Result<(), String> {
        match self {
            Value::List(list) => {
                list.borrow_mut().push(element);
                Ok(())
            }
            other => Err(format!("expected list, got {}", other.type_name())),
        }
    }

    pub fn list_len(&self) -> Result<usize, String> {
        match self {
            Value::List(list) => Ok(list.borrow().len()),
            other => Err(format!("expected list, got {}", other.type_name())),
        }
    }

    pub fn list_get(&self, index: &Value) -> Result<Value, String> {
        let list = self.as_list()?;
        let list = list.borrow();
        index_in(index, list.len())
            .map(|i| list[i].clone())
            .ok_or_else(|| format!("index {} out of range for length {}", index, list.len()))
    }

    pub fn list_set(&self, index: &Value, element: Value) -> Result<(), String> {
        let list = self.as_list()?;
        let mut list = list.borrow_mut();
        let len = list.len();
        match index_in(index, len) {
            Some(i) => {
                list[i] = element;
                Ok(())
            }
            None => Err(format!("index {} out of range for length {}", index, len)),
        }
    }

    pub fn dict_set(&self, key: Value, value: Value) -> Result<(), String> {
        self.as_dict()?.borrow_mut().set(key, value);
        Ok(())
    }

    pub fn dict_get(&self, key: &Value) -> Result<Value, String> {
        self.as_dict()?
            .borrow()
            .get(key)
            .ok_or_else(|| format!("no entry for key {}", key))
    }

    pub fn dict_len(&self) -> Result<usize, String> {
        Ok(self.as_dict()?.borrow().len())
    }

    fn as_list(&self) -> Result<&Rc<RefCell<Vec<Value>>>, String> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(format!("expected list, got {}", other.type_name())),
        }
    }

    fn as_dict(&self) -> Result<&Rc<RefCell<Dict>>, String> {
        match self {
            Value::Dict(dict) => Ok(dict),
            other => Err(format!("expected dictionary, got {}", other.type_name())),
        }
    }
}

// Indices truncate toward zero; negatives and NaN never hit.
fn index_in(index: &Value, len: usize) -> Option<usize> {
    match index {
        Value::Num(n) if *n >= 0.0 && (n.trunc() as usize) < len => Some(n.trunc() as usize),
        _ => None,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(s1), Self::Str(s2)) => s1 == s2,
            (Self::Num(n1), Self::Num(n2)) => n1 == n2,
            (Self::Null, Self::Null) => true,
            (Self::List(l1), Self::List(l2)) => Rc::ptr_eq(l1, l2),
            (Self::Dict(d1), Self::Dict(d2)) => Rc::ptr_eq(d1, d2),
            (Self::NativeFn(f1), Self::NativeFn(f2)) => Rc::ptr_eq(f1, f2),
            (_, _) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Num(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            // containers are opaque, which also keeps self-referencing lists printable
            Value::List(_) | Value::Dict(_) | Value::NativeFn(_) => write!(f, "[对象]"),
        }
    }
}

/// Whole numbers print with no decimal point, anything else in the compact `%g` style:
/// six significant digits, trailing zeros dropped, exponent form outside `1e-4..1e6`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n.fract() == 0.0 {
        return format!("{:.0}", n);
    }

    const PRECISION: i32 = 6;
    // exponent after rounding to the target precision
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let mantissa = trim_fraction(&mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_like_printf() {
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(123456.7), "123457");
        assert_eq!(format_number(1234567.5), "1.23457e+06");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001234), "1.234e-05");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Num(0.0).is_truthy());
        assert!(Value::Num(-0.5).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Null.is_truthy());
        assert!(Value::new_list().is_truthy());
    }

    #[test]
    fn list_holds_its_own_reference() {
        let list = Value::new_list();
        let element = Value::from("元素");
        assert_eq!(element.ref_count(), Some(1));

        list.list_append(element.clone()).unwrap();
        assert_eq!(element.ref_count(), Some(2));

        let fetched = list.list_get(&Value::Num(0.0)).unwrap();
        assert_eq!(fetched.ref_count(), Some(3));
        drop(fetched);

        drop(list);
        assert_eq!(element.ref_count(), Some(1));
    }

    #[test]
    fn list_index_out_of_range() {
        let list = Value::new_list();
        list.list_append(Value::Num(1.0)).unwrap();
        assert!(list.list_get(&Value::Num(1.0)).is_err());
        assert!(list.list_get(&Value::Num(-1.0)).is_err());
        assert!(list.list_set(&Value::Num(3.0), Value::Null).is_err());
        assert_eq!(list.list_get(&Value::Num(0.9)).unwrap(), Value::Num(1.0));
    }

    #[test]
    fn overwriting_a_list_slot_releases_the_old_element() {
        let list = Value::new_list();
        let old = Value::from("旧");
        list.list_append(old.clone()).unwrap();
        list.list_set(&Value::Num(0.0), Value::from("新")).unwrap();
        assert_eq!(old.ref_count(), Some(1));
    }

    #[test]
    fn dict_keys_match_only_strings() {
        let dict = Value::new_dict();
        dict.dict_set(Value::from("键"), Value::Num(1.0)).unwrap();
        dict.dict_set(Value::from("键"), Value::Num(2.0)).unwrap();
        assert_eq!(dict.dict_len().unwrap(), 1);
        assert_eq!(dict.dict_get(&Value::from("键")).unwrap(), Value::Num(2.0));

        dict.dict_set(Value::Num(1.0), Value::Num(3.0)).unwrap();
        dict.dict_set(Value::Num(1.0), Value::Num(4.0)).unwrap();
        assert_eq!(dict.dict_len().unwrap(), 3);
        assert!(dict.dict_get(&Value::Num(1.0)).is_err());
    }

    #[test]
    fn self_referencing_list_is_never_freed() {
        let list = Value::new_list();
        list.list_append(list.clone()).unwrap();
        let Value::List(inner) = &list else {
            unreachable!()
        };
        let weak = Rc::downgrade(inner);
        assert_eq!(list.to_string(), "[对象]");
        drop(list);
        // the cycle keeps itself alive
        assert!(weak.upgrade().is_some());
    }
}
