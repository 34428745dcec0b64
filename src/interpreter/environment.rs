use crate::interpreter::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Binding {
    pub value: Value,
    pub is_constant: bool,
}

/// One scope frame. Frames chain outward through `enclosing`; dropping the last handle to a
/// frame releases every value bound in it.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Binding>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_enclosing(enclosing: Rc<Environment>) -> Self {
        Self {
            enclosing: Some(enclosing),
            values: RefCell::new(HashMap::new()),
        }
    }

    /// Binds `name` in this frame only. Shadowing an outer binding is fine, a second binding
    /// in the same frame is not.
    pub fn define(&self, name: &str, value: Value, is_constant: bool) -> Result<(), String> {
        let mut values = self.values.borrow_mut();
        if values.contains_key(name) {
            return Err(format!("Variable '{}' is already defined in this scope", name));
        }
        values.insert(name.to_string(), Binding { value, is_constant });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.values.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.enclosing.as_ref().and_then(|env| env.get(name))
    }

    /// Rebinds the nearest frame that already holds `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), String> {
        if let Some(binding) = self.values.borrow_mut().get_mut(name) {
            if binding.is_constant {
                return Err(format!("Cannot assign to constant '{}'", name));
            }
            binding.value = value;
            return Ok(());
        }
        match &self.enclosing {
            Some(env) => env.assign(name, value),
            None => Err(format!("Cannot assign to undefined variable '{}'", name)),
        }
    }

    pub fn depth(&self) -> usize {
        self.enclosing.as_ref().map_or(0, |env| env.depth() + 1)
    }
}
