use crate::engine::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// Creates a new, empty root environment.
    pub fn new() -> Rc<RefCell<Self>> {
        debug!("Creating new empty root environment");
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: None,
        }))
    }

    /// Creates a new environment that is enclosed by an outer environment.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        debug!("Creating new enclosed environment");
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: Some(outer_env),
        }))
    }

    /// Binds a name in this environment, shadowing any outer binding.
    pub fn define(&mut self, name: String, value: Value) {
        trace!(name = %name, value = ?value, "Defining variable in current environment");
        self.bindings.insert(name, value);
    }

    /// Attempts to retrieve a variable's value from the environment.
    /// If not found in the current environment, it searches in outer environments.
    pub fn get(&self, name: &str) -> Option<Value> {
        trace!(name = %name, "Attempting to get variable from environment");
        if let Some(value) = self.bindings.get(name) {
            debug!(name = %name, value = ?value, "Found variable in current environment");
            Some(value.clone())
        } else {
            match &self.outer {
                Some(outer_env) => {
                    trace!(name = %name, "Variable not in current environment, checking outer environment");
                    outer_env.borrow().get(name)
                }
                None => {
                    debug!(name = %name, "Variable not found in any environment");
                    None
                }
            }
        }
    }

    /// Overwrites an existing binding in the nearest environment that holds
    /// `name`. Never creates a binding; returns `false` when the name is
    /// unbound everywhere.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(name) {
            trace!(name = %name, value = ?value, "Reassigning variable in current environment");
            *slot = value;
            return true;
        }
        match &self.outer {
            Some(outer_env) => outer_env.borrow_mut().assign(name, value),
            None => {
                debug!(name = %name, "Cannot reassign unbound variable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    #[test]
    fn define_and_get_in_root_env() {
        init_test_logging();
        let env = Environment::new();
        env.borrow_mut().define("x".to_string(), Value::Integer(10));
        assert_eq!(env.borrow().get("x"), Some(Value::Integer(10)));
    }

    #[test]
    fn get_from_outer_env() {
        init_test_logging();
        let outer_env = Environment::new();
        outer_env
            .borrow_mut()
            .define("x".to_string(), Value::Integer(10));

        let inner_env = Environment::new_enclosed(outer_env.clone());
        assert_eq!(inner_env.borrow().get("x"), Some(Value::Integer(10)));
    }

    #[test]
    fn define_in_inner_shadows_outer() {
        init_test_logging();
        let outer_env = Environment::new();
        outer_env
            .borrow_mut()
            .define("x".to_string(), Value::Integer(10));

        let inner_env = Environment::new_enclosed(outer_env.clone());
        inner_env
            .borrow_mut()
            .define("x".to_string(), Value::Integer(20));

        assert_eq!(inner_env.borrow().get("x"), Some(Value::Integer(20)));
        assert_eq!(outer_env.borrow().get("x"), Some(Value::Integer(10)));
    }

    #[test]
    fn get_undefined_variable() {
        init_test_logging();
        let env = Environment::new();
        assert_eq!(env.borrow().get("non_existent"), None);
    }

    #[test]
    fn assign_mutates_the_owning_outer_env() {
        init_test_logging();
        let outer_env = Environment::new();
        outer_env
            .borrow_mut()
            .define("count".to_string(), Value::Integer(0));
        let inner_env = Environment::new_enclosed(outer_env.clone());

        assert!(inner_env
            .borrow_mut()
            .assign("count", Value::Integer(1)));
        assert_eq!(outer_env.borrow().get("count"), Some(Value::Integer(1)));
        // No shadow was created in the inner scope.
        assert_eq!(inner_env.borrow().bindings.get("count"), None);
    }

    #[test]
    fn assign_prefers_the_nearest_binding() {
        init_test_logging();
        let outer_env = Environment::new();
        outer_env
            .borrow_mut()
            .define("x".to_string(), Value::Integer(1));
        let inner_env = Environment::new_enclosed(outer_env.clone());
        inner_env
            .borrow_mut()
            .define("x".to_string(), Value::Integer(2));

        assert!(inner_env.borrow_mut().assign("x", Value::Integer(3)));
        assert_eq!(inner_env.borrow().get("x"), Some(Value::Integer(3)));
        assert_eq!(outer_env.borrow().get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn assign_unbound_fails_without_creating() {
        init_test_logging();
        let env = Environment::new();
        assert!(!env.borrow_mut().assign("ghost", Value::Nil));
        assert_eq!(env.borrow().get("ghost"), None);
    }
}
