use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct Variable {
    value: String,
    exported: bool,
}

/// Shell-local variables. Exported entries become the environment of every
/// program the shell starts afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    vars: HashMap<String, Variable>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Environment::empty();

        // Import all OS environment variables when starting the process (default value)
        for (k, v) in std::env::vars() {
            env.vars.insert(
                k,
                Variable {
                    value: v,
                    exported: true,
                },
            );
        }

        env
    }

    pub fn empty() -> Self {
        Environment {
            vars: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars
            .entry(key.to_string())
            .and_modify(|var| var.value = value.to_string())
            .or_insert(Variable {
                value: value.to_string(),
                exported: false,
            });
    }

    pub fn export(&mut self, key: &str) {
        if let Some(var) = self.vars.get_mut(key) {
            var.exported = true;
        }
    }

    /// `NAME=value`: set and export in one step.
    pub fn assign(&mut self, key: &str, value: &str) {
        self.set(key, value);
        self.export(key);
    }

    pub fn is_exported(&self, key: &str) -> bool {
        self.vars.get(key).is_some_and(|v| v.exported)
    }

    pub fn exported_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<_> = self
            .vars
            .iter()
            .filter(|(_, v)| v.exported)
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        vars.sort();
        vars
    }
}
