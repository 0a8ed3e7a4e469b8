use std::collections::BTreeMap;

/// Source of environment variables.
///
/// Settings resolution reads the whole environment at once, so tests can
/// hand in a fixed map instead of mutating process-global state.
pub trait EnvironmentProvider {
    /// Every variable, keys lower-cased.
    fn snapshot(&self) -> BTreeMap<String, String>;

    fn get_var(&self, key: &str) -> Option<String> {
        self.snapshot().remove(&key.to_ascii_lowercase())
    }

    /// Value of `key`, or `or_else` when the variable is unset.
    fn get_or(&self, key: &str, or_else: &str) -> String {
        self.get_var(key).unwrap_or_else(|| or_else.to_string())
    }
}

/// Reads the real process environment.
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        collect_lowercased(std::env::vars())
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: BTreeMap<String, String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_vars(mut self, vars: &[(&str, &str)]) -> Self {
        for (key, value) in vars {
            self.vars.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl EnvironmentProvider for StaticEnvironment {
    fn snapshot(&self) -> BTreeMap<String, String> {
        collect_lowercased(self.vars.clone())
    }
}

/// Lower-case every key. An exact lower-case key wins over a differently
/// cased duplicate (`db_host` beats `DB_HOST`).
fn collect_lowercased<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut out = BTreeMap::new();
    for (key, value) in vars {
        let lowered = key.to_ascii_lowercase();
        if lowered == key {
            out.insert(lowered, value);
        } else {
            out.entry(lowered).or_insert(value);
        }
    }
    out
}
