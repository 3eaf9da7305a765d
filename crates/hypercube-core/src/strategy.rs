use fnv::FnvHashMap;
use thiserror::Error;

pub trait ShaderStrategy {
    /// Signature every emitted fragment must define.
    const ENTRY_POINT: &'static str;
    /// Human-readable family name used in log lines.
    const KIND: &'static str;

    fn name(&self) -> &str;
    fn code(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    #[error("strategy name must not be empty")]
    EmptyName,
    #[error("{kind} '{name}' does not define `{entry}`")]
    MissingEntryPoint {
        kind: &'static str,
        name: String,
        entry: &'static str,
    },
}

struct Entry<S> {
    strategy: S,
    code: String,
}

pub struct StrategySet<S: ShaderStrategy> {
    entries: FnvHashMap<String, Entry<S>>,
    order: Vec<String>,
    default_name: String,
}

impl<S: ShaderStrategy> StrategySet<S> {
    pub fn new(default_name: &str) -> Self {
        Self {
            entries: FnvHashMap::default(),
            order: Vec::new(),
            default_name: default_name.to_ascii_lowercase(),
        }
    }

    /// Register (or replace) a provider under its lowercased name.
    pub fn register(&mut self, strategy: S) -> Result<(), RegistrationError> {
        let key = strategy.name().trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let code = strategy.code();
        if !code.contains(S::ENTRY_POINT) {
            return Err(RegistrationError::MissingEntryPoint {
                kind: S::KIND,
                name: key,
                entry: S::ENTRY_POINT,
            });
        }
        if self.entries.insert(key.clone(), Entry { strategy, code }).is_none() {
            self.order.push(key);
        }
        Ok(())
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Resolve a name to its registered key, falling back to the default with a warning.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_ascii_lowercase();
        if let Some((k, _)) = self.entries.get_key_value(&key) {
            return Some(k.as_str());
        }
        log::warn!(
            "[{}] unknown '{}', falling back to '{}'",
            S::KIND,
            name,
            self.default_name
        );
        self.entries
            .get_key_value(&self.default_name)
            .map(|(k, _)| k.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        let key = self.resolve(name)?;
        self.entries.get(key).map(|e| &e.strategy)
    }

    /// Cached fragment source for `name`, or for the default when `name` is unknown.
    pub fn get_code(&self, name: &str) -> Option<&str> {
        let key = self.resolve(name)?;
        self.entries.get(key).map(|e| e.code.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.trim().to_ascii_lowercase())
    }

    pub fn list_names(&self) -> Vec<String> {
        self.order.clone()
    }
}
