//! Environment maps and the layered scope stack
//!
//! A step's effective environment is built from an immutable stack of
//! layers: the host process environment, then the workflow globals, then one
//! layer per enclosing unit, then the step itself. Later layers override
//! earlier keys with the same name. Pushing a layer returns a new scope and
//! leaves the parent untouched, so sibling units never see each other's
//! variables.

use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Insertion-ordered string map with override-on-insert semantics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap(Vec<(String, String)>);

impl EnvMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a value, replacing an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive lookup
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay another map on top of this one
    pub fn extend_from(&mut self, other: &EnvMap) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl Serialize for EnvMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = EnvMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Azure-style environment name for a variable: upper case, `.` replaced by `_`
pub fn env_var_name(variable: &str) -> String {
    variable.replace('.', "_").to_uppercase()
}

/// Immutable stack of environment layers
#[derive(Debug, Clone, Default)]
pub struct EnvScope {
    ambient: Option<Arc<EnvMap>>,
    layers: Vec<Arc<EnvMap>>,
}

impl EnvScope {
    /// An empty scope with no ambient environment
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope whose base layer is the host process environment
    pub fn from_process() -> Self {
        Self::with_ambient(std::env::vars().collect())
    }

    pub fn with_ambient(ambient: EnvMap) -> Self {
        Self {
            ambient: Some(Arc::new(ambient)),
            layers: Vec::new(),
        }
    }

    /// Return a new scope with `layer` on top
    pub fn push(&self, layer: &EnvMap) -> Self {
        let mut layers = self.layers.clone();
        layers.push(Arc::new(layer.clone()));
        Self {
            ambient: self.ambient.clone(),
            layers,
        }
    }

    /// Resolve a name through every layer, ambient environment included
    pub fn get(&self, name: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(name))
            .or_else(|| self.ambient.as_ref().and_then(|a| a.get(name)))
    }

    /// Resolve a pipeline variable.
    ///
    /// Only pushed layers are searched (never the host environment). The exact
    /// name wins, then its environment form (`Build.SourcesDirectory` ->
    /// `BUILD_SOURCESDIRECTORY`), then a case-insensitive match.
    pub fn lookup_variable(&self, name: &str) -> Option<&str> {
        let env_name = env_var_name(name);
        self.find_in_layers(|layer| layer.get(name))
            .or_else(|| self.find_in_layers(|layer| layer.get(&env_name)))
            .or_else(|| self.find_in_layers(|layer| layer.get_ignore_case(name)))
    }

    /// Resolve an Azure `$(Name)` macro.
    ///
    /// Pipeline layers win; the host environment is the last fallback, tried
    /// by exact name and then by environment form.
    pub fn lookup_macro(&self, name: &str) -> Option<&str> {
        self.lookup_variable(name).or_else(|| {
            let ambient = self.ambient.as_ref()?;
            ambient.get(name).or_else(|| ambient.get(&env_var_name(name)))
        })
    }

    fn find_in_layers<'a>(&'a self, find: impl Fn(&'a EnvMap) -> Option<&'a str>) -> Option<&'a str> {
        self.layers.iter().rev().find_map(|layer| find(layer.as_ref()))
    }

    /// Flatten every pushed layer (ambient excluded), later layers winning
    pub fn overlay(&self) -> EnvMap {
        let mut merged = EnvMap::new();
        for layer in &self.layers {
            merged.extend_from(layer);
        }
        merged
    }
}
