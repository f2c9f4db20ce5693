//! In-memory module store
//!
//! Holds the current text of every module keyed by its project-relative path.
//! The backing map is shared behind an `Arc` so that taking a snapshot is a
//! pointer copy; the first write after a snapshot clones the map, which keeps
//! every handed-out snapshot frozen at the moment it was taken.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

/// A single module: its source text and a version bumped on every write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    text: Arc<str>,
    version: u64,
}

impl Module {
    fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            version: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Read-only view over a set of modules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modules {
    modules: HashMap<String, Module>,
}

impl Modules {
    /// Get the text of a module
    pub fn get(&self, path: &str) -> Option<&str> {
        self.modules.get(path).map(Module::text)
    }

    /// Get the full module record
    pub fn module(&self, path: &str) -> Option<&Module> {
        self.modules.get(path)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    /// Current version of a module, `None` if it does not exist
    pub fn version(&self, path: &str) -> Option<u64> {
        self.modules.get(path).map(Module::version)
    }

    /// All module paths, sorted
    pub fn list_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.modules.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Iterate over `(path, text)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(path, m)| (path.as_str(), m.text()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Compare text only, ignoring versions
    pub fn same_contents(&self, other: &Modules) -> bool {
        self.modules.len() == other.modules.len()
            && self
                .modules
                .iter()
                .all(|(path, m)| other.get(path) == Some(m.text()))
    }
}

/// An immutable snapshot of the store, safe to hand to worker threads
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    inner: Arc<Modules>,
}

impl Deref for StoreSnapshot {
    type Target = Modules;

    fn deref(&self) -> &Modules {
        &self.inner
    }
}

/// Mutable module store
#[derive(Debug, Clone, Default)]
pub struct ModuleStore {
    inner: Arc<Modules>,
}

impl ModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the text of a module, creating it if needed
    pub fn set(&mut self, path: &str, text: &str) {
        let modules = &mut Arc::make_mut(&mut self.inner).modules;
        match modules.get_mut(path) {
            Some(module) => {
                module.text = Arc::from(text);
                module.version += 1;
            }
            None => {
                modules.insert(path.to_string(), Module::new(text));
            }
        }
    }

    /// Remove a module. Returns `false` if it was not present
    pub fn delete(&mut self, path: &str) -> bool {
        if !self.inner.exists(path) {
            return false;
        }
        Arc::make_mut(&mut self.inner).modules.remove(path).is_some()
    }

    /// Take an immutable snapshot of the current state
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Deref for ModuleStore {
    type Target = Modules;

    fn deref(&self) -> &Modules {
        &self.inner
    }
}

impl<P: Into<String>, T: AsRef<str>> FromIterator<(P, T)> for ModuleStore {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let modules = iter
            .into_iter()
            .map(|(path, text)| (path.into(), Module::new(text.as_ref())))
            .collect();
        Self {
            inner: Arc::new(Modules { modules }),
        }
    }
}
