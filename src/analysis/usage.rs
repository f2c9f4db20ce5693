use std::collections::BTreeSet;

/// What is known about a single exported symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageFact {
    /// Referenced by at least one live importer
    Used,
    Unused,
    /// The module is consumed in a way that hides which symbols are used
    Wildcard,
}

/// Usage of a module's exports by its live importers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Usage {
    /// Every export must be treated as used and the module left untouched
    Wildcard,
    Symbols {
        used: BTreeSet<String>,
        /// Names that reached the module only through an `export *`, which
        /// may belong to a sibling module re-exported next to it
        forwarded: BTreeSet<String>,
        /// Imported only for its side effects (`import './x'`)
        side_effect: bool,
    },
}

impl Usage {
    /// No importer uses anything
    pub fn none() -> Self {
        Usage::Symbols {
            used: BTreeSet::new(),
            forwarded: BTreeSet::new(),
            side_effect: false,
        }
    }

    pub fn fact(&self, name: &str) -> UsageFact {
        match self {
            Usage::Wildcard => UsageFact::Wildcard,
            Usage::Symbols {
                used, forwarded, ..
            } if used.contains(name) || forwarded.contains(name) => UsageFact::Used,
            Usage::Symbols { .. } => UsageFact::Unused,
        }
    }

    /// True if this fact should keep a symbol alive
    pub fn keeps(&self, name: &str) -> bool {
        self.fact(name) != UsageFact::Unused
    }

    /// True if nothing about the module is used, not even its side effects
    pub fn is_unused(&self) -> bool {
        match self {
            Usage::Wildcard => false,
            Usage::Symbols {
                used,
                forwarded,
                side_effect,
            } => used.is_empty() && forwarded.is_empty() && !side_effect,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Usage::Wildcard)
    }

    pub fn mark_used(&mut self, name: impl Into<String>) {
        if let Usage::Symbols { used, .. } = self {
            used.insert(name.into());
        }
    }

    pub fn mark_forwarded(&mut self, name: impl Into<String>) {
        if let Usage::Symbols { forwarded, .. } = self {
            forwarded.insert(name.into());
        }
    }

    pub fn mark_side_effect(&mut self) {
        if let Usage::Symbols { side_effect, .. } = self {
            *side_effect = true;
        }
    }

    pub fn mark_wildcard(&mut self) {
        *self = Usage::Wildcard;
    }

    /// Drop forwarded names not matching `keep`. Names imported directly are
    /// never dropped, and a wildcard stays a wildcard.
    pub fn narrow_forwarded<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        if let Usage::Symbols { forwarded, .. } = self {
            forwarded.retain(|name| keep(name));
        }
    }

    /// Used symbol names, direct and forwarded, in sorted order; empty for a wildcard
    pub fn used(&self) -> impl Iterator<Item = &str> {
        let names = match self {
            Usage::Wildcard => None,
            Usage::Symbols {
                used, forwarded, ..
            } => Some(used.union(forwarded).map(String::as_str)),
        };
        names.into_iter().flatten()
    }
}

impl Default for Usage {
    fn default() -> Self {
        Self::none()
    }
}
