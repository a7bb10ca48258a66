use super::Value;
use crate::error;
use crate::lang::Error;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// Which table in the chain an assignment writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
    Parent,
    Common,
    Constant,
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    readonly: bool,
    common: bool,
}

/// ## Chained variable memory
///
/// Lookup walks from a table to its parent until the global root.
/// Parents are fixed at construction so the chain can never form a
/// cycle. Entries sit behind a lock so tables can be shared with other
/// threads.

#[derive(Debug)]
pub struct SymbolTable {
    name: String,
    is_global: bool,
    parent: Option<Arc<SymbolTable>>,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl SymbolTable {
    /// The process-wide root table.
    pub fn global() -> Arc<SymbolTable> {
        Arc::new(SymbolTable {
            name: "GLOBAL".to_string(),
            is_global: true,
            parent: None,
            entries: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn new<S: Into<String>>(name: S, parent: &Arc<SymbolTable>) -> Arc<SymbolTable> {
        Arc::new(SymbolTable {
            name: name.into(),
            is_global: false,
            parent: Some(Arc::clone(parent)),
            entries: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn parent(&self) -> Option<&Arc<SymbolTable>> {
        self.parent.as_ref()
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut table = self;
        loop {
            if let Some(entry) = table.entries.read().get(name) {
                return Some(entry.value.clone());
            }
            match &table.parent {
                Some(parent) => table = parent,
                None => return None,
            }
        }
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn is_readonly(&self, name: &str) -> bool {
        self.entries.read().get(name).map_or(false, |e| e.readonly)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Names in this table only, in order.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn insert(&self, scope: Scope, name: &str, value: Value) -> Result<()> {
        match scope {
            Scope::Local => self.insert_local(name, value),
            Scope::Global => self.insert_global(name, value),
            Scope::Parent => self.insert_parent(name, value),
            Scope::Common => self.insert_common(name, value),
            Scope::Constant => self.insert_constant(name, value),
        }
    }

    pub fn insert_local(&self, name: &str, value: Value) -> Result<()> {
        self.write(name, value, false, false)
    }

    pub fn insert_global(&self, name: &str, value: Value) -> Result<()> {
        self.root().write(name, value, false, false)
    }

    /// Writes into the caller's table. The global table writes into itself.
    pub fn insert_parent(&self, name: &str, value: Value) -> Result<()> {
        match &self.parent {
            Some(parent) => parent.write(name, value, false, false),
            None => self.write(name, value, false, false),
        }
    }

    /// A local that survives `CHAIN`.
    pub fn insert_common(&self, name: &str, value: Value) -> Result<()> {
        self.write(name, value, false, true)
    }

    pub fn insert_constant(&self, name: &str, value: Value) -> Result<()> {
        self.write(name, value, true, false)
    }

    /// Runtime-maintained values such as `$STATUS`. These bypass the
    /// read-only check and are read-only to programs.
    pub fn insert_system(&self, name: &str, value: Value) {
        self.entries.write().insert(
            name.to_string(),
            Entry {
                value,
                readonly: true,
                common: false,
            },
        );
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.entries.write().remove(name).map(|e| e.value)
    }

    /// Entries flagged with `COMMON` anywhere in the chain, as lookup
    /// would see them. Carried across `CHAIN` and into new threads.
    pub fn common_entries(&self) -> Vec<(String, Value)> {
        let mut visible: BTreeMap<String, Option<Value>> = BTreeMap::new();
        let mut table = Some(self);
        while let Some(t) = table {
            for (k, e) in t.entries.read().iter() {
                visible
                    .entry(k.clone())
                    .or_insert_with(|| e.common.then(|| e.value.clone()));
            }
            table = t.parent.as_deref();
        }
        visible
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    fn root(&self) -> &SymbolTable {
        let mut table = self;
        while let Some(parent) = &table.parent {
            table = parent;
        }
        table
    }

    fn write(&self, name: &str, value: Value, readonly: bool, common: bool) -> Result<()> {
        if name.starts_with('$') {
            return Err(error!(ReadOnly; name));
        }
        let mut entries = self.entries.write();
        match entries.get_mut(name) {
            Some(entry) => {
                if entry.readonly {
                    return Err(error!(ReadOnly; name));
                }
                entry.value = value;
                entry.readonly = readonly;
                entry.common |= common;
            }
            None => {
                entries.insert(
                    name.to_string(),
                    Entry {
                        value,
                        readonly,
                        common,
                    },
                );
            }
        }
        Ok(())
    }
}
