use super::{Executable, Linker, Program, ProgramKind};
use crate::error;
use crate::lang::Error;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// ## Program registry
///
/// Stored programs by qualified name. Functions, verbs and tests live
/// under the `FUNC$`, `VERB$` and `TEST$` prefixes; ordinary programs
/// are unprefixed.

#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: RwLock<BTreeMap<String, Arc<Mutex<Program>>>>,
}

impl ProgramRegistry {
    pub fn new() -> ProgramRegistry {
        ProgramRegistry::default()
    }

    pub fn find(&self, qualified_name: &str) -> Option<Arc<Mutex<Program>>> {
        self.programs.read().get(qualified_name).cloned()
    }

    pub fn find_kind(&self, name: &str, kind: ProgramKind) -> Option<Arc<Mutex<Program>>> {
        self.find(&format!("{}{}", kind.prefix(), name))
    }

    /// Add or replace a program. A running program cannot be replaced.
    pub fn register(&self, program: Program) -> Result<Arc<Mutex<Program>>> {
        let name = program.qualified_name();
        let mut programs = self.programs.write();
        if let Some(existing) = programs.get(&name) {
            existing.lock().check_inactive()?;
        }
        let program = Arc::new(Mutex::new(program));
        programs.insert(name, Arc::clone(&program));
        Ok(program)
    }

    pub fn remove(&self, qualified_name: &str) -> Result<()> {
        let mut programs = self.programs.write();
        match programs.get(qualified_name) {
            Some(p) => p.lock().check_inactive()?,
            None => return Err(error!(UnknownProgram; qualified_name)),
        }
        programs.remove(qualified_name);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.programs.read().keys().cloned().collect()
    }

    pub fn names_of(&self, kind: ProgramKind) -> Vec<String> {
        self.programs
            .read()
            .values()
            .filter_map(|p| {
                let p = p.lock();
                if p.kind() == kind {
                    Some(p.name().to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    /// The linked form of a program, linking it on first use.
    pub fn executable(&self, qualified_name: &str, linker: &Linker) -> Result<Arc<Executable>> {
        let program = match self.find(qualified_name) {
            Some(p) => p,
            None => return Err(error!(UnknownProgram; qualified_name)),
        };
        let mut program = program.lock();
        match program.executable() {
            Some(exe) => Ok(exe),
            None => linker.link(&mut program, false),
        }
    }
}
