//! Application modules that can be included in a generated project

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Optional top-level application units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Module {
    Frontend,
    Backend,
    Mobile,
}

impl Module {
    /// Every module, in the order default rules are generated
    pub const ALL: [Module; 3] = [Module::Frontend, Module::Backend, Module::Mobile];

    /// Identifier used in manifests, folder names and CLI flags
    pub fn id(&self) -> &'static str {
        match self {
            Module::Frontend => "frontend",
            Module::Backend => "backend",
            Module::Mobile => "mobile",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Module::Frontend => "Frontend (Next.js)",
            Module::Backend => "Backend (Laravel)",
            Module::Mobile => "Mobile (Expo)",
        }
    }

    /// Parse a module identifier, returning None for anything outside the enumeration
    pub fn parse(s: &str) -> Option<Module> {
        match s.trim() {
            "frontend" => Some(Module::Frontend),
            "backend" => Some(Module::Backend),
            "mobile" => Some(Module::Mobile),
            _ => None,
        }
    }

    /// Comma-separated list of valid identifiers, for error messages
    pub fn allowed_ids() -> String {
        Module::ALL
            .iter()
            .map(|m| m.id())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Error returned when a module list contains an unknown identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid module \"{0}\". Allowed values: {allowed}.", allowed = Module::allowed_ids())]
pub struct UnknownModule(pub String);

/// The set of modules selected for one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSet {
    modules: BTreeSet<Module>,
}

impl ModuleSet {
    pub fn new(modules: impl IntoIterator<Item = Module>) -> Self {
        Self {
            modules: modules.into_iter().collect(),
        }
    }

    pub fn contains(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Module> + '_ {
        self.modules.iter().copied()
    }
}

impl FromIterator<Module> for ModuleSet {
    fn from_iter<I: IntoIterator<Item = Module>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl FromStr for ModuleSet {
    type Err = UnknownModule;

    /// Parse a comma-separated list such as `frontend,backend`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Module::parse(item).ok_or_else(|| UnknownModule(item.to_string())))
            .collect()
    }
}

impl fmt::Display for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.modules.iter().map(|m| m.id()).collect();
        write!(f, "{}", ids.join(", "))
    }
}
