//! Surface-name resolution for translated and aliased declarations.

use crate::config::{CommandSpec, Config};
use std::collections::HashMap;

/// Maps surface names back to canonical declaration names.
///
/// The resolver consults this before every cache and command lookup. A
/// `None` return means "no translation known"; the surface name is then
/// used as-is.
pub trait NameResolver {
    /// Map a surface flag name to its canonical declaration name.
    fn canonical_flag(&self, surface: &str, command_path: &str) -> Option<String>;

    /// Map a surface command token to its canonical command name.
    fn canonical_command(&self, surface: &str, current_path: &str) -> Option<String>;
}

/// The default capability: every name is already canonical.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl NameResolver for IdentityResolver {
    fn canonical_flag(&self, _surface: &str, _command_path: &str) -> Option<String> {
        None
    }

    fn canonical_command(&self, _surface: &str, _current_path: &str) -> Option<String> {
        None
    }
}

/// Resolver backed by the alias lists declared in a [`Config`].
///
/// Flag aliases are keyed by `(alias, owning command path)` so the same
/// surface name can map to different declarations under different
/// commands. Command aliases are keyed by surface token alone.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    flags: HashMap<(String, String), String>,
    commands: HashMap<String, String>,
}

impl AliasResolver {
    /// Index every alias declared in the table.
    pub fn from_config(config: &Config) -> Self {
        let mut resolver = AliasResolver::default();

        for arg in &config.args {
            for alias in &arg.aliases {
                resolver.flags.insert(
                    (alias.clone(), arg.command_path.clone()),
                    arg.name.clone(),
                );
            }
        }

        for command in &config.commands {
            resolver.index_command(command);
        }

        resolver
    }

    fn index_command(&mut self, command: &CommandSpec) {
        for alias in &command.aliases {
            self.commands.insert(alias.clone(), command.name.clone());
        }
        for child in &command.children {
            self.index_command(child);
        }
    }
}

impl NameResolver for AliasResolver {
    fn canonical_flag(&self, surface: &str, command_path: &str) -> Option<String> {
        self.flags
            .get(&(surface.to_string(), command_path.to_string()))
            .or_else(|| self.flags.get(&(surface.to_string(), String::new())))
            .cloned()
    }

    fn canonical_command(&self, surface: &str, _current_path: &str) -> Option<String> {
        self.commands.get(surface).cloned()
    }
}
