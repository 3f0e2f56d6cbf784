//! JSON declaration table parsing and types for argtree.

use serde::Deserialize;
use thiserror::Error;

/// A caller-supplied value check. Returns a human-readable message on
/// rejection; messages are accumulated by the resolver, never thrown.
pub type ValidatorFn = fn(&str) -> Result<(), String>;

/// Errors that can occur during declaration parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON declarations: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("duplicate argument name '{0}' under command path '{1}'")]
    DuplicateName(String, String),

    #[error("invalid short option '{0}': must be a single ASCII letter")]
    InvalidShortOption(String),

    #[error("positional argument '{0}' cannot be standalone")]
    PositionalStandalone(String),

    #[error("argument '{0}' references unknown argument '{1}' in required_if")]
    UnknownRequiredIf(String, String),

    #[error("duplicate command '{0}' under '{1}'")]
    DuplicateCommand(String, String),

    #[error("argument '{0}' is scoped to undeclared command path '{1}'")]
    UnknownCommandScope(String, String),
}

/// The kind of a flag declaration.
///
/// Closed set; every consumption decision in the resolver matches on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// A boolean-only flag. Consumes a following token only when that
    /// token is an explicit boolean literal.
    Standalone,
    /// Takes exactly one value; repeated occurrences overwrite.
    Single,
    /// May occur multiple times; each occurrence appends a value.
    Chained,
    /// Takes one value interpreted as a file path.
    File,
}

/// Declaration for a single argument. Immutable once registered.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgSpec {
    /// Canonical long name (used for lookups and bindings)
    pub name: String,
    /// Short option character (e.g., 'v' for -v)
    pub short: Option<char>,
    /// The kind of argument
    pub kind: ArgKind,
    /// Fixed positional slot index, if this argument can also be
    /// supplied positionally
    pub position: Option<usize>,
    /// Whether an unfilled slot is an error
    #[serde(default)]
    pub required: bool,
    /// Default value applied when the argument is not supplied
    pub default: Option<String>,
    /// Name of another argument; this one becomes required when that
    /// argument was bound in the same run
    pub required_if: Option<String>,
    /// Owning command path; empty string means global
    #[serde(default)]
    pub command_path: String,
    /// Alternate surface names resolvable to this declaration
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Help text for this argument (consumed by external renderers)
    pub help: Option<String>,
    /// Ordered value checks, attached programmatically after JSON load
    #[serde(skip)]
    pub validators: Vec<ValidatorFn>,
}

impl ArgSpec {
    /// Whether flag-syntax mention of this argument consumes the
    /// following token as its value. Positional-bound arguments are
    /// excluded: their value arrives through the slot machinery.
    pub fn needs_value(&self) -> bool {
        self.kind != ArgKind::Standalone && self.position.is_none()
    }

    /// Append a value check. Checks run in registration order.
    pub fn with_validator(mut self, validator: ValidatorFn) -> Self {
        self.validators.push(validator);
        self
    }
}

/// A named node in the command tree.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// The command name (one token, no spaces)
    pub name: String,
    /// Locale bundle key for this command's translated names
    pub translation_key: Option<String>,
    /// Alternate surface names resolvable to this command
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Help text for this command (consumed by external renderers)
    pub help: Option<String>,
    /// Child commands
    #[serde(default)]
    pub children: Vec<CommandSpec>,
}

impl CommandSpec {
    fn collect_paths(&self, parent: &str, out: &mut Vec<String>) {
        let path = if parent.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", parent, self.name)
        };
        out.push(path.clone());
        for child in &self.children {
            child.collect_paths(&path, out);
        }
    }

    fn validate(&self, parent: &str) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        let path = if parent.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", parent, self.name)
        };

        let mut names = HashSet::new();
        for child in &self.children {
            if !names.insert(&child.name) {
                return Err(ConfigError::DuplicateCommand(
                    child.name.clone(),
                    path.clone(),
                ));
            }
            child.validate(&path)?;
        }
        Ok(())
    }
}

/// Top-level declaration table for a target program.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Name of the target program
    pub name: Option<String>,
    /// Description of the target program
    pub description: Option<String>,
    /// Version of the target program
    pub version: Option<String>,
    /// When set, a flag-syntax token with no matching declaration is
    /// reclassified as a positional instead of raising an error
    #[serde(default)]
    pub allow_unknown_flags: bool,
    /// Flag declarations, global and command-scoped
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    /// Root commands of the command tree
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl Config {
    /// Parse a JSON string into a Config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the declaration table.
    ///
    /// Same-scope name collisions are rejected here rather than silently
    /// overwriting in the flag cache; cross-scope shadowing stays legal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        let paths: HashSet<String> = self.command_paths().into_iter().collect();

        let mut root_names = HashSet::new();
        for command in &self.commands {
            if !root_names.insert(&command.name) {
                return Err(ConfigError::DuplicateCommand(
                    command.name.clone(),
                    String::new(),
                ));
            }
            command.validate("")?;
        }

        let mut names = HashSet::new();
        for arg in &self.args {
            if !names.insert((&arg.name, &arg.command_path)) {
                return Err(ConfigError::DuplicateName(
                    arg.name.clone(),
                    arg.command_path.clone(),
                ));
            }
            self.validate_arg(arg, &paths)?;
        }

        Ok(())
    }

    fn validate_arg(
        &self,
        arg: &ArgSpec,
        paths: &std::collections::HashSet<String>,
    ) -> Result<(), ConfigError> {
        if let Some(short) = arg.short {
            if !short.is_ascii_alphabetic() {
                return Err(ConfigError::InvalidShortOption(short.to_string()));
            }
        }

        if arg.position.is_some() && arg.kind == ArgKind::Standalone {
            return Err(ConfigError::PositionalStandalone(arg.name.clone()));
        }

        if let Some(ref other) = arg.required_if {
            if !self.args.iter().any(|a| &a.name == other) {
                return Err(ConfigError::UnknownRequiredIf(
                    arg.name.clone(),
                    other.clone(),
                ));
            }
        }

        if !arg.command_path.is_empty() && !paths.contains(&arg.command_path) {
            return Err(ConfigError::UnknownCommandScope(
                arg.name.clone(),
                arg.command_path.clone(),
            ));
        }

        Ok(())
    }

    /// All full command paths in the tree, parents before children.
    pub fn command_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for command in &self.commands {
            command.collect_paths("", &mut paths);
        }
        paths
    }
}
