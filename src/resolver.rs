//! Single-pass token classification and binding.
//!
//! One left-to-right scan over the token array, then a short validation
//! pass that fills defaults and reports missing required slots. Scan
//! failures are accumulated, never thrown; the scan only stops when the
//! token array is exhausted.

use crate::cache::{positional_registry, FlagCache, PositionalDecl};
use crate::config::{ArgKind, ArgSpec, Config};
use crate::names::{IdentityResolver, NameResolver};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Problems found while resolving one token array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingValue(String),

    #[error("invalid value for '{name}': {message}")]
    Validation { name: String, message: String },

    #[error("missing required positional '{key}' at index {index}")]
    MissingPositional { key: String, index: usize },
}

/// One entry in the ordered positional result.
///
/// `bound` is `None` for a free positional: a token that matched no
/// declared slot, still available to the caller without a contract.
#[derive(Debug, Clone)]
pub struct PositionalArg<'a> {
    /// Index of the originating token in the scanned array; synthesized
    /// defaults sit past the last real token
    pub token_pos: usize,
    /// The per-command slot index this token landed in
    pub slot: usize,
    pub value: String,
    pub bound: Option<&'a ArgSpec>,
}

/// The outcome of one resolution run. Rebuilt fresh every run; nothing
/// is carried across invocations.
#[derive(Debug)]
pub struct Resolution<'a> {
    /// The command path active when the scan ended
    pub command_path: String,
    /// Canonical name to raw values; a single element for every kind
    /// except chained
    pub bindings: HashMap<String, Vec<String>>,
    /// Declared and free positionals, ordered by token position
    pub positionals: Vec<PositionalArg<'a>>,
    /// Every command path traversed, the root path included
    pub executed: HashSet<String>,
    /// Accumulated problems, in the order they were found
    pub errors: Vec<ResolveError>,
}

/// Resolve a token array against a declaration table with no name
/// translation configured.
pub fn resolve<'a>(config: &'a Config, tokens: &[String]) -> Resolution<'a> {
    resolve_with(config, tokens, &IdentityResolver)
}

/// Resolve a token array, mapping surface names through `names` before
/// every flag and command lookup.
pub fn resolve_with<'a>(
    config: &'a Config,
    tokens: &[String],
    names: &dyn NameResolver,
) -> Resolution<'a> {
    Resolver::new(config, names).run(tokens)
}

/// Scan accumulators, threaded explicitly through the token loop.
#[derive(Debug, Default)]
struct ScanState {
    /// Active command path, extended or reset by command tokens
    command_path: String,
    /// Per-command positional slot cursor
    slot_cursor: HashMap<String, usize>,
    /// The next token was already consumed as a flag value
    skip_next: bool,
    /// Canonical name of the standalone flag bound by the previous
    /// token, eligible to claim an explicit boolean literal
    last_standalone: Option<String>,
}

struct Resolver<'a, 'n> {
    config: &'a Config,
    cache: FlagCache<'a>,
    registry: Vec<PositionalDecl<'a>>,
    command_paths: HashSet<String>,
    names: &'n dyn NameResolver,
    bindings: HashMap<String, Vec<String>>,
    positionals: Vec<PositionalArg<'a>>,
    executed: HashSet<String>,
    errors: Vec<ResolveError>,
}

impl<'a, 'n> Resolver<'a, 'n> {
    fn new(config: &'a Config, names: &'n dyn NameResolver) -> Self {
        Resolver {
            config,
            cache: FlagCache::build(config),
            registry: positional_registry(config),
            command_paths: config.command_paths().into_iter().collect(),
            names,
            bindings: HashMap::new(),
            positionals: Vec::new(),
            executed: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self, tokens: &[String]) -> Resolution<'a> {
        let mut state = ScanState::default();
        self.executed.insert(String::new());

        for (pos, token) in tokens.iter().enumerate() {
            state = self.step(state, pos, token, tokens);
        }

        self.fill_missing_slots(tokens.len());
        self.assemble();

        Resolution {
            command_path: state.command_path,
            bindings: self.bindings,
            positionals: self.positionals,
            executed: self.executed,
            errors: self.errors,
        }
    }

    /// Classify one token. Takes the accumulators by value and returns
    /// the next ones so the loop body stays a function of
    /// `(token, state) -> state` plus recorded side effects.
    fn step(
        &mut self,
        mut state: ScanState,
        pos: usize,
        token: &str,
        tokens: &[String],
    ) -> ScanState {
        if state.skip_next {
            state.skip_next = false;
            return state;
        }

        let last_standalone = state.last_standalone.take();

        if let Some(surface) = flag_surface(token) {
            if self.bind_flag(&mut state, pos, surface, tokens) {
                return state;
            }
            // unknown flag tolerated: the raw token falls through to
            // positional handling
            self.bind_positional(&mut state, pos, token);
            return state;
        }

        if let Some(flag) = last_standalone {
            if is_bool_literal(token) {
                if let Some(info) = self.cache.lookup(&flag, &state.command_path) {
                    self.check_value(info.arg, token);
                }
                self.bindings.insert(flag, vec![token.to_string()]);
                return state;
            }
        }

        if self.extend_command_path(&mut state, token) {
            return state;
        }

        self.bind_positional(&mut state, pos, token);
        state
    }

    /// Handle a flag-syntax token. Returns false when the name is
    /// unknown and unknown flags are tolerated, so the caller can
    /// reclassify the token.
    fn bind_flag(
        &mut self,
        state: &mut ScanState,
        pos: usize,
        surface: &str,
        tokens: &[String],
    ) -> bool {
        let (surface, inline) = match surface.find('=') {
            Some(idx) => (&surface[..idx], Some(&surface[idx + 1..])),
            None => (surface, None),
        };

        let canonical = self
            .names
            .canonical_flag(surface, &state.command_path)
            .unwrap_or_else(|| surface.to_string());

        let Some(info) = self.cache.lookup(&canonical, &state.command_path) else {
            if self.config.allow_unknown_flags {
                return false;
            }
            self.errors
                .push(ResolveError::UnknownFlag(surface.to_string()));
            return true;
        };
        let arg = info.arg;

        match arg.kind {
            ArgKind::Standalone => {
                if let Some(value) = inline {
                    self.check_value(arg, value);
                    self.bindings
                        .insert(arg.name.clone(), vec![value.to_string()]);
                } else {
                    self.bindings
                        .insert(arg.name.clone(), vec!["true".to_string()]);
                    state.last_standalone = Some(arg.name.clone());
                }
            }
            ArgKind::Single | ArgKind::Chained | ArgKind::File => {
                let value = match inline {
                    Some(value) => Some(value.to_string()),
                    None => match tokens.get(pos + 1) {
                        Some(value) => {
                            state.skip_next = true;
                            Some(value.clone())
                        }
                        None => {
                            self.errors
                                .push(ResolveError::MissingValue(arg.name.clone()));
                            None
                        }
                    },
                };
                if let Some(value) = value {
                    self.check_value(arg, &value);
                    let values = self.bindings.entry(arg.name.clone()).or_default();
                    if arg.kind != ArgKind::Chained {
                        values.clear();
                    }
                    values.push(value);
                }
            }
        }

        true
    }

    /// Try to grow or reset the command path with this token. Siblings
    /// at the root always reset the path.
    fn extend_command_path(&mut self, state: &mut ScanState, token: &str) -> bool {
        let canonical = self
            .names
            .canonical_command(token, &state.command_path)
            .unwrap_or_else(|| token.to_string());

        let extended = if state.command_path.is_empty() {
            canonical.clone()
        } else {
            format!("{} {}", state.command_path, canonical)
        };

        if self.command_paths.contains(&extended) {
            state.command_path = extended;
        } else if self.command_paths.contains(&canonical) {
            state.command_path = canonical;
        } else {
            return false;
        }

        self.executed.insert(state.command_path.clone());
        true
    }

    /// Bind a token to the current slot under the active command path,
    /// or keep it as a free positional.
    fn bind_positional(&mut self, state: &mut ScanState, pos: usize, token: &str) {
        let slot = state
            .slot_cursor
            .get(&state.command_path)
            .copied()
            .unwrap_or(0);

        let decl = self
            .registry
            .iter()
            .find(|d| d.arg.command_path == state.command_path && d.index == slot)
            .copied();

        match decl {
            // flag syntax already claimed this slot; the token stays in
            // the result without a contract, and numbering does not skip
            Some(decl) if self.bindings.contains_key(decl.key) => {
                self.positionals.push(PositionalArg {
                    token_pos: pos,
                    slot,
                    value: token.to_string(),
                    bound: None,
                });
            }
            Some(decl) => {
                self.check_value(decl.arg, token);
                self.positionals.push(PositionalArg {
                    token_pos: pos,
                    slot,
                    value: token.to_string(),
                    bound: Some(decl.arg),
                });
            }
            None => {
                self.positionals.push(PositionalArg {
                    token_pos: pos,
                    slot,
                    value: token.to_string(),
                    bound: None,
                });
            }
        }

        *state
            .slot_cursor
            .entry(state.command_path.clone())
            .or_insert(0) += 1;
    }

    fn check_value(&mut self, arg: &ArgSpec, value: &str) {
        for validator in &arg.validators {
            if let Err(message) = validator(value) {
                self.errors.push(ResolveError::Validation {
                    name: arg.name.clone(),
                    message,
                });
            }
        }
    }

    /// Post-pass: synthesize defaults and report missing required slots
    /// for every declaration whose owning command was traversed. Only
    /// the first declaration per (path, index) is checked.
    fn fill_missing_slots(&mut self, token_count: usize) {
        let registry = std::mem::take(&mut self.registry);
        let mut seen: HashSet<(&str, usize)> = HashSet::new();

        for decl in &registry {
            if !self.executed.contains(&decl.arg.command_path) {
                continue;
            }
            if !seen.insert((decl.arg.command_path.as_str(), decl.index)) {
                continue;
            }
            if self.slot_is_filled(decl) {
                continue;
            }

            if let Some(ref default) = decl.arg.default {
                self.positionals.push(PositionalArg {
                    token_pos: token_count,
                    slot: decl.index,
                    value: default.clone(),
                    bound: Some(decl.arg),
                });
            } else if self.slot_is_required(decl) {
                self.errors.push(ResolveError::MissingPositional {
                    key: decl.key.to_string(),
                    index: decl.index,
                });
            }
        }
    }

    fn slot_is_filled(&self, decl: &PositionalDecl<'a>) -> bool {
        if self.bindings.contains_key(decl.key) {
            return true;
        }
        self.positionals.iter().any(|p| {
            p.bound.is_some_and(|a| {
                a.name == decl.arg.name && a.command_path == decl.arg.command_path
            })
        })
    }

    fn slot_is_required(&self, decl: &PositionalDecl<'a>) -> bool {
        if decl.required {
            return true;
        }
        match decl.arg.required_if {
            Some(ref other) => {
                self.bindings.contains_key(other)
                    || self
                        .positionals
                        .iter()
                        .any(|p| p.bound.is_some_and(|a| &a.name == other))
            }
            None => false,
        }
    }

    /// Final shape: drop blank values, order by token position. The
    /// sort is stable, so synthesized defaults keep registry order.
    fn assemble(&mut self) {
        self.positionals.retain(|p| !p.value.is_empty());
        self.positionals.sort_by_key(|p| p.token_pos);
    }
}

/// Strip the configured flag prefix, longest first. A bare `-` or `--`
/// is not flag syntax.
fn flag_surface(token: &str) -> Option<&str> {
    if let Some(stripped) = token.strip_prefix("--") {
        if !stripped.is_empty() {
            return Some(stripped);
        }
        return None;
    }
    match token.strip_prefix('-') {
        Some(stripped) if !stripped.is_empty() => Some(stripped),
        _ => None,
    }
}

fn is_bool_literal(token: &str) -> bool {
    matches!(token, "true" | "false")
}
