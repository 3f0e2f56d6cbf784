//! Per-run lookup structures derived from the declaration table.

use crate::config::{ArgKind, ArgSpec, Config};
use std::collections::HashMap;

/// An argument paired with the command path that scopes its visibility.
#[derive(Debug, Clone, Copy)]
pub struct FlagInfo<'a> {
    pub arg: &'a ArgSpec,
    pub command_path: &'a str,
}

/// Fast canonical-name lookup, built once per resolution run.
///
/// Never mutated after construction. Long and short names are both
/// registered; a name colliding across declarations keeps the last
/// registration (same-scope collisions are already rejected by
/// `Config::validate`).
#[derive(Debug, Default)]
pub struct FlagCache<'a> {
    infos: HashMap<String, HashMap<String, FlagInfo<'a>>>,
    needs_value: HashMap<String, bool>,
    is_standalone: HashMap<String, bool>,
}

impl<'a> FlagCache<'a> {
    pub fn build(config: &'a Config) -> Self {
        let mut cache = FlagCache::default();
        for arg in &config.args {
            cache.register(arg.name.clone(), arg);
            if let Some(short) = arg.short {
                cache.register(short.to_string(), arg);
            }
        }
        cache
    }

    fn register(&mut self, key: String, arg: &'a ArgSpec) {
        self.needs_value.insert(key.clone(), arg.needs_value());
        self.is_standalone
            .insert(key.clone(), arg.kind == ArgKind::Standalone);
        self.infos.entry(key).or_default().insert(
            arg.command_path.clone(),
            FlagInfo {
                arg,
                command_path: &arg.command_path,
            },
        );
    }

    /// Look up a canonical name, scoped to the given command path first,
    /// falling back to the global scope.
    pub fn lookup(&self, name: &str, command_path: &str) -> Option<FlagInfo<'a>> {
        let scoped = self.infos.get(name)?;
        scoped
            .get(command_path)
            .or_else(|| scoped.get(""))
            .copied()
    }

    /// Whether flag-syntax mention of this name consumes a value token.
    pub fn needs_value(&self, name: &str) -> bool {
        self.needs_value.get(name).copied().unwrap_or(false)
    }

    /// Whether this name refers to a boolean-only flag.
    pub fn is_standalone(&self, name: &str) -> bool {
        self.is_standalone.get(name).copied().unwrap_or(false)
    }
}

/// Read-only view over an argument with a fixed positional slot.
#[derive(Debug, Clone, Copy)]
pub struct PositionalDecl<'a> {
    pub key: &'a str,
    pub arg: &'a ArgSpec,
    pub index: usize,
    pub required: bool,
}

/// Collect every positional declaration, stably sorted ascending by
/// index. Declarations sharing an index keep registration order so the
/// post-pass's first-match rule stays deterministic.
pub fn positional_registry(config: &Config) -> Vec<PositionalDecl<'_>> {
    let mut decls: Vec<PositionalDecl> = config
        .args
        .iter()
        .filter_map(|arg| {
            arg.position.map(|index| PositionalDecl {
                key: &arg.name,
                arg,
                index,
                required: arg.required,
            })
        })
        .collect();
    decls.sort_by_key(|decl| decl.index);
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_config(json: &str) -> Config {
        Config::from_json(json).unwrap()
    }

    #[test]
    fn test_long_and_short_names_registered() {
        let config = parse_config(
            r#"{"args":[{"name":"verbose","short":"v","kind":"standalone"}]}"#,
        );
        let cache = FlagCache::build(&config);
        assert!(cache.lookup("verbose", "").is_some());
        assert!(cache.lookup("v", "").is_some());
        assert!(cache.lookup("q", "").is_none());
    }

    #[test]
    fn test_scoped_lookup_prefers_exact_path() {
        let config = parse_config(
            r#"{
                "args":[
                    {"name":"force","kind":"standalone"},
                    {"name":"force","kind":"single","command_path":"remote"}
                ],
                "commands":[{"name":"remote"}]
            }"#,
        );
        let cache = FlagCache::build(&config);

        let scoped = cache.lookup("force", "remote").unwrap();
        assert_eq!(scoped.command_path, "remote");
        assert_eq!(scoped.arg.kind, ArgKind::Single);

        let global = cache.lookup("force", "").unwrap();
        assert_eq!(global.command_path, "");
        assert_eq!(global.arg.kind, ArgKind::Standalone);
    }

    #[test]
    fn test_global_fallback_under_unrelated_path() {
        let config = parse_config(r#"{"args":[{"name":"verbose","kind":"standalone"}]}"#);
        let cache = FlagCache::build(&config);
        let info = cache.lookup("verbose", "remote add").unwrap();
        assert_eq!(info.command_path, "");
    }

    #[test]
    fn test_scoped_flag_invisible_elsewhere() {
        let config = parse_config(
            r#"{
                "args":[{"name":"force","kind":"standalone","command_path":"remote"}],
                "commands":[{"name":"remote"},{"name":"status"}]
            }"#,
        );
        let cache = FlagCache::build(&config);
        assert!(cache.lookup("force", "remote").is_some());
        assert!(cache.lookup("force", "status").is_none());
        assert!(cache.lookup("force", "").is_none());
    }

    #[test]
    fn test_needs_value_predicates() {
        let config = parse_config(
            r#"{"args":[
                {"name":"verbose","kind":"standalone"},
                {"name":"output","short":"o","kind":"single"},
                {"name":"tag","kind":"chained"},
                {"name":"input","kind":"file","position":0}
            ]}"#,
        );
        let cache = FlagCache::build(&config);
        assert!(!cache.needs_value("verbose"));
        assert!(cache.needs_value("output"));
        assert!(cache.needs_value("o"));
        assert!(cache.needs_value("tag"));
        // positional-bound arguments are excluded from needs_value
        assert!(!cache.needs_value("input"));
        assert!(!cache.needs_value("unknown"));
    }

    #[test]
    fn test_is_standalone_predicates() {
        let config = parse_config(
            r#"{"args":[
                {"name":"verbose","short":"v","kind":"standalone"},
                {"name":"output","kind":"single"}
            ]}"#,
        );
        let cache = FlagCache::build(&config);
        assert!(cache.is_standalone("verbose"));
        assert!(cache.is_standalone("v"));
        assert!(!cache.is_standalone("output"));
        assert!(!cache.is_standalone("unknown"));
    }

    #[test]
    fn test_registry_sorted_by_index() {
        let config = parse_config(
            r#"{"args":[
                {"name":"third","kind":"single","position":2},
                {"name":"first","kind":"single","position":0},
                {"name":"second","kind":"single","position":1}
            ]}"#,
        );
        let registry = positional_registry(&config);
        let keys: Vec<&str> = registry.iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_registry_stable_on_duplicate_indices() {
        let config = parse_config(
            r#"{"args":[
                {"name":"late","kind":"single","position":1},
                {"name":"winner","kind":"single","position":0},
                {"name":"shadowed","kind":"single","position":0}
            ]}"#,
        );
        let registry = positional_registry(&config);
        let keys: Vec<&str> = registry.iter().map(|d| d.key).collect();
        // registration order preserved among equal indices
        assert_eq!(keys, vec!["winner", "shadowed", "late"]);
    }

    #[test]
    fn test_registry_ignores_non_positional_args() {
        let config = parse_config(
            r#"{"args":[
                {"name":"verbose","kind":"standalone"},
                {"name":"input","kind":"single","position":0}
            ]}"#,
        );
        let registry = positional_registry(&config);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry[0].key, "input");
        assert_eq!(registry[0].index, 0);
    }

    #[test]
    fn test_registry_carries_required_flag() {
        let config = parse_config(
            r#"{"args":[{"name":"input","kind":"single","position":0,"required":true}]}"#,
        );
        let registry = positional_registry(&config);
        assert!(registry[0].required);
    }
}
