//! argtree - declarative argv resolution over nested command trees.
//!
//! This library resolves a raw token array against a declaration table
//! of flags, nested commands, and positional slots: every token is
//! classified and bound in one left-to-right pass, problems are
//! accumulated rather than thrown, and the caller gets back the active
//! command path, flag bindings, and an ordered positional list.

pub mod cache;
pub mod config;
pub mod names;
pub mod output;
pub mod resolver;

pub use cache::{positional_registry, FlagCache, FlagInfo, PositionalDecl};
pub use config::{ArgKind, ArgSpec, CommandSpec, Config, ConfigError, ValidatorFn};
pub use names::{AliasResolver, IdentityResolver, NameResolver};
pub use output::{report_string, write_report, Report};
pub use resolver::{resolve, resolve_with, PositionalArg, Resolution, ResolveError};
