//! Parse `.env` files and load them into an environment store.
//!
//! The core is a line-oriented engine: a scanner that tolerates mixed
//! `\n`/`\r`/`\r\n` terminators, a line matcher for `KEY=value` and
//! YAML-style `KEY: value` assignments (with `export` prefixes, comments,
//! and quoting), quote-aware value decoding, and `$NAME`/`${NAME}` variable
//! expansion resolved against the pairs parsed so far with the target store
//! as fallback.
//!
//! [`EnvLoader`] with an in-memory [`EnvStore`] is the safe default. The
//! convenience loaders ([`load`], [`overload`], [`load_paths`],
//! [`overload_paths`], [`apply`], [`over_apply`], [`must_load`]) mutate the
//! process environment; callers must guarantee no concurrent
//! process-environment access.

mod env;
mod error;
mod expand;
mod loader;
mod model;
mod parser;
mod scanner;

pub use env::EnvStore;
pub use error::{Error, ParseError};
pub use loader::{
    EnvLoader, apply, load, load_paths, must_load, over_apply, overload, overload_paths,
};
pub use model::{Env, LoadReport};
pub use parser::{
    parse, parse_str, parse_with, strict_parse, strict_parse_str, strict_parse_with,
};
pub use scanner::{LineScanner, MAX_LINE_LEN};
