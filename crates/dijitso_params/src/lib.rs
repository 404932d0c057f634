//! Parameter handling for the dijitso JIT cache.
//!
//! Parameters come in three categories: `cache` (where artifacts live and
//! how they are named), `build` (how the compiler is invoked), and
//! `generator` (an opaque map passed through to the caller's code
//! generator). Resolution layers caller overrides on top of an optional
//! `.dijitso.conf` INI file on top of built-in defaults, with type coercion
//! and strict unknown-key rejection along the way.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ParamsError;
pub use loader::{discover_config_filename, parse_config_file, read_config_file, ConfigContents};
pub use resolve::{resolve_params, validate_params};
pub use types::{
    BuildParams, CacheParams, GeneratorParams, ParamValue, Params, ParamsOverrides, SrcStorage,
};
