//! Error types for parameter resolution.

use std::path::PathBuf;

/// Errors raised while loading or validating parameters.
///
/// All of these are fatal configuration errors, raised before the JIT
/// pipeline performs any side effect.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParamsError {
    /// An override or config section names a category that does not exist.
    #[error("invalid parameter category '{0}'")]
    UnknownCategory(String),

    /// A key is not recognized within its category.
    #[error("invalid parameter name '{name}' in category '{category}'")]
    UnknownKey {
        /// The category the key appeared in.
        category: String,
        /// The unrecognized key.
        name: String,
    },

    /// A value could not be coerced to the expected type.
    #[error("invalid value for {category}.{name}: {reason}")]
    InvalidValue {
        /// The category of the offending key.
        category: String,
        /// The offending key.
        name: String,
        /// Why coercion failed.
        reason: String,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("failed to read configuration file {path}: {reason}")]
    ConfigRead {
        /// The configuration file path.
        path: PathBuf,
        /// Parser or I/O failure description.
        reason: String,
    },
}
