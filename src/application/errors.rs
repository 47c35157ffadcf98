//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("{0}")]
    Plugin(#[from] PluginError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ConfigValidationError> for BotError {
    fn from(err: ConfigValidationError) -> Self {
        BotError::Plugin(PluginError::ConfigValidation(err))
    }
}

impl From<ValidationError> for BotError {
    fn from(err: ValidationError) -> Self {
        BotError::Command(CommandError::Validation(err))
    }
}

/// Plugin lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    /// No plugin directory, no entry manifest, or no loaded instance under that name
    #[error("Plugin '{0}' not found")]
    NotFound(String),

    /// Entry does not yield a constructible plugin, or the instance has incomplete identity
    #[error("Invalid plugin '{name}': {reason}")]
    Invalid { name: String, reason: String },

    #[error("Plugin '{0}' is not loaded")]
    NotLoaded(String),

    #[error("Plugin '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// A lifecycle hook failed
    #[error("Plugin '{name}' failed to load: {reason}")]
    Load { name: String, reason: String },

    #[error(transparent)]
    ConfigValidation(#[from] ConfigValidationError),
}

impl PluginError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PluginError::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn load(name: impl Into<String>, reason: impl Into<String>) -> Self {
        PluginError::Load {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// A command or event entry that cannot be registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} has no name")]
    MissingName { kind: &'static str },

    #[error("{kind} '{name}' has no handler")]
    MissingHandler { kind: &'static str, name: String },

    #[error("{kind} name '{name}' is not valid")]
    InvalidName { kind: &'static str, name: String },
}

/// Guild configuration rejected by a plugin's schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Required field '{field}' is missing from the configuration")]
    MissingField { field: String },

    #[error("Field '{field}' must be of type {expected}")]
    WrongType { field: String, expected: String },
}

impl ConfigValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ConfigValidationError::MissingField { field } => field,
            ConfigValidationError::WrongType { field, .. } => field,
        }
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Permission denied")]
    PermissionDenied,
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store is not connected")]
    Unavailable,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
