//! Plugin trait definitions

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::host::PluginHost;
use crate::application::errors::{BotError, ConfigValidationError};
use crate::domain::entities::{Command, ConfigMap, EventSpec, Permission};

/// Runtime type a config field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Objects, arrays and null all count, like `typeof` does
    Object,
    /// Never satisfied by JSON data; the field must be absent
    Function,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Function => "function",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object() || value.is_array() || value.is_null(),
            FieldType::Function => false,
        }
    }
}

/// Declared type and presence rule of one config field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn required(kind: FieldType) -> Self {
        Self {
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(kind: FieldType) -> Self {
        Self {
            kind,
            required: false,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Identity and declared requirements of a plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    /// Other plugins this one expects; declared only, never enforced
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Advisory
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub config_schema: BTreeMap<String, FieldSpec>,
}

impl PluginDescriptor {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_dependency(mut self, plugin: impl Into<String>) -> Self {
        self.dependencies.push(plugin.into());
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.config_schema.insert(name.into(), spec);
        self
    }

    /// First identity field that is empty, if any
    pub fn missing_identity(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("version", &self.version),
            ("description", &self.description),
            ("author", &self.author),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    /// Check `candidate` against the config schema.
    ///
    /// An empty schema accepts anything.
    pub fn validate_config(&self, candidate: &ConfigMap) -> Result<bool, ConfigValidationError> {
        for (field, spec) in &self.config_schema {
            match candidate.get(field) {
                None if spec.required => {
                    return Err(ConfigValidationError::MissingField {
                        field: field.clone(),
                    })
                }
                None => {}
                Some(value) if !spec.kind.matches(value) => {
                    return Err(ConfigValidationError::WrongType {
                        field: field.clone(),
                        expected: spec.kind.as_str().to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(true)
    }
}

/// Core plugin trait that all plugins must implement.
///
/// Plugins are constructed by a [`PluginFactory`] with their [`PluginHost`] and
/// keep it for config access and for registering extra commands or events.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> &PluginDescriptor;

    /// Runs once after identity validation, before declared commands and events are registered
    async fn on_load(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// Runs before the plugin's commands and events are torn down
    async fn on_unload(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// Commands registered after `on_load`
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Event subscriptions attached after `on_load`
    fn events(&self) -> Vec<EventSpec> {
        Vec::new()
    }

    fn validate_config(&self, candidate: &ConfigMap) -> Result<bool, ConfigValidationError> {
        self.descriptor().validate_config(candidate)
    }
}

/// Builds a fresh plugin instance
pub type PluginFactory = fn(PluginHost) -> Box<dyn Plugin>;

/// Export a plugin from a native library.
///
/// Generates the `_plugin_create` symbol the loader looks up. The host and the
/// plugin must be built with the same compiler.
#[macro_export]
macro_rules! declare_plugin {
    ($factory:expr) => {
        #[no_mangle]
        pub extern "C" fn _plugin_create(
            host: *const $crate::plugins::PluginHost,
        ) -> *mut ::std::ffi::c_void {
            if host.is_null() {
                return ::std::ptr::null_mut();
            }
            // SAFETY: the loader passes a pointer to a host that outlives this call
            let host = unsafe { (*host).clone() };
            let factory: $crate::plugins::PluginFactory = $factory;
            let plugin: Box<dyn $crate::plugins::Plugin> = factory(host);
            Box::into_raw(Box::new(plugin)) as *mut ::std::ffi::c_void
        }
    };
}
