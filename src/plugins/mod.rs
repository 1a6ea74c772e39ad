//! Data source and visualizer plugins
//!
//! Data sources produce a full [`Graph`] from a configuration map; visualizers
//! turn a graph into an opaque presentation string. Plugins are registered
//! explicitly in a [`PluginRegistry`] built by the composition root.

mod builtin;

pub use builtin::{EmptyDataSource, JsonFileDataSource, JsonVisualizer, SummaryVisualizer};

use crate::aggregate::Graph;
use crate::error::{Entity, GraphError, GraphResult};
use crate::value_objects::{parse_date, parse_datetime};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Configuration handed to a data source on load
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// Common plugin identity
pub trait Plugin: Send + Sync {
    /// Stable key used to reference the plugin from a workspace
    fn identifier(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;
}

/// A producer of graph snapshots
#[async_trait]
pub trait DataSourcePlugin: Plugin {
    /// The configuration schema, in display order
    fn configuration_parameters(&self) -> Vec<ConfigParam> {
        Vec::new()
    }

    /// Load a complete graph
    async fn load(&self, config: &ConfigMap) -> anyhow::Result<Graph>;
}

/// A renderer of graph snapshots
pub trait VisualizerPlugin: Plugin {
    /// Render the graph; the result is never parsed by the core
    fn display(&self, graph: &Graph) -> String;
}

/// Value type of a configuration parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[serde(rename = "str")]
    String,
    Int,
    Float,
    #[serde(rename = "bool")]
    Boolean,
    Date,
    DateTime,
    Url,
    Email,
    Choice,
    Password,
}

/// One selectable value of a `choice` parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub display: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: display.into(),
        }
    }
}

/// Describes one configuration parameter of a data source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigParam {
    pub name: String,
    pub display_name: String,
    pub value_type: ParamType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
}

impl ConfigParam {
    /// A required parameter displayed under its own name.
    ///
    /// Fails for `choice`, which needs [`ConfigParam::choice`].
    pub fn new(name: impl Into<String>, value_type: ParamType) -> GraphResult<Self> {
        if value_type == ParamType::Choice {
            return Err(GraphError::validation(
                "Choice parameters must have options.",
            ));
        }
        Ok(Self::unchecked(name.into(), value_type, None))
    }

    /// A required `choice` parameter
    pub fn choice(name: impl Into<String>, options: Vec<ChoiceOption>) -> GraphResult<Self> {
        if options.is_empty() {
            return Err(GraphError::validation(
                "Choice parameters must have options.",
            ));
        }
        Ok(Self::unchecked(name.into(), ParamType::Choice, Some(options)))
    }

    fn unchecked(name: String, value_type: ParamType, options: Option<Vec<ChoiceOption>>) -> Self {
        Self {
            display_name: name.clone(),
            name,
            value_type,
            required: true,
            default: None,
            options,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Check a supplied value, falling back to the default.
    ///
    /// Returns `None` for an absent optional parameter without a default.
    pub fn resolve(&self, supplied: Option<&serde_json::Value>) -> GraphResult<Option<serde_json::Value>> {
        let value = match supplied.filter(|v| !is_blank(v)).or(self.default.as_ref()) {
            Some(value) => value,
            None if self.required => {
                return Err(GraphError::validation(format!(
                    "Missing required parameter '{}'.",
                    self.display_name
                )))
            }
            None => return Ok(None),
        };

        if self.accepts(value) {
            Ok(Some(value.clone()))
        } else {
            Err(GraphError::validation(format!(
                "Invalid value for parameter '{}': {value}",
                self.display_name
            )))
        }
    }

    fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value as Json;

        let text = value.as_str();
        match self.value_type {
            ParamType::String | ParamType::Password => text.is_some(),
            ParamType::Int => {
                value.is_i64() || value.is_u64() || text.is_some_and(|s| s.trim().parse::<i64>().is_ok())
            }
            ParamType::Float => {
                value.is_number() || text.is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            ParamType::Boolean => matches!(value, Json::Bool(_)),
            ParamType::Date => text.and_then(|s| parse_date(s.trim())).is_some(),
            ParamType::DateTime => text.and_then(|s| parse_datetime(s.trim())).is_some(),
            ParamType::Url => text.is_some_and(|s| {
                s.split_once("://")
                    .is_some_and(|(scheme, rest)| !scheme.is_empty() && !rest.is_empty())
            }),
            ParamType::Email => text.is_some_and(|s| {
                s.split_once('@')
                    .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'))
            }),
            ParamType::Choice => {
                let chosen = match value {
                    Json::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.options
                    .as_ref()
                    .is_some_and(|options| options.iter().any(|o| o.value == chosen))
            }
        }
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

/// Validate a configuration map against a schema and apply defaults.
///
/// Keys not named by the schema are passed through unchanged.
pub fn resolve_config(params: &[ConfigParam], config: &ConfigMap) -> GraphResult<ConfigMap> {
    let mut resolved = config.clone();
    for param in params {
        match param.resolve(config.get(&param.name))? {
            Some(value) => {
                resolved.insert(param.name.clone(), value);
            }
            None => {
                resolved.remove(&param.name);
            }
        }
    }
    Ok(resolved)
}

/// Identity of a registered plugin, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub identifier: String,
    pub name: String,
}

impl PluginInfo {
    fn of(plugin: &dyn Plugin) -> Self {
        Self {
            identifier: plugin.identifier().to_string(),
            name: plugin.name().to_string(),
        }
    }
}

/// Registration table of the available plugins, in registration order
#[derive(Clone, Default)]
pub struct PluginRegistry {
    data_sources: IndexMap<String, Arc<dyn DataSourcePlugin>>,
    visualizers: IndexMap<String, Arc<dyn VisualizerPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.data_sources.insert(
            EmptyDataSource::IDENTIFIER.to_string(),
            Arc::new(EmptyDataSource),
        );
        registry.data_sources.insert(
            JsonFileDataSource::IDENTIFIER.to_string(),
            Arc::new(JsonFileDataSource),
        );
        registry.visualizers.insert(
            JsonVisualizer::IDENTIFIER.to_string(),
            Arc::new(JsonVisualizer),
        );
        registry.visualizers.insert(
            SummaryVisualizer::IDENTIFIER.to_string(),
            Arc::new(SummaryVisualizer),
        );
        registry
    }

    /// Register a data source; identifiers must be unique
    pub fn register_data_source(&mut self, plugin: Arc<dyn DataSourcePlugin>) -> GraphResult<()> {
        let id = plugin.identifier().to_string();
        if self.data_sources.contains_key(&id) {
            return Err(GraphError::duplicate(Entity::DataSource, id));
        }
        self.data_sources.insert(id, plugin);
        Ok(())
    }

    /// Register a visualizer; identifiers must be unique
    pub fn register_visualizer(&mut self, plugin: Arc<dyn VisualizerPlugin>) -> GraphResult<()> {
        let id = plugin.identifier().to_string();
        if self.visualizers.contains_key(&id) {
            return Err(GraphError::duplicate(Entity::Visualizer, id));
        }
        self.visualizers.insert(id, plugin);
        Ok(())
    }

    pub fn data_source(&self, id: &str) -> Option<Arc<dyn DataSourcePlugin>> {
        self.data_sources.get(id).cloned()
    }

    pub fn visualizer(&self, id: &str) -> Option<Arc<dyn VisualizerPlugin>> {
        self.visualizers.get(id).cloned()
    }

    /// The first registered visualizer
    pub fn default_visualizer(&self) -> Option<Arc<dyn VisualizerPlugin>> {
        self.visualizers.values().next().cloned()
    }

    pub fn data_sources(&self) -> Vec<PluginInfo> {
        self.data_sources
            .values()
            .map(|plugin| PluginInfo::of(plugin.as_ref()))
            .collect()
    }

    pub fn visualizers(&self) -> Vec<PluginInfo> {
        self.visualizers
            .values()
            .map(|plugin| PluginInfo::of(plugin.as_ref()))
            .collect()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .field("visualizers", &self.visualizers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_choice_requires_options() {
        assert!(ConfigParam::new("mode", ParamType::Choice).is_err());
        assert!(ConfigParam::choice("mode", vec![]).is_err());

        let param = ConfigParam::choice(
            "mode",
            vec![ChoiceOption::new("fast", "Fast"), ChoiceOption::new("slow", "Slow")],
        )
        .unwrap();
        assert_eq!(param.resolve(Some(&json!("fast"))).unwrap(), Some(json!("fast")));
        assert!(param.resolve(Some(&json!("medium"))).is_err());
    }

    #[test]
    fn test_options_only_serialized_for_choice() {
        let param = ConfigParam::new("host", ParamType::Url).unwrap();
        let json = serde_json::to_value(&param).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["value_type"], "url");
    }

    #[test]
    fn test_resolve_config_applies_defaults() {
        let params = vec![
            ConfigParam::new("path", ParamType::String).unwrap(),
            ConfigParam::new("limit", ParamType::Int)
                .unwrap()
                .optional()
                .with_default(10),
            ConfigParam::new("since", ParamType::Date).unwrap().optional(),
        ];

        let config = ConfigMap::from([("path".to_string(), json!("graph.json"))]);
        let resolved = resolve_config(&params, &config).unwrap();
        assert_eq!(resolved["limit"], json!(10));
        assert!(!resolved.contains_key("since"));

        let err = resolve_config(&params, &ConfigMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter 'path'.");

        let bad = ConfigMap::from([
            ("path".to_string(), json!("graph.json")),
            ("since".to_string(), json!("yesterday")),
        ]);
        assert!(resolve_config(&params, &bad).is_err());
    }

    #[test]
    fn test_typed_params() {
        let email = ConfigParam::new("mail", ParamType::Email).unwrap();
        assert!(email.resolve(Some(&json!("a@b.io"))).is_ok());
        assert!(email.resolve(Some(&json!("nobody"))).is_err());

        let url = ConfigParam::new("endpoint", ParamType::Url).unwrap();
        assert!(url.resolve(Some(&json!("bolt://localhost:7687"))).is_ok());
        assert!(url.resolve(Some(&json!("localhost"))).is_err());

        let flag = ConfigParam::new("flag", ParamType::Boolean).unwrap();
        assert!(flag.resolve(Some(&json!(true))).is_ok());
        assert!(flag.resolve(Some(&json!("true"))).is_err());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = PluginRegistry::with_builtins();
        let err = registry
            .register_data_source(Arc::new(EmptyDataSource))
            .unwrap_err();
        assert_eq!(err, GraphError::duplicate(Entity::DataSource, "empty_data_source"));

        assert_eq!(
            registry.default_visualizer().map(|v| v.identifier().to_string()),
            Some(JsonVisualizer::IDENTIFIER.to_string())
        );
        assert_eq!(registry.data_sources().len(), 2);
        assert!(registry.visualizer("summary_visualizer").is_some());
        assert!(registry.data_source("nope").is_none());
    }
}
