//! Tool trait: the abstraction over assistant capabilities.
//!
//! A tool is a named operation with a typed parameter list. Tools report
//! failure through `Err(ToolError)`; the registry turns every outcome,
//! including an unknown tool name, into a [`ToolResult`] string the model
//! can read. Nothing a tool does can end the agent loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::engine::ToolDefinition;
use crate::error::{RegistryError, ToolError};
use crate::session::Session;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the engine's tool_call id)
    pub id: String,

    pub name: String,

    pub arguments: Value,
}

/// The observation produced by one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,

    pub name: String,

    pub success: bool,

    /// Human-readable success or error description
    pub output: String,
}

impl ToolResult {
    pub fn from_outcome(call: &ToolCall, outcome: Result<String, ToolError>) -> Self {
        let (success, output) = match outcome {
            Ok(output) => (true, output),
            Err(e) => (false, format!("Error: {e}")),
        };
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success,
            output,
        }
    }
}

/// Primitive parameter types understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Number,
    Integer,
    String,
    NumberArray,
}

impl ParamKind {
    fn schema(self) -> Value {
        match self {
            Self::Number => serde_json::json!({ "type": "number" }),
            Self::Integer => serde_json::json!({ "type": "integer" }),
            Self::String => serde_json::json!({ "type": "string" }),
            Self::NumberArray => {
                serde_json::json!({ "type": "array", "items": { "type": "number" } })
            }
        }
    }

    /// Coerce a raw argument to this kind. Models occasionally send numbers
    /// as strings or integers as `2.0`; both are accepted.
    fn coerce(self, value: &Value) -> Option<Value> {
        match self {
            Self::Number => as_f64(value).map(Value::from),
            Self::Integer => as_f64(value)
                .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
                .map(|n| Value::from(n as i64)),
            Self::String => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            Self::NumberArray => value
                .as_array()?
                .iter()
                .map(as_f64)
                .collect::<Option<Vec<f64>>>()
                .map(Value::from),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One entry of a tool's parameter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    /// A parameter without a default is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default: None,
        }
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Number, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn number_array(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::NumberArray, description)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Build the JSON Schema object the engine sees for a parameter list.
pub fn parameters_schema(params: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in params {
        let mut prop = p.kind.schema();
        if !p.description.is_empty() {
            prop["description"] = Value::String(p.description.clone());
        }
        if let Some(default) = &p.default {
            prop["default"] = default.clone();
        } else {
            required.push(Value::String(p.name.clone()));
        }
        properties.insert(p.name.clone(), prop);
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments checked against a tool's parameter list, with defaults filled in.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    /// Validate raw engine arguments against `params`.
    ///
    /// Unknown keys are ignored. Missing required parameters and values of
    /// the wrong type are reported as `InvalidArguments`.
    pub fn bind(params: &[ToolParameter], raw: &Value) -> Result<Self, ToolError> {
        let empty = Map::new();
        let raw = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "expected an object of named arguments, got {other}"
                )));
            }
        };

        let mut values = Map::new();
        for p in params {
            let value = match (raw.get(&p.name), &p.default) {
                (Some(Value::Null) | None, Some(default)) => default.clone(),
                (Some(Value::Null) | None, None) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required parameter '{}'",
                        p.name
                    )));
                }
                (Some(v), _) => p.kind.coerce(v).ok_or_else(|| {
                    ToolError::InvalidArguments(format!(
                        "parameter '{}' must be of type {:?}, got {v}",
                        p.name, p.kind
                    ))
                })?,
            };
            values.insert(p.name.clone(), value);
        }
        Ok(Self { values })
    }

    /// Construct directly from already-typed values (mainly for tests).
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    fn get(&self, name: &str) -> Result<&Value, ToolError> {
        self.values
            .get(name)
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing parameter '{name}'")))
    }

    pub fn number(&self, name: &str) -> Result<f64, ToolError> {
        let v = self.get(name)?;
        as_f64(v).ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not a number")))
    }

    pub fn integer(&self, name: &str) -> Result<i64, ToolError> {
        let v = self.get(name)?;
        v.as_i64()
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not an integer")))
    }

    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        let v = self.get(name)?;
        v.as_str()
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not a string")))
    }

    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, ToolError> {
        let v = self.get(name)?;
        v.as_array()
            .and_then(|items| items.iter().map(as_f64).collect())
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' is not a list of numbers")))
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add_todo_item").
    fn name(&self) -> &str;

    /// What the tool does (sent to the model).
    fn description(&self) -> &str;

    /// Ordered, typed parameter list.
    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    /// Run the tool against the session with validated arguments.
    async fn execute(&self, session: &mut Session, args: ToolArgs) -> Result<String, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: parameters_schema(&self.parameters()),
        }
    }
}

/// Signature of a synchronous tool body.
pub type ToolFn = fn(&mut Session, &ToolArgs) -> Result<String, ToolError>;

/// A tool assembled from a name, description, parameter list and a plain
/// function. Most built-ins are registered this way.
pub struct FnTool {
    name: &'static str,
    description: &'static str,
    parameters: Vec<ToolParameter>,
    handler: ToolFn,
}

impl FnTool {
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameters: Vec<ToolParameter>,
        handler: ToolFn,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            handler,
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        self.parameters.clone()
    }

    async fn execute(&self, session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
        (self.handler)(session, &args)
    }
}

/// The fixed catalog of tools available during a session.
///
/// Built once at startup. Catalog order is registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A second tool with an existing name is rejected.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Tool definitions for the engine, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call. Never fails: every problem becomes an
    /// unsuccessful [`ToolResult`].
    pub async fn execute(&self, call: &ToolCall, session: &mut Session) -> ToolResult {
        let outcome = match self.get(&call.name) {
            None => Err(ToolError::NotFound(call.name.clone())),
            Some(tool) => match ToolArgs::bind(&tool.parameters(), &call.arguments) {
                Ok(args) => tool.execute(session, args).await,
                Err(e) => Err(e),
            },
        };
        ToolResult::from_outcome(call, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::todo::{TodoItem, TodoStore};
    use std::sync::Arc;

    struct NullStore;

    impl TodoStore for NullStore {
        fn name(&self) -> &str {
            "null"
        }
        fn save(&self, _items: &[TodoItem]) -> Result<(), PersistenceError> {
            Ok(())
        }
        fn load(&self) -> Result<Option<Vec<TodoItem>>, PersistenceError> {
            Ok(None)
        }
        fn remove(&self) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn session() -> Session {
        Session::new(Arc::new(NullStore))
    }

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Vec<ToolParameter> {
            vec![
                ToolParameter::string("text", "What to echo"),
                ToolParameter::integer("times", "Repetitions").with_default(1),
            ]
        }
        async fn execute(&self, _session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
            let text = args.string("text")?;
            let times = args.integer("times")?;
            Ok(text.repeat(times.max(0) as usize))
        }
    }

    fn halve(_session: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
        let n = args.number("n")?;
        if n == 0.0 {
            return Err(ToolError::rejected("Cannot halve zero."));
        }
        Ok(format!("{}", n / 2.0))
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert_eq!(registry.get("echo").unwrap().name(), "echo");
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        registry
            .register(Box::new(FnTool::new(
                "halve",
                "Halves a number.",
                vec![ToolParameter::number("n", "The number")],
                halve,
            )))
            .unwrap();
        assert_eq!(registry.names(), vec!["echo", "halve"]);
        let defs = registry.definitions();
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["text"]));
        assert_eq!(defs[0].parameters["properties"]["times"]["default"], 1);
        assert_eq!(defs[1].parameters["properties"]["n"]["type"], "number");
    }

    #[test]
    fn bind_fills_defaults_and_coerces() {
        let params = EchoTool.parameters();
        let args = ToolArgs::bind(&params, &serde_json::json!({"text": 5})).unwrap();
        assert_eq!(args.string("text").unwrap(), "5");
        assert_eq!(args.integer("times").unwrap(), 1);

        let args = ToolArgs::bind(&params, &serde_json::json!({"text": "a", "times": 3.0})).unwrap();
        assert_eq!(args.integer("times").unwrap(), 3);
    }

    #[test]
    fn bind_reports_missing_and_mistyped() {
        let params = EchoTool.parameters();
        let err = ToolArgs::bind(&params, &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'text'"));

        let err = ToolArgs::bind(&params, &serde_json::json!({"text": "a", "times": 1.5}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn number_array_binding() {
        let params = vec![ToolParameter::number_array("numbers", "values")];
        let args = ToolArgs::bind(&params, &serde_json::json!({"numbers": [1, "2.5", 3]})).unwrap();
        assert_eq!(args.numbers("numbers").unwrap(), vec![1.0, 2.5, 3.0]);
        assert!(ToolArgs::bind(&params, &serde_json::json!({"numbers": ["x"]})).is_err());
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let mut s = session();
        let result = registry
            .execute(&call("echo", serde_json::json!({"text": "hi", "times": 2})), &mut s)
            .await;
        assert!(result.success);
        assert_eq!(result.output, "hihi");
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let mut s = session();
        let result = registry.execute(&call("nonexistent", Value::Null), &mut s).await;
        assert!(!result.success);
        assert_eq!(result.output, "Error: Tool not found: nonexistent");
    }

    #[tokio::test]
    async fn tool_errors_become_observations() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Box::new(FnTool::new(
                "halve",
                "Halves a number.",
                vec![ToolParameter::number("n", "The number")],
                halve,
            )))
            .unwrap();
        let mut s = session();

        let result = registry.execute(&call("halve", serde_json::json!({"n": 0})), &mut s).await;
        assert!(!result.success);
        assert_eq!(result.output, "Error: Cannot halve zero.");

        let result = registry.execute(&call("halve", serde_json::json!({})), &mut s).await;
        assert!(!result.success);
        assert!(result.output.contains("missing required parameter"));
    }
}
