//! The host side of the guest scripting runtime.
//!
//! Host functions see guest values as [`GuestValue`]s (nil, booleans,
//! numbers, strings and tables) and answer with a two-part result: a value
//! and nil on success, or nil and an error message on failure. Only
//! malformed calls and capability denials are raised as [`GuestError`]s.

use crate::error::GuestError;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// A value passed between guest code and host functions.
pub type GuestValue = Value;

/// A guest table with string keys.
pub type GuestTable = Map<String, Value>;

/// The two-part result of a host function.
#[derive(Debug, Clone, PartialEq)]
pub enum HostReturn {
    /// `(value, nil)`
    Value(GuestValue),
    /// `(nil, message)`
    Error(String),
}

impl HostReturn {
    pub fn error(message: impl Into<String>) -> Self {
        HostReturn::Error(message.into())
    }

    /// The pair as guest code receives it.
    pub fn into_pair(self) -> (GuestValue, GuestValue) {
        match self {
            HostReturn::Value(value) => (value, Value::Null),
            HostReturn::Error(message) => (Value::Null, Value::String(message)),
        }
    }

    pub fn value(&self) -> Option<&GuestValue> {
        match self {
            HostReturn::Value(value) => Some(value),
            HostReturn::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            HostReturn::Value(_) => None,
            HostReturn::Error(message) => Some(message),
        }
    }
}

/// What a host function call produces: a two-part result, or a raise.
pub type HostResult = Result<HostReturn, GuestError>;

/// A host function bound into a guest runtime.
///
/// Receives the call arguments and the caller's deadline, if any.
pub type HostFunction =
    Arc<dyn Fn(Vec<GuestValue>, Option<Instant>) -> BoxFuture<'static, HostResult> + Send + Sync>;

/// A table of host functions installed under one global name.
#[derive(Clone, Default)]
pub struct HostModule {
    functions: HashMap<String, HostFunction>,
}

impl HostModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, function: HostFunction) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<&HostFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for HostModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostModule")
            .field("functions", &self.names())
            .finish()
    }
}

/// A guest runtime instance host functions can be installed into.
pub trait GuestRuntime {
    /// Install `module` as the global `name`, replacing any previous value.
    ///
    /// Runtimes pass their caller's deadline, if any, as the second argument
    /// of every [`HostFunction`] call.
    fn set_global(&mut self, name: &str, module: HostModule);
}

/// A runtime instance for one plugin invocation.
#[derive(Debug, Default)]
pub struct GuestState {
    globals: HashMap<String, HostModule>,
    caller_deadline: Option<Instant>,
}

impl GuestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state whose calls are bounded by `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            globals: HashMap::new(),
            caller_deadline: Some(deadline),
        }
    }

    pub fn set_caller_deadline(&mut self, deadline: Option<Instant>) {
        self.caller_deadline = deadline;
    }

    /// The deadline of whoever is running the guest code, if one was set.
    pub fn caller_deadline(&self) -> Option<Instant> {
        self.caller_deadline
    }

    pub fn global(&self, name: &str) -> Option<&HostModule> {
        self.globals.get(name)
    }

    /// Call `namespace.function(args...)` the way guest code would.
    pub async fn call(&self, namespace: &str, function: &str, args: Vec<GuestValue>) -> HostResult {
        let module = self
            .globals
            .get(namespace)
            .ok_or_else(|| GuestError::UnknownNamespace {
                namespace: namespace.to_string(),
            })?;
        let host_fn = module
            .get(function)
            .ok_or_else(|| GuestError::UnknownFunction {
                namespace: namespace.to_string(),
                function: function.to_string(),
            })?;

        host_fn(args, self.caller_deadline).await
    }
}

impl GuestRuntime for GuestState {
    fn set_global(&mut self, name: &str, module: HostModule) {
        self.globals.insert(name.to_string(), module);
    }
}

/// The guest-facing name of a value's type.
pub fn type_name(value: &GuestValue) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "table",
    }
}

/// One host function invocation: who is calling, with what.
///
/// Argument positions are 1-based, as guest code counts them.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub plugin: String,
    pub function: &'static str,
    args: Vec<GuestValue>,
    caller_deadline: Option<Instant>,
}

impl CallFrame {
    pub fn new(
        plugin: impl Into<String>,
        function: &'static str,
        args: Vec<GuestValue>,
        caller_deadline: Option<Instant>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            function,
            args,
            caller_deadline,
        }
    }

    pub fn caller_deadline(&self) -> Option<Instant> {
        self.caller_deadline
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// The argument at `position`, treating nil as absent.
    pub fn arg(&self, position: usize) -> Option<&GuestValue> {
        position
            .checked_sub(1)
            .and_then(|i| self.args.get(i))
            .filter(|v| !v.is_null())
    }

    /// A required string argument.
    pub fn check_string(&self, position: usize) -> Result<&str, GuestError> {
        match self.arg(position) {
            Some(Value::String(s)) => Ok(s.as_str()),
            other => Err(self.bad_argument(
                position,
                format!(
                    "string expected, got {}",
                    other.map_or("no value", type_name)
                ),
            )),
        }
    }

    /// A required table argument.
    pub fn check_table(&self, position: usize) -> Result<&GuestTable, GuestError> {
        match self.arg(position) {
            Some(Value::Object(table)) => Ok(table),
            other => Err(self.bad_argument(
                position,
                format!("table expected, got {}", other.map_or("no value", type_name)),
            )),
        }
    }

    /// An optional table argument; anything but a table counts as absent.
    pub fn opt_table(&self, position: usize) -> Option<&GuestTable> {
        self.arg(position).and_then(Value::as_object)
    }

    pub fn bad_argument(&self, position: usize, message: impl Into<String>) -> GuestError {
        GuestError::BadArgument {
            function: self.function.to_string(),
            position,
            message: message.into(),
        }
    }
}
