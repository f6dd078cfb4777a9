//! Host functions installed into plugin guest runtimes.
//!
//! [`Functions`] owns the fixed [`OPERATIONS`] catalog. Registering it for
//! a plugin binds each operation behind a capability check keyed to that
//! plugin's name; a denied call raises before the handler runs.
//!
//! Handlers answer with the two-part result convention. Failures from the
//! KV store or world service go through [`sanitize_error`] first.

mod commands;
mod world;
mod world_write;

use crate::commands::{AccessEngine, CommandRegistry};
use crate::config::{HostConfig, DEFAULT_NAMESPACE};
use crate::context::{effective_deadline, run_until, DEFAULT_QUERY_TIMEOUT};
use crate::error::{GuestError, HostError};
use crate::guest::{
    CallFrame, GuestRuntime, GuestValue, HostFunction, HostModule, HostResult, HostReturn,
};
use crate::kv::KvStore;
use crate::sanitize::{sanitize_error, ErrorSite};
use futures::future::BoxFuture;
use holomush_capability::Enforcer;
use holomush_world::{PropertyRegistry, WorldService};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use ulid::Ulid;

pub const KV_UNAVAILABLE: &str = "kv store not available";
pub const WORLD_UNAVAILABLE: &str = "world service not configured - contact server administrator";
pub const MUTATIONS_UNSUPPORTED: &str = "world service does not support mutations";
pub const SEARCH_UNSUPPORTED: &str = "world service does not support location search";
pub const COMMANDS_UNAVAILABLE: &str = "command registry not available";
pub const ACCESS_UNAVAILABLE: &str = "access engine not available";

/// Which handler an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Log,
    NewRequestId,
    KvGet,
    KvSet,
    KvDelete,
    QueryLocation,
    QueryCharacter,
    QueryLocationCharacters,
    QueryObject,
    CreateLocation,
    CreateExit,
    CreateObject,
    FindLocation,
    GetProperty,
    SetProperty,
    ListCommands,
    GetCommandHelp,
}

/// One entry of the host function catalog.
#[derive(Debug)]
pub struct Operation {
    name: &'static str,
    capability: Option<&'static str>,
    handler: Handler,
}

impl Operation {
    const fn new(name: &'static str, capability: Option<&'static str>, handler: Handler) -> Self {
        Self {
            name,
            capability,
            handler,
        }
    }

    /// Name guest code calls.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Capability checked before every call; `None` for always-available
    /// operations.
    pub fn capability(&self) -> Option<&'static str> {
        self.capability
    }
}

/// Every host function, with the capability it requires.
pub static OPERATIONS: &[Operation] = &[
    Operation::new("log", None, Handler::Log),
    Operation::new("new_request_id", None, Handler::NewRequestId),
    Operation::new("kv_get", Some("kv.read"), Handler::KvGet),
    Operation::new("kv_set", Some("kv.write"), Handler::KvSet),
    Operation::new("kv_delete", Some("kv.write"), Handler::KvDelete),
    Operation::new("query_location", Some("world.read.location"), Handler::QueryLocation),
    Operation::new("query_character", Some("world.read.character"), Handler::QueryCharacter),
    Operation::new(
        "query_location_characters",
        Some("world.read.character"),
        Handler::QueryLocationCharacters,
    ),
    Operation::new("query_object", Some("world.read.object"), Handler::QueryObject),
    Operation::new("create_location", Some("world.write.location"), Handler::CreateLocation),
    Operation::new("create_exit", Some("world.write.exit"), Handler::CreateExit),
    Operation::new("create_object", Some("world.write.object"), Handler::CreateObject),
    Operation::new("find_location", Some("world.read.location"), Handler::FindLocation),
    Operation::new("get_property", Some("property.get"), Handler::GetProperty),
    Operation::new("set_property", Some("property.set"), Handler::SetProperty),
    Operation::new("list_commands", Some("command.list"), Handler::ListCommands),
    Operation::new("get_command_help", Some("command.help"), Handler::GetCommandHelp),
];

/// Look up a catalog entry by name.
pub fn operation(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// The host function bridge.
///
/// Built once per server. Only the enforcer is required; operations whose
/// collaborator is missing return an explanatory error to the guest.
#[derive(Clone)]
pub struct Functions {
    enforcer: Arc<Enforcer>,
    kv: Option<Arc<dyn KvStore>>,
    world: Option<Arc<dyn WorldService>>,
    commands: Option<Arc<dyn CommandRegistry>>,
    access: Option<Arc<dyn AccessEngine>>,
    properties: PropertyRegistry,
    namespace: String,
    query_timeout: Duration,
}

impl Functions {
    pub fn new(enforcer: Arc<Enforcer>) -> Self {
        Self {
            enforcer,
            kv: None,
            world: None,
            commands: None,
            access: None,
            properties: PropertyRegistry::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Bridge using the namespace and timeout from `config`.
    pub fn from_config(enforcer: Arc<Enforcer>, config: &HostConfig) -> Self {
        Self::new(enforcer)
            .with_namespace(config.host.namespace.clone())
            .with_query_timeout(config.host.query_timeout())
    }

    pub fn with_kv_store(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    pub fn with_world_service(mut self, world: Arc<dyn WorldService>) -> Self {
        self.world = Some(world);
        self
    }

    pub fn with_command_registry(mut self, commands: Arc<dyn CommandRegistry>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn with_access_engine(mut self, access: Arc<dyn AccessEngine>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_properties(mut self, properties: PropertyRegistry) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Install the catalog into `runtime` on behalf of `plugin`.
    pub fn register<R>(&self, runtime: &mut R, plugin: &str)
    where
        R: GuestRuntime + ?Sized,
    {
        let host = Arc::new(self.clone());
        let mut module = HostModule::new();
        for op in OPERATIONS {
            module.insert(op.name, wrap(Arc::clone(&host), plugin, op));
        }
        runtime.set_global(&self.namespace, module);

        debug!(
            plugin = %plugin,
            namespace = %self.namespace,
            functions = OPERATIONS.len(),
            "Registered host functions"
        );
    }

    async fn dispatch(&self, handler: Handler, frame: &CallFrame) -> HostResult {
        match handler {
            Handler::Log => log(frame),
            Handler::NewRequestId => Ok(HostReturn::Value(Value::String(
                Ulid::new().to_string(),
            ))),
            Handler::KvGet => self.kv_get(frame).await,
            Handler::KvSet => self.kv_set(frame).await,
            Handler::KvDelete => self.kv_delete(frame).await,
            Handler::QueryLocation => self.query_location(frame).await,
            Handler::QueryCharacter => self.query_character(frame).await,
            Handler::QueryLocationCharacters => self.query_location_characters(frame).await,
            Handler::QueryObject => self.query_object(frame).await,
            Handler::CreateLocation => self.create_location(frame).await,
            Handler::CreateExit => self.create_exit(frame).await,
            Handler::CreateObject => self.create_object(frame).await,
            Handler::FindLocation => self.find_location(frame).await,
            Handler::GetProperty => self.get_property(frame).await,
            Handler::SetProperty => self.set_property(frame).await,
            Handler::ListCommands => self.list_commands(frame).await,
            Handler::GetCommandHelp => self.get_command_help(frame),
        }
    }

    fn deadline(&self, frame: &CallFrame) -> Instant {
        effective_deadline(frame.caller_deadline(), self.query_timeout)
    }

    /// Sanitized `(nil, message)` for a failed collaborator call.
    fn failure(
        &self,
        frame: &CallFrame,
        entity_type: &str,
        target: &str,
        err: &HostError,
    ) -> HostReturn {
        let site = ErrorSite {
            plugin: &frame.plugin,
            operation: frame.function,
            entity_type,
            target,
        };
        HostReturn::Error(sanitize_error(site, err))
    }

    // ========================================================================
    // Key-value storage
    // ========================================================================

    async fn kv_get(&self, frame: &CallFrame) -> HostResult {
        let key = frame.check_string(1)?;
        let Some(kv) = &self.kv else {
            return Ok(HostReturn::error(KV_UNAVAILABLE));
        };

        match run_until(self.deadline(frame), kv.get(&frame.plugin, key)).await {
            Ok(Some(bytes)) => Ok(HostReturn::Value(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))),
            Ok(None) => Ok(HostReturn::Value(Value::Null)),
            Err(e) => Ok(self.failure(frame, "kv", key, &e)),
        }
    }

    async fn kv_set(&self, frame: &CallFrame) -> HostResult {
        let key = frame.check_string(1)?;
        let value = frame.check_string(2)?;
        let Some(kv) = &self.kv else {
            return Ok(HostReturn::error(KV_UNAVAILABLE));
        };

        match run_until(self.deadline(frame), kv.set(&frame.plugin, key, value.as_bytes())).await {
            Ok(()) => Ok(HostReturn::Value(Value::Bool(true))),
            Err(e) => Ok(self.failure(frame, "kv", key, &e)),
        }
    }

    async fn kv_delete(&self, frame: &CallFrame) -> HostResult {
        let key = frame.check_string(1)?;
        let Some(kv) = &self.kv else {
            return Ok(HostReturn::error(KV_UNAVAILABLE));
        };

        match run_until(self.deadline(frame), kv.delete(&frame.plugin, key)).await {
            Ok(()) => Ok(HostReturn::Value(Value::Bool(true))),
            Err(e) => Ok(self.failure(frame, "kv", key, &e)),
        }
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("namespace", &self.namespace)
            .field("query_timeout", &self.query_timeout)
            .field("kv", &self.kv.is_some())
            .field("world", &self.world.is_some())
            .field("commands", &self.commands.is_some())
            .field("access", &self.access.is_some())
            .finish()
    }
}

/// Bind `op` for `plugin` behind its capability check.
fn wrap(host: Arc<Functions>, plugin: &str, op: &'static Operation) -> HostFunction {
    let plugin = plugin.to_string();
    Arc::new(
        move |args: Vec<GuestValue>, caller_deadline: Option<Instant>| -> BoxFuture<'static, HostResult> {
            let host = Arc::clone(&host);
            let plugin = plugin.clone();
            Box::pin(async move {
                if let Some(capability) = op.capability {
                    if !host.enforcer.check(&plugin, capability) {
                        warn!(
                            plugin = %plugin,
                            capability = %capability,
                            function = %op.name,
                            "Capability denied"
                        );
                        return Err(GuestError::CapabilityDenied {
                            plugin,
                            capability: capability.to_string(),
                        });
                    }
                }

                let frame = CallFrame::new(plugin, op.name, args, caller_deadline);
                host.dispatch(op.handler, &frame).await
            })
        },
    )
}

fn log(frame: &CallFrame) -> HostResult {
    let level = frame.check_string(1)?;
    let message = frame.check_string(2)?;
    let plugin = frame.plugin.as_str();

    match level {
        "debug" => debug!(plugin = %plugin, "{}", message),
        "info" => info!(plugin = %plugin, "{}", message),
        "warn" => warn!(plugin = %plugin, "{}", message),
        "error" => error!(plugin = %plugin, "{}", message),
        other => {
            return Err(frame.bad_argument(
                1,
                format!("invalid log level '{other}' (expected debug, info, warn or error)"),
            ))
        }
    }
    Ok(HostReturn::Value(Value::Null))
}
