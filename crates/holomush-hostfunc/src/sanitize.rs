//! Turning handler failures into messages safe to show guest code.
//!
//! Timeouts, missing entities and authorization failures get fixed
//! messages. Anything else is logged in full with a fresh correlation ID,
//! and the guest only sees `internal error (ref: <id>)`.

use crate::error::{Classify, ErrorClass, HostError};
use tracing::{error, warn};
use ulid::Ulid;

pub const TIMEOUT_MESSAGE: &str = "operation timed out";
pub const NOT_FOUND_MESSAGE: &str = "not found";
pub const ACCESS_DENIED_MESSAGE: &str = "access denied";

/// Where a failure happened, for the server-side log line.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSite<'a> {
    pub plugin: &'a str,
    pub operation: &'a str,
    pub entity_type: &'a str,
    pub target: &'a str,
}

/// Log `err` and return the message guest code may see.
pub fn sanitize_error(site: ErrorSite<'_>, err: &HostError) -> String {
    let message = match err.class() {
        ErrorClass::Timeout => TIMEOUT_MESSAGE,
        ErrorClass::NotFound => NOT_FOUND_MESSAGE,
        ErrorClass::AccessDenied => ACCESS_DENIED_MESSAGE,
        ErrorClass::Internal => return internal_error(site, err),
    };

    warn!(
        plugin = %site.plugin,
        operation = %site.operation,
        entity_type = %site.entity_type,
        target = %site.target,
        error = %err,
        "Plugin host call failed"
    );
    message.to_string()
}

fn internal_error(site: ErrorSite<'_>, err: &HostError) -> String {
    let error_id = Ulid::new().to_string();
    error!(
        error_id = %error_id,
        plugin = %site.plugin,
        operation = %site.operation,
        entity_type = %site.entity_type,
        target = %site.target,
        error = %err,
        "Internal error in plugin host call"
    );
    format!("internal error (ref: {error_id})")
}
