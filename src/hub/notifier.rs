//! Deferred follow-up broadcast tasks.
//!
//! Both sequences are fire-once tasks with no cancellation handle: once
//! scheduled they run to completion, and a broadcast that finds zero
//! connections is a silent no-op.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use super::registry::ConnectionRegistry;
use crate::commands::CommandDescriptor;
use crate::rpc::message::{Notification, Outbound, RequestId, Response};

/// Method name of the tools list-changed notification.
pub const LIST_CHANGED_METHOD: &str = "notifications/tools/list_changed";

// Correlation ids used by the direct-list compatibility sequence: a
// reserved value no client should be using, and the id clients that number
// their requests from `initialize` onward commonly assign to `tools/list`.
const RESERVED_RESPONSE_ID: i64 = 0;
const LIKELY_CLIENT_REQUEST_ID: i64 = 2;

fn list_changed() -> Outbound {
    Outbound::Notification(Notification::new(LIST_CHANGED_METHOD, None))
}

/// After `delay`, broadcast a single tools list-changed notification.
pub fn spawn_list_changed(registry: Arc<ConnectionRegistry>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(delay).await;
        let delivered = registry.broadcast(&list_changed());
        info!(delivered, "tools list-changed notification broadcast");
    })
}

/// After `delay`, broadcast the list-changed notification, wait
/// `followup_delay`, then broadcast two response-shaped frames carrying the
/// full command list under pre-chosen correlation ids.
///
/// This is intentional best-effort compatibility for clients that never
/// issue a proper `tools/list` request, not a protocol requirement. It can
/// be disabled via the `aggressive_direct_list` config flag.
pub fn spawn_direct_list(
    registry: Arc<ConnectionRegistry>,
    descriptors: Vec<CommandDescriptor>,
    delay: Duration,
    followup_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(delay).await;
        let delivered = registry.broadcast(&list_changed());
        info!(delivered, "direct-list sequence: list-changed broadcast");

        sleep(followup_delay).await;
        let result = json!({ "tools": descriptors });
        for id in [RESERVED_RESPONSE_ID, LIKELY_CLIENT_REQUEST_ID] {
            let response = Response::success(Some(RequestId::Number(id)), result.clone());
            let delivered = registry.broadcast(&Outbound::Response(response));
            debug!(correlation = id, delivered, "direct tools list broadcast");
        }
    })
}
