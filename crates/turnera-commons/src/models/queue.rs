//! Queue read model.

use crate::ids::{QueueId, TenantId};
use serde::{Deserialize, Serialize};

/// A service queue, as read from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: QueueId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Configured average service time per ticket, in seconds. Used as the
    /// fallback when no recent service history exists.
    pub avg_service_seconds: i64,
    pub is_active: bool,
}
