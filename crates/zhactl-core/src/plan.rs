// ── Update planner / applier ──
//
// Planning diffs desired device names against the registry and is pure.
// Applying issues one registry update per planned change, in order, and
// stops at the first failure. Nothing is rolled back.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{debug, info};

use zhactl_api::RpcClient;

use crate::error::CoreError;
use crate::join::JoinIndex;
use crate::model::{IeeeAddress, RegistryId, RegistryRecord};

/// Desired-name placeholder meaning "leave this device alone".
pub const PLACEHOLDER_NAME: &str = "-";

/// One desired rename, keyed by hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub ieee: IeeeAddress,
    pub name: String,
}

impl ChangeRequest {
    pub fn new(ieee: impl Into<IeeeAddress>, name: impl Into<String>) -> Self {
        Self {
            ieee: ieee.into(),
            name: name.into(),
        }
    }
}

/// A rename that will be sent to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub registry_id: RegistryId,
    pub ieee: IeeeAddress,
    /// Current user-assigned name (`None` if unset).
    pub old_name: Option<String>,
    pub new_name: String,
}

/// Why a request did not become a change. Checked in declaration order;
/// the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    NoAddress,
    Coordinator,
    EmptyName,
    NotFound,
    Unchanged,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::NoAddress => "no ieee in row",
            Self::Coordinator => "coordinator",
            Self::EmptyName => "empty or '-'",
            Self::NotFound => "not found / ghost",
            Self::Unchanged => "same as current",
        }
    }
}

/// Per-reason skip counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    pub no_address: usize,
    pub coordinator: usize,
    pub empty_name: usize,
    pub not_found: usize,
    pub unchanged: usize,
}

impl SkipStats {
    fn slot(&mut self, reason: SkipReason) -> &mut usize {
        match reason {
            SkipReason::NoAddress => &mut self.no_address,
            SkipReason::Coordinator => &mut self.coordinator,
            SkipReason::EmptyName => &mut self.empty_name,
            SkipReason::NotFound => &mut self.not_found,
            SkipReason::Unchanged => &mut self.unchanged,
        }
    }

    pub fn count(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::NoAddress => self.no_address,
            SkipReason::Coordinator => self.coordinator,
            SkipReason::EmptyName => self.empty_name,
            SkipReason::NotFound => self.not_found,
            SkipReason::Unchanged => self.unchanged,
        }
    }

    pub fn total(&self) -> usize {
        SkipReason::iter().map(|r| self.count(r)).sum()
    }

    /// `(reason, count)` for every reason, in check order.
    pub fn breakdown(&self) -> Vec<(SkipReason, usize)> {
        SkipReason::iter().map(|r| (r, self.count(r))).collect()
    }
}

/// Planner output: the changes to make and the tally of everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
    pub skipped: SkipStats,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A change the hub accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    #[serde(flatten)]
    pub change: PlannedChange,
    /// `name_by_user` as echoed back by the hub.
    pub confirmed_name: Option<String>,
}

/// Same record the device views show: the topology device's own
/// resolution, then the address index for devices not in the topology.
fn lookup<'a>(index: &JoinIndex<'a>, ieee: &IeeeAddress) -> Option<&'a RegistryRecord> {
    index
        .device_by_ieee(ieee)
        .and_then(|device| index.resolve(device))
        .or_else(|| index.record_by_ieee(ieee))
}

fn classify(
    request: &ChangeRequest,
    index: &JoinIndex<'_>,
    coordinator: Option<&IeeeAddress>,
) -> Result<PlannedChange, SkipReason> {
    if request.ieee.is_empty() {
        return Err(SkipReason::NoAddress);
    }
    if coordinator == Some(&request.ieee) {
        return Err(SkipReason::Coordinator);
    }
    let name = request.name.trim();
    if name.is_empty() || name == PLACEHOLDER_NAME {
        return Err(SkipReason::EmptyName);
    }
    let record = lookup(index, &request.ieee).ok_or(SkipReason::NotFound)?;
    if record.name_by_user.as_deref() == Some(name) {
        return Err(SkipReason::Unchanged);
    }
    Ok(PlannedChange {
        registry_id: record.id.clone(),
        ieee: request.ieee.clone(),
        old_name: record.name_by_user.clone(),
        new_name: name.to_owned(),
    })
}

/// Diff `requests` against the registry.
///
/// `coordinator` is the address that must never be renamed (see
/// [`JoinIndex::coordinator`]). Each request ends up either as a
/// [`PlannedChange`] or in exactly one [`SkipStats`] counter.
pub fn plan(
    requests: &[ChangeRequest],
    index: &JoinIndex<'_>,
    coordinator: Option<&IeeeAddress>,
) -> Plan {
    let mut result = Plan::default();
    for request in requests {
        match classify(request, index, coordinator) {
            Ok(change) => result.changes.push(change),
            Err(reason) => {
                debug!(ieee = %request.ieee, %reason, "Skipping change request");
                *result.skipped.slot(reason) += 1;
            }
        }
    }
    info!(
        planned = result.changes.len(),
        skipped = result.skipped.total(),
        "Plan ready"
    );
    result
}

/// Apply `changes` in order, one registry update each.
///
/// Not transactional: on failure, changes before the failing one stay
/// applied and are returned inside [`CoreError::ApplyFailed`] together with
/// the failing index; later changes are not attempted.
pub async fn apply(
    rpc: &mut RpcClient,
    changes: &[PlannedChange],
) -> Result<Vec<AppliedChange>, CoreError> {
    let mut applied = Vec::with_capacity(changes.len());
    for (index, change) in changes.iter().enumerate() {
        match rpc
            .update_device_registry(change.registry_id.as_str(), Some(change.new_name.as_str()))
            .await
        {
            Ok(entry) => {
                info!(
                    device = %change.registry_id,
                    ieee = %change.ieee,
                    name = %change.new_name,
                    "Renamed device"
                );
                applied.push(AppliedChange {
                    change: change.clone(),
                    confirmed_name: entry.name_by_user,
                });
            }
            Err(e) => {
                return Err(CoreError::ApplyFailed {
                    index,
                    applied,
                    source: Box::new(e.into()),
                });
            }
        }
    }
    Ok(applied)
}
