//! Door and lift access group listings.

use bisace_core::{messages, AccessGroup, AccessGroupKind, BisResult, ErrorType};
use bisace_engine::{AccessGroupRecord, EngineResultExt, EngineSession, GroupKind};

use super::Outcome;

fn engine_kind(kind: AccessGroupKind) -> GroupKind {
    match kind {
        AccessGroupKind::Door => GroupKind::Door,
        AccessGroupKind::Lift => GroupKind::Lift,
    }
}

fn to_wire(record: AccessGroupRecord) -> AccessGroup {
    AccessGroup {
        group_id: record.group_id,
        name: record.name,
        description: record.description,
        kind: match record.kind {
            GroupKind::Door => AccessGroupKind::Door,
            GroupKind::Lift => AccessGroupKind::Lift,
        },
    }
}

/// All access groups of one kind, sorted by name.
pub async fn list_access_groups(
    session: &dyn EngineSession,
    kind: AccessGroupKind,
) -> Outcome<Vec<AccessGroup>> {
    match session.list_access_groups(engine_kind(kind)).await.vendor()? {
        Ok(records) => {
            let mut groups: Vec<AccessGroup> = records.into_iter().map(to_wire).collect();
            groups.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(BisResult::success(groups))
        }
        Err(code) => {
            tracing::error!(%kind, ?code, "access group listing refused");
            Ok(BisResult::failure(ErrorType::Other, messages::BIS_API_CALL_FAILED))
        }
    }
}
