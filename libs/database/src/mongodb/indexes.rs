//! Idempotent index initialization.
//!
//! Creating an index that already exists with the same keys and options is a
//! no-op on the server. An existing index with the same name but different
//! keys or options is reported as a conflict; that case counts as "already
//! satisfied" so a backend can still start. Anything else is a real failure.

use mongodb::{error::ErrorKind, Collection, IndexModel};
use tracing::{debug, warn};

use crate::common::{DatabaseError, DatabaseResult};

/// Server error codes meaning an equivalent or clashing index is already present.
const INDEX_ALREADY_EXISTS: i32 = 68;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;

/// Outcome of [`ensure_indexes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Indexes created now or already present with identical definitions
    pub ensured: Vec<String>,
    /// Indexes skipped because a conflicting definition already exists
    pub already_satisfied: Vec<String>,
}

impl IndexReport {
    pub fn total(&self) -> usize {
        self.ensured.len() + self.already_satisfied.len()
    }
}

/// Create each index one at a time, tolerating ones that already exist.
///
/// Returns an error only for failures that are not index conflicts (network,
/// authorization, invalid key pattern).
pub async fn ensure_indexes<T>(
    collection: &Collection<T>,
    indexes: Vec<IndexModel>,
) -> DatabaseResult<IndexReport>
where
    T: Send + Sync,
{
    let mut report = IndexReport::default();

    for index in indexes {
        let name = index_name(&index);

        match collection.create_index(index).await {
            Ok(created) => {
                debug!(collection = collection.name(), index = %created.index_name, "Index ensured");
                report.ensured.push(created.index_name);
            }
            Err(err) if is_already_satisfied(&err) => {
                warn!(
                    collection = collection.name(),
                    index = %name,
                    error = %err,
                    "Index already exists with a different definition, keeping existing index"
                );
                report.already_satisfied.push(name);
            }
            Err(err) => {
                return Err(DatabaseError::IndexCreation {
                    index: name,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn index_name(index: &IndexModel) -> String {
    index
        .options
        .as_ref()
        .and_then(|options| options.name.clone())
        .unwrap_or_else(|| {
            index
                .keys
                .iter()
                .map(|(key, value)| format!("{}_{}", key, value))
                .collect::<Vec<_>>()
                .join("_")
        })
}

/// Whether a driver error means the index is effectively already in place.
pub fn is_already_satisfied(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => is_conflict_code(command_error.code),
        _ => false,
    }
}

fn is_conflict_code(code: i32) -> bool {
    matches!(
        code,
        INDEX_ALREADY_EXISTS | INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT
    )
}
