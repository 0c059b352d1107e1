use super::EngineError;
use crate::models::{SkippedItem, TableExport};
use crate::remote::{ProjectSession, RemoteError};

/// Read every configured table, in order, skipping the ones that fail
///
/// A table that is missing or denied is left out of the export and reported
/// as skipped. The run only fails when no table could be read and every
/// failure says the project itself is unreachable (bad URL, bad key, network).
pub async fn export_tables(
    session: &dyn ProjectSession,
    tables: &[String],
) -> Result<(TableExport, Vec<SkippedItem>), EngineError> {
    let mut export = TableExport::new();
    let mut skipped = Vec::new();
    let mut first_unreachable: Option<RemoteError> = None;
    let mut all_unreachable = true;

    for table in tables {
        match session.select_all(table).await {
            Ok(rows) => {
                tracing::debug!("Exported {} rows from {}", rows.len(), table);
                export.insert(table.clone(), rows);
                all_unreachable = false;
            }
            Err(e) => {
                tracing::warn!("Skipping table {}: {}", table, e);
                skipped.push(SkippedItem::Table {
                    name: table.clone(),
                    reason: e.to_string(),
                });

                if e.is_unreachable() {
                    first_unreachable.get_or_insert(e);
                } else {
                    all_unreachable = false;
                }
            }
        }
    }

    if all_unreachable {
        if let Some(e) = first_unreachable {
            return Err(EngineError::Unreachable(e));
        }
    }

    tracing::info!(
        "Exported {}/{} tables ({} skipped)",
        export.len(),
        tables.len(),
        skipped.len()
    );

    Ok((export, skipped))
}
