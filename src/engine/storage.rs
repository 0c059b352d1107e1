use futures::stream::{self, StreamExt};

use crate::models::{ObjectDescriptor, SkippedItem};
use crate::remote::{ProjectSession, RemoteError, StorageEntry};

/// Download the root-level objects of every bucket in the project
///
/// Best effort: a bucket that cannot be listed or an object that cannot be
/// downloaded is recorded as skipped and the rest carry on. Folder
/// placeholders are never downloaded, and nested folders are not walked.
/// Objects come back in listing order even when downloads run in parallel.
pub async fn export_storage(
    session: &dyn ProjectSession,
    concurrency: usize,
) -> (Vec<ObjectDescriptor>, Vec<SkippedItem>) {
    let mut objects = Vec::new();
    let mut skipped = Vec::new();

    let buckets = match session.list_buckets().await {
        Ok(buckets) => buckets,
        Err(e) => {
            tracing::warn!("Could not list storage buckets: {}", e);
            skipped.push(SkippedItem::Storage {
                reason: e.to_string(),
            });
            return (objects, skipped);
        }
    };

    if buckets.is_empty() {
        tracing::info!("Project has no storage buckets");
        return (objects, skipped);
    }

    for bucket in &buckets {
        let entries = match session.list_root_objects(&bucket.name).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping bucket {}: {}", bucket.name, e);
                skipped.push(SkippedItem::Bucket {
                    name: bucket.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let files: Vec<StorageEntry> = entries.into_iter().filter(|e| !e.is_folder()).collect();
        let bucket_name = bucket.name.as_str();

        let results: Vec<(StorageEntry, Result<Vec<u8>, RemoteError>)> = stream::iter(files)
            .map(move |entry| async move {
                let result = session.download_object(bucket_name, &entry.name).await;
                (entry, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        for (entry, result) in results {
            match result {
                Ok(bytes) => objects.push(ObjectDescriptor {
                    bucket: bucket.name.clone(),
                    name: entry.name,
                    bytes,
                }),
                Err(e) => {
                    tracing::warn!("Skipping object {}/{}: {}", bucket.name, entry.name, e);
                    skipped.push(SkippedItem::Object {
                        bucket: bucket.name.clone(),
                        name: entry.name,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        "Staged {} storage object(s) from {} bucket(s)",
        objects.len(),
        buckets.len()
    );

    (objects, skipped)
}
