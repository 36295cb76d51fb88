//! Bulk release lookups used by the summary serializer

use tracing::debug;

use crate::error::StoreResult;
use crate::models::project::Project;
use crate::models::release::Release;
use crate::store::Store;

/// Fetches the latest release of each project in one store call
///
/// Projects without releases contribute nothing, so the result may be
/// shorter than the input. Order of the result is unspecified. The latest
/// release is the one with the greatest `date_added`; equal timestamps are
/// broken by the greater release id.
///
/// # Errors
///
/// Propagates store errors.
///
/// # Example
///
/// ```
/// use lookout_shared::serializers::bulk_fetch_project_latest_releases;
/// use lookout_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// assert!(bulk_fetch_project_latest_releases(&store, &[]).await?.is_empty());
/// # Ok(())
/// # }
/// ```
pub async fn bulk_fetch_project_latest_releases(
    store: &dyn Store,
    projects: &[Project],
) -> StoreResult<Vec<Release>> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let mut project_ids: Vec<_> = projects.iter().map(|project| project.id).collect();
    project_ids.sort_unstable();
    project_ids.dedup();

    let releases = store.latest_releases(&project_ids).await?;

    debug!(
        projects = project_ids.len(),
        releases = releases.len(),
        "Fetched latest releases"
    );

    Ok(releases)
}
