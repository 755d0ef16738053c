//! Hierarchy depth recomputation.

use std::collections::{BTreeMap, HashMap, VecDeque};

use arbor_persistence::core::AssetTransaction;
use arbor_persistence::types::HierarchyLink;
use arbor_persistence::StorageResult;
use uuid::Uuid;

/// Computes the depth of every asset in `links`.
///
/// Roots are level 0 and every child sits one below its parent. Assets not
/// reachable from a root (dangling parent pointers) are level 0.
pub fn compute_levels(links: &[HierarchyLink]) -> HashMap<Uuid, i32> {
    let mut children: HashMap<Option<Uuid>, Vec<Uuid>> = HashMap::new();
    for link in links {
        children
            .entry(link.parent_internal_id)
            .or_default()
            .push(link.internal_id);
    }

    let mut levels: HashMap<Uuid, i32> = HashMap::with_capacity(links.len());
    let mut queue: VecDeque<(Uuid, i32)> = children
        .get(&None)
        .into_iter()
        .flatten()
        .map(|&root| (root, 0))
        .collect();

    while let Some((node, level)) = queue.pop_front() {
        if levels.contains_key(&node) {
            continue;
        }
        levels.insert(node, level);

        if let Some(kids) = children.get(&Some(node)) {
            queue.extend(kids.iter().map(|&kid| (kid, level + 1)));
        }
    }

    for link in links {
        levels.entry(link.internal_id).or_insert(0);
    }

    levels
}

/// Recomputes and persists the level of every asset of the tenant.
///
/// Issues one batched update per distinct level. Returns the number of
/// rows written.
pub async fn recalculate_levels<T>(tx: &mut T) -> StorageResult<usize>
where
    T: AssetTransaction + ?Sized,
{
    let links = tx.find_hierarchy_links().await?;
    let levels = compute_levels(&links);

    let mut by_level: BTreeMap<i32, Vec<Uuid>> = BTreeMap::new();
    for (id, level) in levels {
        by_level.entry(level).or_default().push(id);
    }

    let depth = by_level.keys().next_back().copied().unwrap_or(0);
    let mut written = 0;
    for (level, ids) in &by_level {
        written += tx.update_levels(*level, ids).await?;
    }

    tracing::debug!(
        tenant = %tx.tenant(),
        assets = links.len(),
        depth,
        "Recalculated hierarchy levels"
    );

    Ok(written)
}
