//! Parent/child adjacency helpers.

use std::collections::{HashMap, HashSet};

use stowage_core::types::FolderId;

use super::model::Folder;

/// Collect the ids of every folder below `parent` (the parent itself excluded).
///
/// Walks the parent→children adjacency built from `folders`. Ids are
/// returned in breadth-first order; a malformed cycle is visited once.
pub fn descendant_folder_ids(folders: &[Folder], parent: FolderId) -> Vec<FolderId> {
    let mut children: HashMap<FolderId, Vec<FolderId>> = HashMap::new();
    for folder in folders {
        if let Some(parent_id) = folder.parent_folder_id {
            children.entry(parent_id).or_default().push(folder.id);
        }
    }

    let mut result = Vec::new();
    let mut seen = HashSet::from([parent]);
    let mut frontier = vec![parent];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for id in frontier {
            for child in children.get(&id).into_iter().flatten() {
                if seen.insert(*child) {
                    result.push(*child);
                    next.push(*child);
                }
            }
        }
        frontier = next;
    }

    result
}
