//! Genealogy tree reconstruction
//!
//! Builds the split-lineage tree for a scanned batch from the bulk fetch
//! of every batch sharing its product. The walk is an explicit iterative
//! traversal over an adjacency map with a visited set and a depth bound:
//! lineage is a forest by invariant, but a cycle smuggled into the data
//! must terminate the walk, not hang it.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Batch, BatchStatus};

/// Hard bound on lineage depth; deeper chains are cut off
pub const MAX_LINEAGE_DEPTH: usize = 64;

/// One node of the genealogy tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchNode {
    pub id: Uuid,
    pub batch_code: String,
    pub status: BatchStatus,
    pub initial_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub quantity_unit: String,
    pub harvest_date: Option<NaiveDate>,
    /// Marks the batch the consumer scanned
    pub is_scanned: bool,
    pub children: Vec<BatchNode>,
}

/// Genealogy of a scanned batch: the whole tree from its root ancestor
/// down, plus the scanned batch's immediate parentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genealogy {
    pub is_root: bool,
    pub parent_batch_code: Option<String>,
    pub tree: BatchNode,
}

fn leaf_node(batch: &Batch, scanned_id: Uuid) -> BatchNode {
    BatchNode {
        id: batch.id,
        batch_code: batch.batch_code.clone(),
        status: batch.status,
        initial_quantity: batch.initial_quantity,
        remaining_quantity: batch.remaining_quantity,
        quantity_unit: batch.quantity_unit.clone(),
        harvest_date: batch.harvest_date,
        is_scanned: batch.id == scanned_id,
        children: Vec::new(),
    }
}

/// Walk parent pointers from the scanned batch to its root ancestor.
/// Stops at a missing parent row or a revisited node.
fn find_root(index: &HashMap<Uuid, &Batch>, scanned_id: Uuid) -> Uuid {
    let mut current = scanned_id;
    let mut visited = HashSet::from([scanned_id]);
    for _ in 0..MAX_LINEAGE_DEPTH {
        let Some(batch) = index.get(&current) else {
            break;
        };
        match batch.parent_batch_id {
            Some(parent) if index.contains_key(&parent) && visited.insert(parent) => {
                current = parent;
            }
            _ => break,
        }
    }
    current
}

/// Build the genealogy for `scanned_id` from every batch of its product.
pub fn build_genealogy(batches: &[Batch], scanned_id: Uuid) -> CoreResult<Genealogy> {
    let index: HashMap<Uuid, &Batch> = batches.iter().map(|b| (b.id, b)).collect();
    let scanned = index
        .get(&scanned_id)
        .ok_or_else(|| CoreError::not_found("Batch not found in lineage"))?;

    let mut children_of: HashMap<Uuid, Vec<&Batch>> = HashMap::new();
    for batch in batches {
        if let Some(parent) = batch.parent_batch_id {
            children_of.entry(parent).or_default().push(batch);
        }
    }
    for siblings in children_of.values_mut() {
        siblings.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.batch_code.cmp(&b.batch_code))
        });
    }

    let root_id = find_root(&index, scanned_id);

    // Breadth-first discovery, bounded by depth and a visited set
    let mut order: Vec<Uuid> = vec![root_id];
    let mut depth_of: HashMap<Uuid, usize> = HashMap::from([(root_id, 0)]);
    let mut visited: HashSet<Uuid> = HashSet::from([root_id]);
    let mut i = 0;
    while i < order.len() {
        let id = order[i];
        i += 1;
        let depth = depth_of[&id];
        if depth >= MAX_LINEAGE_DEPTH {
            continue;
        }
        if let Some(children) = children_of.get(&id) {
            for child in children {
                if visited.insert(child.id) {
                    depth_of.insert(child.id, depth + 1);
                    order.push(child.id);
                }
            }
        }
    }

    // Assemble bottom-up: reverse discovery order guarantees every node's
    // children are attached before the node itself moves into its parent.
    let mut nodes: HashMap<Uuid, BatchNode> = order
        .iter()
        .map(|id| (*id, leaf_node(index[id], scanned_id)))
        .collect();
    for id in order.iter().rev() {
        if *id == root_id {
            continue;
        }
        let node = nodes.remove(id).expect("node assembled exactly once");
        let parent = index[id]
            .parent_batch_id
            .expect("non-root node has a parent");
        if let Some(parent_node) = nodes.get_mut(&parent) {
            parent_node.children.push(node);
        }
    }
    let tree = nodes.remove(&root_id).expect("root node present");

    let parent_batch_code = scanned
        .parent_batch_id
        .and_then(|p| index.get(&p))
        .map(|b| b.batch_code.clone());

    Ok(Genealogy {
        is_root: scanned.parent_batch_id.is_none(),
        parent_batch_code,
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn batch(code: &str, parent: Option<Uuid>, offset_secs: i64) -> Batch {
        Batch {
            id: Uuid::new_v4(),
            batch_code: code.into(),
            product_id: Uuid::new_v4(),
            parent_batch_id: parent,
            current_owner_id: Uuid::new_v4(),
            status: BatchStatus::Harvested,
            initial_quantity: Decimal::from(100),
            remaining_quantity: Decimal::from(100),
            quantity_unit: "kg".into(),
            price_per_unit: None,
            final_price: None,
            harvest_date: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn two_generation_chain_preserves_parent_child_order() {
        let root = batch("AGB-ROOT", None, 0);
        let mid = batch("AGB-MID", Some(root.id), 1);
        let leaf = batch("AGB-LEAF", Some(mid.id), 2);
        let all = vec![root.clone(), mid.clone(), leaf.clone()];

        let genealogy = build_genealogy(&all, leaf.id).unwrap();
        assert!(!genealogy.is_root);
        assert_eq!(genealogy.parent_batch_code.as_deref(), Some("AGB-MID"));
        assert_eq!(genealogy.tree.batch_code, "AGB-ROOT");
        assert_eq!(genealogy.tree.children.len(), 1);
        assert_eq!(genealogy.tree.children[0].batch_code, "AGB-MID");
        assert_eq!(genealogy.tree.children[0].children[0].batch_code, "AGB-LEAF");
        assert!(genealogy.tree.children[0].children[0].is_scanned);
    }

    #[test]
    fn scanning_the_root_includes_all_descendants() {
        let root = batch("AGB-ROOT", None, 0);
        let a = batch("AGB-A", Some(root.id), 1);
        let b = batch("AGB-B", Some(root.id), 2);
        let all = vec![root.clone(), a, b];

        let genealogy = build_genealogy(&all, root.id).unwrap();
        assert!(genealogy.is_root);
        assert_eq!(genealogy.parent_batch_code, None);
        assert!(genealogy.tree.is_scanned);
        let codes: Vec<&str> = genealogy
            .tree
            .children
            .iter()
            .map(|c| c.batch_code.as_str())
            .collect();
        assert_eq!(codes, vec!["AGB-A", "AGB-B"]);
    }

    #[test]
    fn sibling_subtrees_are_visible_from_a_leaf() {
        let root = batch("AGB-ROOT", None, 0);
        let a = batch("AGB-A", Some(root.id), 1);
        let b = batch("AGB-B", Some(root.id), 2);
        let all = vec![root, a.clone(), b];

        let genealogy = build_genealogy(&all, a.id).unwrap();
        assert_eq!(genealogy.tree.children.len(), 2);
    }

    #[test]
    fn cyclic_lineage_terminates() {
        // a -> b -> a, malformed on purpose
        let mut a = batch("AGB-CYC-A", None, 0);
        let b = batch("AGB-CYC-B", Some(a.id), 1);
        a.parent_batch_id = Some(b.id);
        let all = vec![a.clone(), b];

        let genealogy = build_genealogy(&all, a.id).unwrap();
        // The walk terminates and yields a tree containing both nodes
        assert_eq!(genealogy.tree.children.len(), 1);
    }

    #[test]
    fn missing_scanned_batch_is_not_found() {
        let err = build_genealogy(&[], Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
