#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ModelError;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a group, conversion or condition inside a rule tree.
///
/// Ids are handed out once per constructed node and are never serialized.
/// Two nodes with identical content still have distinct ids, which is what
/// removal and stale-callback detection key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Server-assigned mapping identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MappingId(i64);

impl MappingId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MappingId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ModelError::InvalidMappingId(s.to_string()))
    }
}

impl From<i64> for MappingId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A rule node that lives in an ordered, identity-addressed list.
pub trait Node {
    fn id(&self) -> NodeId;
}

/// Position of the node with `id`, compared by identity only.
pub fn position_of<T: Node>(items: &[T], id: NodeId) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Inserts `item` right after the node `after`.
///
/// Without a reference node, or when the reference is no longer in the list,
/// the item is appended. Returns the index the item landed at.
pub(crate) fn insert_after<T: Node>(items: &mut Vec<T>, after: Option<NodeId>, item: T) -> usize {
    let index = after
        .and_then(|id| position_of(items, id))
        .map_or(items.len(), |found| found + 1);
    items.insert(index, item);
    index
}

pub(crate) fn remove_node<T: Node>(items: &mut Vec<T>, id: NodeId) -> Option<T> {
    position_of(items, id).map(|index| items.remove(index))
}
