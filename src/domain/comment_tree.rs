//! Rewrites of comment forests addressed by comment id.
//!
//! Every optimistic comment mutation (vote, reply, edit, delete, placeholder
//! replacement) goes through [`rewrite_tree`]. The input forest is never
//! mutated; untouched subtrees are copied as-is.

use crate::domain::entities::Comment;
use crate::domain::value_objects::{CommentId, LocalId};

type Transform = Box<dyn FnOnce(Comment) -> Comment + Send>;

pub enum TreeOp {
    /// Replace the matched node with the result of the transform.
    Update(Transform),
    /// Drop the matched node together with its replies.
    Remove,
    /// Prepend a reply to the matched node's children.
    InsertChild(Comment),
}

impl TreeOp {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(Comment) -> Comment + Send + 'static,
    {
        TreeOp::Update(Box::new(f))
    }
}

impl std::fmt::Debug for TreeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeOp::Update(_) => write!(f, "Update(..)"),
            TreeOp::Remove => write!(f, "Remove"),
            TreeOp::InsertChild(child) => write!(f, "InsertChild({})", child.id),
        }
    }
}

/// Applies `op` to the node with id `target`, returning the rewritten forest.
///
/// An unknown `target` yields an unchanged copy.
pub fn rewrite_tree(nodes: &[Comment], target: &CommentId, op: TreeOp) -> Vec<Comment> {
    let mut rewritten = nodes.to_vec();
    apply_in_place(&mut rewritten, target, op);
    rewritten
}

// Returns the operation back when nothing matched so siblings can try it.
fn apply_in_place(nodes: &mut Vec<Comment>, target: &CommentId, op: TreeOp) -> Option<TreeOp> {
    if let Some(index) = nodes.iter().position(|node| &node.id == target) {
        match op {
            TreeOp::Update(transform) => {
                let node = nodes.remove(index);
                nodes.insert(index, transform(node));
            }
            TreeOp::Remove => {
                nodes.remove(index);
            }
            TreeOp::InsertChild(child) => {
                nodes[index].children.insert(0, child);
            }
        }
        return None;
    }

    let mut pending = op;
    for node in nodes.iter_mut() {
        if node.children.is_empty() {
            continue;
        }
        match apply_in_place(&mut node.children, target, pending) {
            None => return None,
            Some(op) => pending = op,
        }
    }
    Some(pending)
}

/// Adds a top-level comment in front of the existing ones.
pub fn prepend_root(nodes: &[Comment], comment: Comment) -> Vec<Comment> {
    let mut rewritten = Vec::with_capacity(nodes.len() + 1);
    rewritten.push(comment);
    rewritten.extend_from_slice(nodes);
    rewritten
}

/// Swaps the placeholder created for `local_id` for the committed comment.
///
/// The committed node keeps any replies that were attached to the
/// placeholder in the meantime.
pub fn replace_placeholder(nodes: &[Comment], local_id: LocalId, committed: Comment) -> Vec<Comment> {
    rewrite_tree(
        nodes,
        &CommentId::Pending(local_id),
        TreeOp::update(move |placeholder| {
            let mut committed = committed;
            if committed.children.is_empty() {
                committed.children = placeholder.children;
            }
            committed
        }),
    )
}

pub fn find<'a>(nodes: &'a [Comment], target: &CommentId) -> Option<&'a Comment> {
    for node in nodes {
        if &node.id == target {
            return Some(node);
        }
        if let Some(found) = find(&node.children, target) {
            return Some(found);
        }
    }
    None
}

pub fn contains(nodes: &[Comment], target: &CommentId) -> bool {
    find(nodes, target).is_some()
}

/// Number of comments in the forest, replies included.
pub fn count(nodes: &[Comment]) -> usize {
    nodes.iter().map(|node| 1 + count(&node.children)).sum()
}
