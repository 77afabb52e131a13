// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deep copy of a subtree.

use hashbrown::HashMap;

use super::Scene;
use crate::error::Result;
use crate::types::{NodeId, NodeProps, VisualId};
use crate::visual::Content;

/// Remapping tables built while cloning.
///
/// A visual shared by several nodes inside the cloned subtree is duplicated
/// once and the copies share the duplicate. Reusing one context across
/// several [`Scene::clone_subtree_with`] calls extends that sharing across
/// the calls.
#[derive(Debug, Default)]
pub struct CloneContext {
    nodes: HashMap<NodeId, NodeId>,
    visuals: HashMap<VisualId, VisualId>,
}

impl CloneContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The copy made of `original`, if it was cloned.
    pub fn node(&self, original: NodeId) -> Option<NodeId> {
        self.nodes.get(&original).copied()
    }

    /// The duplicate made of `original`, if it was cloned.
    pub fn visual(&self, original: VisualId) -> Option<VisualId> {
        self.visuals.get(&original).copied()
    }
}

impl Scene {
    /// Deep-copy the subtree at `root` into a new, detached subtree.
    ///
    /// Transforms, flags, fades, decorators, and content are copied. Visuals
    /// are duplicated through [`Visual::clone_visual`](crate::Visual::clone_visual);
    /// cameras embedded as content are shared. Layer registrations and sticky
    /// placement are not carried over.
    pub fn clone_subtree(&mut self, root: NodeId) -> Result<NodeId> {
        self.clone_subtree_with(root, &mut CloneContext::new())
    }

    /// [`clone_subtree`](Self::clone_subtree) with a caller-provided context.
    pub fn clone_subtree_with(&mut self, root: NodeId, cx: &mut CloneContext) -> Result<NodeId> {
        let node = self.node(root)?;
        let props = NodeProps {
            transform: node.transform.as_ref().map(|t| t.affine()),
            fade: node.fade,
            decorator: node.decorator,
            flags: node.flags,
        };
        let (back, front) = (node.back, node.front);
        let children = node.children.clone();

        let copy = self.insert(None, props)?;
        cx.nodes.insert(root, copy);
        if let Some(back) = back {
            let back = self.clone_content(back, cx);
            self.set_content(copy, Some(back))?;
        }
        if let Some(front) = front {
            let front = self.clone_content(front, cx);
            self.set_front_content(copy, Some(front))?;
        }
        for child in children {
            let child = self.clone_subtree_with(child, cx)?;
            self.add_child(copy, child)?;
        }
        Ok(copy)
    }

    fn clone_content(&mut self, content: Content, cx: &mut CloneContext) -> Content {
        let Content::Visual(original) = content else {
            return content;
        };
        if let Some(copy) = cx.visual(original) {
            return Content::Visual(copy);
        }
        let Some(duplicate) = self.visuals.get(original).map(|s| s.visual.clone_visual()) else {
            return content;
        };
        let copy = self.add_visual(duplicate);
        cx.visuals.insert(original, copy);
        Content::Visual(copy)
    }
}
