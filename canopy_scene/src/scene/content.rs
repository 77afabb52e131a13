// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual registration and node content slots.

use alloc::boxed::Box;
use smallvec::SmallVec;

use super::Scene;
use crate::error::{Result, SceneError};
use crate::types::{NodeId, VisualId};
use crate::visual::{Content, Visual, VisualSlot, downcast_ref};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Back,
    Front,
}

impl Scene {
    /// Register a visual component.
    pub fn add_visual(&mut self, visual: Box<dyn Visual>) -> VisualId {
        self.visuals.insert(VisualSlot::new(visual))
    }

    /// Register a visual component by value.
    pub fn insert_visual(&mut self, visual: impl Visual) -> VisualId {
        self.add_visual(Box::new(visual))
    }

    /// Unregister a visual, clearing it from every node that shows it.
    pub fn remove_visual(&mut self, id: VisualId) -> Result<Box<dyn Visual>> {
        let owners = self
            .visuals
            .get(id)
            .ok_or(SceneError::StaleVisual(id))?
            .owners
            .clone();
        let content = Some(Content::Visual(id));
        for owner in owners {
            if self.content(owner) == content {
                self.set_slot(owner, Slot::Back, None)?;
            }
            if self.front_content(owner) == content {
                self.set_slot(owner, Slot::Front, None)?;
            }
        }
        let slot = self.visuals.remove(id).ok_or(SceneError::StaleVisual(id))?;
        Ok(slot.visual)
    }

    /// The registered visual.
    pub fn visual(&self, id: VisualId) -> Option<&dyn Visual> {
        self.visuals.get(id).map(|s| s.visual.as_ref())
    }

    /// The registered visual as its concrete type.
    pub fn visual_as<T: Visual>(&self, id: VisualId) -> Option<&T> {
        downcast_ref(self.visual(id)?)
    }

    /// Nodes currently showing the visual.
    pub fn visual_owners(&self, id: VisualId) -> &[NodeId] {
        self.visuals.get(id).map(|s| s.owners.as_slice()).unwrap_or_default()
    }

    /// Owners of the visual, each listed once even when it shows the visual
    /// both behind and in front of its children.
    pub(crate) fn distinct_owners(&self, id: VisualId) -> Result<SmallVec<[NodeId; 2]>> {
        let slot = self.visuals.get(id).ok_or(SceneError::StaleVisual(id))?;
        let mut owners = SmallVec::new();
        for &owner in &slot.owners {
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        Ok(owners)
    }

    /// Mutate a visual and reshape every node that shows it.
    pub fn update_visual<R>(
        &mut self,
        id: VisualId,
        f: impl FnOnce(&mut dyn Visual) -> R,
    ) -> Result<R> {
        let owners = self.distinct_owners(id)?;
        for &owner in &owners {
            self.damage_node(owner);
        }
        let slot = self.visuals.get_mut(id).ok_or(SceneError::StaleVisual(id))?;
        let out = f(slot.visual.as_mut());
        slot.revalidate();
        for &owner in &owners {
            self.update_volatility_upward(owner);
            self.update_bounds_upward(owner);
            self.damage_node(owner);
        }
        Ok(out)
    }

    /// Repaint the visual's area in every node that shows it.
    pub fn repaint_visual(&mut self, id: VisualId) -> Result<()> {
        let slot = self.visuals.get_mut(id).ok_or(SceneError::StaleVisual(id))?;
        let owners = slot.owners.clone();
        if let Some(bounds) = slot.refresh() {
            for owner in owners {
                self.repaint_rect(owner, bounds)?;
            }
        }
        Ok(())
    }

    /// Content drawn beneath the node's children.
    pub fn content(&self, id: NodeId) -> Option<Content> {
        self.nodes.get(id).and_then(|n| n.back)
    }

    /// Content drawn above the node's children.
    pub fn front_content(&self, id: NodeId) -> Option<Content> {
        self.nodes.get(id).and_then(|n| n.front)
    }

    /// Replace the content drawn beneath the node's children.
    pub fn set_content(&mut self, id: NodeId, content: Option<Content>) -> Result<()> {
        self.set_slot(id, Slot::Back, content)
    }

    /// Replace the content drawn above the node's children.
    pub fn set_front_content(&mut self, id: NodeId, content: Option<Content>) -> Result<()> {
        self.set_slot(id, Slot::Front, content)
    }

    fn set_slot(&mut self, id: NodeId, slot: Slot, content: Option<Content>) -> Result<()> {
        self.node(id)?;
        match content {
            Some(Content::Visual(v)) if !self.visuals.contains(v) => {
                return Err(SceneError::StaleVisual(v));
            }
            Some(Content::Camera(c)) if !self.cameras.contains(c) => {
                return Err(SceneError::StaleCamera(c));
            }
            _ => {}
        }
        self.damage_node(id);
        let node = self.node_mut(id)?;
        let old = match slot {
            Slot::Back => core::mem::replace(&mut node.back, content),
            Slot::Front => core::mem::replace(&mut node.front, content),
        };
        if let Some(old) = old {
            self.release_content(id, old);
        }
        if let Some(new) = content {
            self.claim_content(id, new);
        }
        self.update_volatility_upward(id);
        self.update_bounds_upward(id);
        self.damage_node(id);
        Ok(())
    }

    fn claim_content(&mut self, owner: NodeId, content: Content) {
        match content {
            Content::Visual(v) => {
                if let Some(slot) = self.visuals.get_mut(v) {
                    slot.owners.push(owner);
                }
            }
            Content::Camera(c) => {
                if let Some(camera) = self.cameras.get_mut(c) {
                    camera.owners.push(owner);
                }
            }
        }
    }

    pub(crate) fn release_content(&mut self, owner: NodeId, content: Content) {
        match content {
            Content::Visual(v) => {
                if let Some(slot) = self.visuals.get_mut(v) {
                    slot.release(owner);
                }
            }
            Content::Camera(c) => {
                if let Some(camera) = self.cameras.get_mut(c)
                    && let Some(pos) = camera.owners.iter().position(|o| *o == owner)
                {
                    camera.owners.remove(pos);
                }
            }
        }
    }
}
