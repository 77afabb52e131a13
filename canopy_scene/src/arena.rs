// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage shared by nodes, visuals, cameras, and surfaces.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::types::{CameraId, NodeId, SurfaceId, VisualId};

/// A generational handle into an [`Arena`].
pub(crate) trait Handle: Copy + Eq {
    fn from_parts(idx: u32, generation: u32) -> Self;
    fn slot(self) -> usize;
    fn generation(self) -> u32;
}

macro_rules! impl_handle {
    ($($name:ident),*) => {$(
        impl Handle for $name {
            fn from_parts(idx: u32, generation: u32) -> Self {
                Self::new(idx, generation)
            }

            fn slot(self) -> usize {
                self.idx()
            }

            fn generation(self) -> u32 {
                self.1
            }
        }
    )*};
}

impl_handle!(NodeId, VisualId, CameraId, SurfaceId);

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slots plus a free list; a freed slot bumps its generation on reuse so
/// stale handles never alias a new value.
pub(crate) struct Arena<H, T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    _handle: PhantomData<H>,
}

impl<H: Handle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            _handle: PhantomData,
        }
    }
}

impl<H: Handle, T> Arena<H, T> {
    pub(crate) fn insert(&mut self, value: T) -> H {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.saturating_add(1);
            slot.value = Some(value);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Handles use 32-bit indices by design."
            )]
            let idx = idx as u32;
            H::from_parts(idx, slot.generation)
        } else {
            let generation = 1_u32;
            self.slots.push(Slot {
                generation,
                value: Some(value),
            });
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Handles use 32-bit indices by design."
            )]
            let idx = (self.slots.len() - 1) as u32;
            H::from_parts(idx, generation)
        }
    }

    pub(crate) fn remove(&mut self, id: H) -> Option<T> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        self.free_list.push(id.slot());
        Some(value)
    }

    #[inline]
    pub(crate) fn get(&self, id: H) -> Option<&T> {
        let slot = self.slots.get(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: H) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    #[inline]
    pub(crate) fn contains(&self, id: H) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
