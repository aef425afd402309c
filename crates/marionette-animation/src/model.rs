//! Renderable models and their animation capability

use crate::animator::{Animator, FrameOutcome};
use crate::skinning::SkinningBuffer;
use marionette_core::{Mat4, ModelId, Result};

/// An animator paired with the buffer the renderer reads from
#[derive(Debug, Clone)]
pub struct SkinnedModel {
    animator: Animator,
    buffer: SkinningBuffer,
}

impl SkinnedModel {
    pub fn new(animator: Animator) -> Result<Self> {
        let buffer = SkinningBuffer::for_skeleton(animator.skeleton())?;
        Ok(Self { animator, buffer })
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    pub fn buffer(&self) -> &SkinningBuffer {
        &self.buffer
    }

    /// Advance the animator and refresh the buffer if the pose changed
    pub fn update(&mut self, delta_time: f64, now: f64) -> FrameOutcome {
        let outcome = self.animator.update(delta_time, now);
        if let FrameOutcome::Animated { .. } = outcome {
            self.buffer.write_from(self.animator.skeleton());
        }
        outcome
    }
}

/// What a model can do beyond being drawn
#[derive(Debug, Clone)]
pub enum ModelKind {
    /// Rigid mesh; drawn with its world matrix only
    Static,
    Skinned(SkinnedModel),
}

#[derive(Debug, Clone)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub world_matrix: Mat4,
    pub kind: ModelKind,
}

impl Model {
    pub fn new_static(name: impl Into<String>) -> Self {
        Self {
            id: ModelId::new(),
            name: name.into(),
            world_matrix: Mat4::IDENTITY,
            kind: ModelKind::Static,
        }
    }

    pub fn new_skinned(name: impl Into<String>, animator: Animator) -> Result<Self> {
        Ok(Self {
            id: ModelId::new(),
            name: name.into(),
            world_matrix: Mat4::IDENTITY,
            kind: ModelKind::Skinned(SkinnedModel::new(animator)?),
        })
    }

    pub fn with_world_matrix(mut self, world_matrix: Mat4) -> Self {
        self.world_matrix = world_matrix;
        self
    }

    pub fn is_skinned(&self) -> bool {
        matches!(self.kind, ModelKind::Skinned(_))
    }

    /// Skinning matrices for the renderer; `None` for static models
    pub fn skinning(&self) -> Option<&SkinningBuffer> {
        match &self.kind {
            ModelKind::Static => None,
            ModelKind::Skinned(skinned) => Some(skinned.buffer()),
        }
    }

    pub fn animator(&self) -> Option<&Animator> {
        match &self.kind {
            ModelKind::Static => None,
            ModelKind::Skinned(skinned) => Some(skinned.animator()),
        }
    }

    pub fn animator_mut(&mut self) -> Option<&mut Animator> {
        match &mut self.kind {
            ModelKind::Static => None,
            ModelKind::Skinned(skinned) => Some(skinned.animator_mut()),
        }
    }

    pub fn update(&mut self, delta_time: f64, now: f64) -> FrameOutcome {
        match &mut self.kind {
            ModelKind::Static => FrameOutcome::Idle,
            ModelKind::Skinned(skinned) => skinned.update(delta_time, now),
        }
    }
}
