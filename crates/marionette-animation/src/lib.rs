//! Skeletal animation for Marionette
//!
//! Joint hierarchies with bind and inverse-bind matrices, keyframed clips
//! played on a loop, and a flat per-joint skinning buffer for the renderer.
//!
//! [`AnimationSystem`] ties these together: a clip registry, a set of
//! models, and a [`RuntimeSystem`] update that advances every skinned model.

pub mod animator;
pub mod binding;
pub mod clip;
pub mod config;
pub mod joint;
pub mod loader;
pub mod model;
pub mod pose;
pub mod skeleton;
pub mod skinning;

pub use animator::{Animator, FrameOutcome, PlaybackState};
pub use binding::{BindReport, BoundClip};
pub use clip::{Animation, Keyframe};
pub use config::{ModelConfig, RigConfig};
pub use joint::Joint;
pub use model::{Model, ModelKind, SkinnedModel};
pub use pose::{JointTransform, Pose, ResolvedPose};
pub use skeleton::{Skeleton, SkeletonBuilder};
pub use skinning::{SkinningBuffer, MAX_JOINTS};

use marionette_core::{MarionetteError, ModelId, Result};
use marionette_runtime::{FrameTime, RuntimeSystem};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Clip registry plus every model that can be animated.
///
/// Implements `RuntimeSystem`: `update` advances each skinned model and
/// refreshes its skinning buffer. Buffers are read through `&self` once the
/// update has returned.
#[derive(Debug, Default)]
pub struct AnimationSystem {
    clips: HashMap<String, Arc<Animation>>,
    models: BTreeMap<ModelId, Model>,
    /// Models whose last update held a stale pose
    held_last_frame: usize,
}

impl AnimationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under its name, replacing any clip of the same name
    pub fn add_clip(&mut self, animation: Animation) -> Arc<Animation> {
        let animation = Arc::new(animation);
        if self
            .clips
            .insert(animation.name().to_string(), animation.clone())
            .is_some()
        {
            log::warn!("Replaced clip '{}'", animation.name());
        }
        animation
    }

    pub fn clip(&self, name: &str) -> Option<&Arc<Animation>> {
        self.clips.get(name)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        let id = model.id;
        log::debug!("Added model '{}' ({})", model.name, id);
        self.models.insert(id, model);
        id
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(&id)
    }

    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(&id)
    }

    pub fn find_model(&self, name: &str) -> Option<ModelId> {
        self.models
            .values()
            .find(|m| m.name == name)
            .map(|m| m.id)
    }

    /// Models in id (creation) order
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Start a registered clip on a skinned model
    pub fn play(&mut self, model: ModelId, clip: &str) -> Result<BindReport> {
        let animation = self
            .clips
            .get(clip)
            .cloned()
            .ok_or_else(|| MarionetteError::UnknownClip(clip.to_string()))?;
        let animator = self.animator_mut(model)?;
        let report = animator.do_animation(animation).clone();
        log::debug!("Model {} playing '{}'", model, clip);
        Ok(report)
    }

    pub fn stop(&mut self, model: ModelId) -> Result<()> {
        self.animator_mut(model)?.stop();
        Ok(())
    }

    /// The skinning matrices a renderer should upload for `model`
    pub fn skinning(&self, model: ModelId) -> Result<&SkinningBuffer> {
        let found = self
            .models
            .get(&model)
            .ok_or_else(|| MarionetteError::UnknownModel(model.to_string()))?;
        found
            .skinning()
            .ok_or_else(|| MarionetteError::NotSkinned(found.name.clone()))
    }

    fn animator_mut(&mut self, model: ModelId) -> Result<&mut Animator> {
        let found = self
            .models
            .get_mut(&model)
            .ok_or_else(|| MarionetteError::UnknownModel(model.to_string()))?;
        let name = found.name.clone();
        found
            .animator_mut()
            .ok_or(MarionetteError::NotSkinned(name))
    }

    /// Number of models that held their previous pose in the last update
    pub fn held_last_frame(&self) -> usize {
        self.held_last_frame
    }

    /// Build a system from a rig manifest.
    ///
    /// Skeleton and clip files shared between models are loaded once. Each
    /// model plays the clip from its own manifest entry, even when two files
    /// declare the same clip name.
    pub fn from_rig(config: &RigConfig) -> Result<Self> {
        let mut system = Self::new();
        let mut skeletons: HashMap<PathBuf, Skeleton> = HashMap::new();
        let mut clips: HashMap<PathBuf, Arc<Animation>> = HashMap::new();

        for entry in &config.models {
            let Some(skeleton_path) = &entry.skeleton else {
                system.add_model(Model::new_static(entry.name.clone()));
                continue;
            };

            let path = config.resolve(skeleton_path);
            let skeleton = match skeletons.get(&path) {
                Some(skeleton) => skeleton.clone(),
                None => {
                    let skeleton = loader::load_skeleton_from_file(&path)?;
                    skeletons.insert(path, skeleton.clone());
                    skeleton
                }
            };
            let model = Model::new_skinned(entry.name.clone(), Animator::new(skeleton))?;
            let id = system.add_model(model);

            if let Some(clip_path) = &entry.clip {
                let path = config.resolve(clip_path);
                let animation = match clips.get(&path) {
                    Some(animation) => animation.clone(),
                    None => {
                        let animation = system.add_clip(loader::load_clip_from_file(&path)?);
                        clips.insert(path, animation.clone());
                        animation
                    }
                };
                // Start the file's own clip; another file may have registered
                // a clip under the same name since
                if entry.autoplay {
                    system.animator_mut(id)?.do_animation(animation);
                }
            }
        }
        Ok(system)
    }

    pub fn load_rig(path: &Path) -> Result<Self> {
        let config = RigConfig::load(path)?;
        Self::from_rig(&config)
    }

    /// Drop every model and clip
    pub fn clear(&mut self) {
        self.models.clear();
        self.clips.clear();
        self.held_last_frame = 0;
    }
}

impl RuntimeSystem for AnimationSystem {
    fn initialize(&mut self) -> Result<()> {
        log::info!(
            "Animation system initialized ({} clips, {} models, {} skinned)",
            self.clips.len(),
            self.models.len(),
            self.models.values().filter(|m| m.is_skinned()).count()
        );
        Ok(())
    }

    fn update(&mut self, frame: &FrameTime) -> Result<()> {
        self.held_last_frame = 0;
        for model in self.models.values_mut() {
            if let FrameOutcome::HeldLastPose { .. } = model.update(frame.delta_time, frame.now) {
                self.held_last_frame += 1;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        log::info!("Animation system shut down");
        Ok(())
    }

    fn name(&self) -> &str {
        "animation"
    }
}
