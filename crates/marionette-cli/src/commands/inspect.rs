//! Skeleton inspection command

use anyhow::{Context, Result};
use marionette_animation::loader::load_skeleton_from_file;
use marionette_animation::Skeleton;
use std::path::Path;

pub fn run(path: &str) -> Result<()> {
    let skeleton = load_skeleton_from_file(Path::new(path))
        .with_context(|| format!("Failed to load skeleton {}", path))?;
    print!("{}", describe(&skeleton));
    Ok(())
}

fn describe(skeleton: &Skeleton) -> String {
    let mut out = format!(
        "Skeleton '{}' ({} joints)\n",
        skeleton.name(),
        skeleton.joint_count()
    );
    for &id in skeleton.traversal_order() {
        let Some(joint) = skeleton.joint(id) else {
            continue;
        };
        let depth = ancestors(skeleton, id);
        let rest = skeleton
            .world_bind_matrix(id)
            .map(|m| m.translation())
            .unwrap_or_default();
        out.push_str(&format!(
            "{}[{}] {}  rest at ({:.3}, {:.3}, {:.3})\n",
            "  ".repeat(depth + 1),
            joint.id,
            joint.name,
            rest.x,
            rest.y,
            rest.z
        ));
    }
    out
}

fn ancestors(skeleton: &Skeleton, id: usize) -> usize {
    let mut depth = 0;
    let mut cursor = skeleton.joint(id).and_then(|j| j.parent());
    while let Some(parent) = cursor {
        depth += 1;
        cursor = skeleton.joint(parent).and_then(|j| j.parent());
    }
    depth
}
