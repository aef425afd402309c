//! Headless rig playback command

use anyhow::{Context, Result};
use marionette_animation::{AnimationSystem, PlaybackState};
use marionette_runtime::FrameDriver;
use std::path::Path;

pub struct PlayArgs {
    pub rig: String,
    pub seconds: f64,
    pub fps: u32,
}

pub fn run(args: PlayArgs) -> Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    let system = AnimationSystem::load_rig(Path::new(&args.rig))
        .with_context(|| format!("Failed to load rig {}", args.rig))?;

    let mut driver = FrameDriver::new(system);
    driver.initialize()?;

    let dt = 1.0 / f64::from(args.fps);
    let steps = (args.seconds.max(0.0) * f64::from(args.fps)).round() as u64;
    let mut held = 0;
    for _ in 0..steps {
        let view = driver.step(dt)?;
        held += view.held_last_frame();
    }
    if held > 0 {
        log::warn!("{} model update(s) held their previous pose", held);
    }

    println!(
        "Played {} frame(s) ({:.3}s) of {}",
        steps,
        driver.clock().total_time,
        args.rig
    );
    print!("{}", summarize(driver.system()));

    driver.shutdown()?;
    Ok(())
}

fn summarize(system: &AnimationSystem) -> String {
    let mut out = String::new();
    for model in system.models() {
        let Some(animator) = model.animator() else {
            out.push_str(&format!("  {:<16} static\n", model.name));
            continue;
        };
        let status = match (animator.state(), animator.animation()) {
            (PlaybackState::Playing, Some(clip)) => format!(
                "playing '{}' at {:.3}/{:.3}s",
                clip.name(),
                animator.current_time(),
                clip.length_in_seconds()
            ),
            _ => "idle".to_string(),
        };
        let root = animator.skeleton().root().animated_matrix().translation();
        out.push_str(&format!(
            "  {:<16} {} joints, {}, root offset ({:.3}, {:.3}, {:.3})\n",
            model.name,
            animator.skeleton().joint_count(),
            status,
            root.x,
            root.y,
            root.z
        ));
    }
    out
}
