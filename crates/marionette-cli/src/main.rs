//! Marionette CLI - inspect skeletons, bake clips and play rigs headlessly

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bake, inspect, play};

#[derive(Parser)]
#[command(name = "marionette")]
#[command(about = "Skeletal animation toolkit", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a skeleton's joint tree and bind matrices
    Inspect {
        /// Path to a .skel.toml file
        skeleton: String,
    },

    /// Sample a clip on a skeleton and print the skinning buffer per frame
    Bake {
        /// Path to a .skel.toml file
        skeleton: String,

        /// Path to a .anim.toml file
        clip: String,

        /// Samples per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Number of frames to bake (defaults to one loop of the clip)
        #[arg(long)]
        frames: Option<u32>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run a rig manifest for a fixed time without a window
    Play {
        /// Path to rig.toml
        rig: String,

        /// Seconds of animation to simulate
        #[arg(long, default_value = "2.0")]
        seconds: f64,

        /// Simulation steps per second
        #[arg(long, default_value = "60")]
        fps: u32,
    },
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose, cli.quiet)),
    )
    .init();

    match cli.command {
        Commands::Inspect { skeleton } => inspect::run(&skeleton),
        Commands::Bake {
            skeleton,
            clip,
            fps,
            frames,
            format,
        } => bake::run(bake::BakeArgs {
            skeleton,
            clip,
            fps,
            frames,
            format,
        }),
        Commands::Play { rig, seconds, fps } => play::run(play::PlayArgs { rig, seconds, fps }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter(0, false), "warn");
        assert_eq!(log_filter(2, false), "debug");
        assert_eq!(log_filter(5, false), "trace");
        assert_eq!(log_filter(3, true), "error");
    }

    #[test]
    fn parse_bake_flags() {
        let cli = Cli::try_parse_from([
            "marionette", "-v", "bake", "arm.skel.toml", "wave.anim.toml", "--fps", "10",
            "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Bake { fps, frames, format, .. } => {
                assert_eq!(fps, 10);
                assert_eq!(frames, None);
                assert_eq!(format, "json");
            }
            _ => panic!("expected bake"),
        }
    }
}
