//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use groov_core::{RenderParameters, SceneConfig, BPM_MAX, DEFAULT_BPM, DEFAULT_ORBITAL_COUNT};

#[derive(Parser, Debug)]
#[command(name = "groov")]
#[command(about = "Audio-reactive 3D visualizer", long_about = None)]
pub struct Args {
    /// WAV file to load at start-up
    #[arg(value_name = "AUDIO")]
    pub audio: Option<PathBuf>,

    /// Beats per minute driving the looper
    #[arg(long, default_value_t = DEFAULT_BPM, value_parser = clap::value_parser!(u32).range(0..=i64::from(BPM_MAX)))]
    pub bpm: u32,

    /// Orbiting cubes per axis
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ORBITAL_COUNT)]
    pub orbitals: usize,

    /// Draw only the central cube
    #[arg(long)]
    pub no_orbitals: bool,

    /// Skip the noise-shaded sky box
    #[arg(long)]
    pub no_sky: bool,

    /// Image shown on the cubes
    #[arg(long, value_name = "PATH")]
    pub texture: Option<PathBuf>,

    /// Directory with scene_vertex.wgsl, scene_fragment.wgsl, sky_vertex.wgsl
    /// and sky_fragment.wgsl; reloaded with R
    #[arg(long, value_name = "DIR")]
    pub shaders: Option<PathBuf>,

    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// error, warn, info, debug or trace; RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: log::LevelFilter,
}

impl Args {
    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            orbital_count: self.orbitals,
            orbitals_enabled: !self.no_orbitals && self.orbitals > 0,
            sky_enabled: !self.no_sky,
            ..SceneConfig::default()
        }
    }

    pub fn initial_parameters(&self) -> RenderParameters {
        RenderParameters {
            bpm: self.bpm,
            ..RenderParameters::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scene_defaults() {
        let args = Args::parse_from(["groov"]);
        assert_eq!(args.scene_config(), SceneConfig::default());
        assert_eq!(args.initial_parameters(), RenderParameters::default());
        assert_eq!(args.log_level, log::LevelFilter::Info);
        assert!(args.audio.is_none());
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::parse_from([
            "groov",
            "loop.wav",
            "--bpm",
            "90",
            "--orbitals",
            "2",
            "--no-sky",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.audio.as_deref(), Some(std::path::Path::new("loop.wav")));
        let config = args.scene_config();
        assert_eq!(config.orbital_count, 2);
        assert!(config.orbitals_enabled);
        assert!(!config.sky_enabled);
        assert_eq!(args.initial_parameters().bpm, 90);
        assert_eq!(args.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn bpm_above_range_is_rejected() {
        assert!(Args::try_parse_from(["groov", "--bpm", "400"]).is_err());
    }
}
