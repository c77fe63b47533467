use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{AvlError, Result};
use crate::types::MAX_NODES;

/// Spacing used by [`crate::layout::Layout`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of one node as drawn by the renderer.
    pub node_width: f32,
    /// Gap between neighbouring nodes on the bottom level.
    pub node_margin: f32,
    /// Vertical distance between successive levels.
    pub y_spacing: f32,
    /// Vertical center of the root level.
    pub y_start: f32,
    /// How far above a node the pending node hovers while being compared.
    pub hover_lift: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 1.0,
            node_margin: 0.7,
            y_spacing: 4.0,
            y_start: 0.0,
            hover_lift: 1.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub frames_per_second: f32,
    /// Distance below which an axis counts as arrived.
    pub threshold: f32,
    /// Units per second selected by the digit keys 0..9.
    pub speed_presets: [f32; 10],
    /// Index into `speed_presets` used at start-up.
    pub initial_speed: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60.0,
            threshold: 0.001,
            speed_presets: [1.0, 3.0, 7.0, 10.0, 15.0, 20.0, 32.0, 50.0, 75.0, 100.0],
            initial_speed: 0,
        }
    }
}

/// Countdown lengths, in frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Divided by the current speed (integer division) to get the number
    /// of frames a comparison stays highlighted.
    pub compare_delay_frames: u32,
    /// Frames the whole tree stays flagged after a duplicate key.
    pub duplicate_hold_frames: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            compare_delay_frames: 30,
            duplicate_hold_frames: 60,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub normal: Vec3,
    pub highlight: Vec3,
    pub pending: Vec3,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            normal: Vec3::new(0.0, 0.0, 1.0),
            highlight: Vec3::new(1.0, 0.0, 0.0),
            pending: Vec3::new(1.0, 1.0, 0.0),
        }
    }
}

/// Top-level configuration. Every section uses `#[serde(default)]`, so a
/// TOML file only needs the values it overrides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of nodes; also the traversal queue capacity.
    pub capacity: usize,
    /// Number of random keys inserted before the first frame.
    pub seed_count: usize,
    pub layout: LayoutConfig,
    pub motion: MotionConfig,
    pub timing: TimingConfig,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: MAX_NODES,
            seed_count: 15,
            layout: LayoutConfig::default(),
            motion: MotionConfig::default(),
            timing: TimingConfig::default(),
            palette: Palette::default(),
        }
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    /// Parses and validates a config from TOML text. Missing fields use
    /// defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(content).map_err(|e| AvlError::ConfigParse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values that would stall an animation or make seeding fail.
    ///
    /// ### Errors
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(AvlError::InvalidConfig(msg)) };
        let m = &self.motion;
        if !positive(m.frames_per_second) {
            return invalid(format!(
                "motion.frames_per_second must be positive, got {}",
                m.frames_per_second
            ));
        }
        if let Some((i, ups)) = m
            .speed_presets
            .iter()
            .enumerate()
            .find(|(_, ups)| !positive(**ups))
        {
            return invalid(format!("motion.speed_presets[{i}] must be positive, got {ups}"));
        }
        if m.threshold.is_nan() || m.threshold < 0.0 {
            return invalid(format!("motion.threshold must not be negative, got {}", m.threshold));
        }
        if self.capacity == 0 {
            return invalid("capacity must be at least 1".to_string());
        }
        if self.seed_count > self.capacity {
            return invalid(format!(
                "seed_count {} exceeds capacity {}",
                self.seed_count, self.capacity
            ));
        }
        Ok(())
    }

    /// Loads a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Units per second for the preset at `index`, clamped to the last one.
    pub fn speed_preset(&self, index: usize) -> f32 {
        let presets = &self.motion.speed_presets;
        presets[index.min(presets.len() - 1)]
    }
}
