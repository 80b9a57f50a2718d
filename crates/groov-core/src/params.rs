//! Slider/toggle state and how it reaches the render thread.
//!
//! The UI owns a [`ParameterSurface`] and is its only writer. Every change
//! publishes a fresh immutable [`RenderParameters`] snapshot; the renderer
//! holds a [`ParameterReader`] and picks up the latest snapshot once at the
//! top of each frame. A frame therefore never sees half of an update.

use std::sync::{Arc, Mutex, PoisonError};

use crate::color::wrap_degrees;
use crate::constants::{
    BPM_MAX, DEFAULT_BG_HUE, DEFAULT_BPM, DEFAULT_COLOR_SAT, DEFAULT_COLOR_VAL,
    DEFAULT_ROTATION_SPEED, DEFAULT_SCALE, DEFAULT_WIGGLE_SPEED, ROTATION_SPEED_RANGE, SCALE_RANGE,
};

#[derive(Clone, Debug, PartialEq)]
pub struct RenderParameters {
    /// Zoom; larger values narrow the frustum.
    pub scale: f32,
    /// Radians added to the spin every frame.
    pub rotation_speed: f32,
    /// 0 while frozen.
    pub bpm: u32,
    pub wiggle_speed: f32,
    pub color_sat: f32,
    pub color_val: f32,
    /// Background hue in degrees, \[0, 360).
    pub bg_hue: f32,
    pub do_scale_bounce: bool,
    pub frozen: bool,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            rotation_speed: DEFAULT_ROTATION_SPEED,
            bpm: DEFAULT_BPM,
            wiggle_speed: DEFAULT_WIGGLE_SPEED,
            color_sat: DEFAULT_COLOR_SAT,
            color_val: DEFAULT_COLOR_VAL,
            bg_hue: DEFAULT_BG_HUE,
            do_scale_bounce: true,
            frozen: false,
        }
    }
}

type Shared = Arc<Mutex<Arc<RenderParameters>>>;

/// Single-writer parameter store owned by the UI.
#[derive(Debug)]
pub struct ParameterSurface {
    current: RenderParameters,
    restore_bpm: u32,
    shared: Shared,
}

impl Default for ParameterSurface {
    fn default() -> Self {
        Self::new(RenderParameters::default())
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

impl ParameterSurface {
    pub fn new(initial: RenderParameters) -> Self {
        let mut current = initial;
        let mut restore_bpm = current.bpm.min(BPM_MAX);
        if restore_bpm == 0 {
            restore_bpm = DEFAULT_BPM;
        }
        if current.frozen {
            current.bpm = 0;
        }
        let shared = Arc::new(Mutex::new(Arc::new(current.clone())));
        Self {
            current,
            restore_bpm,
            shared,
        }
    }

    fn publish(&self) {
        let snapshot = Arc::new(self.current.clone());
        *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.current.scale = finite_or(scale, self.current.scale).clamp(SCALE_RANGE.0, SCALE_RANGE.1);
        self.publish();
    }

    /// Wheel / pinch zoom.
    pub fn adjust_scale(&mut self, delta: f32) {
        self.set_scale(self.current.scale + finite_or(delta, 0.0));
    }

    pub fn set_rotation_speed(&mut self, speed: f32) {
        self.current.rotation_speed = finite_or(speed, self.current.rotation_speed)
            .clamp(ROTATION_SPEED_RANGE.0, ROTATION_SPEED_RANGE.1);
        self.publish();
    }

    /// While frozen the value is remembered for [`unfreeze`](Self::unfreeze)
    /// and the published bpm stays 0.
    pub fn set_bpm(&mut self, bpm: u32) {
        let bpm = bpm.min(BPM_MAX);
        if self.current.frozen {
            if bpm > 0 {
                self.restore_bpm = bpm;
            }
        } else {
            self.current.bpm = bpm;
            if bpm > 0 {
                self.restore_bpm = bpm;
            }
        }
        self.publish();
    }

    pub fn set_wiggle_speed(&mut self, speed: f32) {
        self.current.wiggle_speed = finite_or(speed, self.current.wiggle_speed).max(0.0);
        self.publish();
    }

    pub fn set_color_sat(&mut self, sat: f32) {
        self.current.color_sat = finite_or(sat, self.current.color_sat).clamp(0.0, 1.0);
        self.publish();
    }

    pub fn set_color_val(&mut self, val: f32) {
        self.current.color_val = finite_or(val, self.current.color_val).clamp(0.0, 1.0);
        self.publish();
    }

    pub fn set_bg_hue(&mut self, hue: f32) {
        self.current.bg_hue = wrap_degrees(finite_or(hue, self.current.bg_hue));
        self.publish();
    }

    pub fn set_scale_bounce(&mut self, enabled: bool) {
        self.current.do_scale_bounce = enabled;
        self.publish();
    }

    /// Stops the looper by publishing bpm 0.
    pub fn freeze(&mut self) {
        if self.current.frozen {
            return;
        }
        if self.current.bpm > 0 {
            self.restore_bpm = self.current.bpm;
        }
        self.current.bpm = 0;
        self.current.frozen = true;
        log::debug!("frozen (restore bpm {})", self.restore_bpm);
        self.publish();
    }

    /// Restores the last non-zero bpm.
    pub fn unfreeze(&mut self) {
        if !self.current.frozen {
            return;
        }
        self.current.bpm = self.restore_bpm;
        self.current.frozen = false;
        log::debug!("unfrozen at {} bpm", self.current.bpm);
        self.publish();
    }

    pub fn toggle_freeze(&mut self) {
        if self.current.frozen {
            self.unfreeze();
        } else {
            self.freeze();
        }
    }

    /// The values as last published.
    pub fn snapshot(&self) -> Arc<RenderParameters> {
        Arc::clone(&self.shared.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn current(&self) -> &RenderParameters {
        &self.current
    }

    /// The bpm the looper runs at once unfrozen.
    pub fn target_bpm(&self) -> u32 {
        if self.current.frozen {
            self.restore_bpm
        } else {
            self.current.bpm
        }
    }

    pub fn reader(&self) -> ParameterReader {
        ParameterReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Render-side handle; cheap to clone and `Send`.
#[derive(Clone, Debug)]
pub struct ParameterReader {
    shared: Shared,
}

impl ParameterReader {
    /// A reader fixed to one value, for hosts without a UI.
    pub fn fixed(params: RenderParameters) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Arc::new(params))),
        }
    }

    pub fn latest(&self) -> Arc<RenderParameters> {
        Arc::clone(&self.shared.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_sees_published_snapshots_only() {
        let mut surface = ParameterSurface::default();
        let reader = surface.reader();
        let before = reader.latest();
        surface.set_color_sat(0.25);
        assert_eq!(before.color_sat, DEFAULT_COLOR_SAT);
        assert_eq!(reader.latest().color_sat, 0.25);
    }

    #[test]
    fn sliders_clamp_to_their_ranges() {
        let mut surface = ParameterSurface::default();
        surface.set_scale(10.0);
        surface.set_rotation_speed(-1.0);
        surface.set_bpm(999);
        surface.set_bg_hue(-30.0);
        let p = surface.snapshot();
        assert_eq!(p.scale, SCALE_RANGE.1);
        assert_eq!(p.rotation_speed, ROTATION_SPEED_RANGE.0);
        assert_eq!(p.bpm, BPM_MAX);
        assert!((p.bg_hue - 330.0).abs() < 1e-4);
    }

    #[test]
    fn nan_input_keeps_previous_value() {
        let mut surface = ParameterSurface::default();
        surface.set_scale(f32::NAN);
        assert_eq!(surface.snapshot().scale, DEFAULT_SCALE);
    }
}
