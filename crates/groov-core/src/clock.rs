//! Time-based animation state: the BPM-driven looper and its derived curves.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use instant::Instant;
use rand::prelude::*;

use crate::constants::WIGGLE_AMPLITUDE;

/// Half-sine warp of the looper: 0 at phase 0, π/2 at phase π, back to 0
/// at 2π. Continuous over the whole cycle.
pub fn curve_phase_of(phase: f64) -> f64 {
    if phase < PI {
        FRAC_PI_2 * (phase / 2.0).sin()
    } else {
        FRAC_PI_2 * ((phase - PI) / 2.0).cos()
    }
}

#[inline]
fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Phase increment for `dt` seconds at `bpm`: half a turn per beat.
#[inline]
pub fn phase_increment(bpm: f64, dt: f64) -> f64 {
    PI * (sanitize(bpm) / 60.0) * sanitize(dt)
}

/// Looper state advanced once per frame by the renderer.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    phase: f64,
    beat_phase: f64,
    total: f64,
    reset_requested: bool,
    audio_stopped: bool,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            beat_phase: 0.0,
            total: 0.0,
            reset_requested: false,
            audio_stopped: true,
        }
    }

    /// Advances the looper; `phase` stays in \[0, 2π).
    ///
    /// A pending restart replaces the phase with this frame's increment.
    /// Returns the increment that was applied.
    pub fn advance(&mut self, dt: f64, bpm: f64) -> f64 {
        let increment = phase_increment(bpm, dt);
        if self.reset_requested {
            self.phase = increment.rem_euclid(TAU);
            self.reset_requested = false;
        } else {
            self.phase += increment;
            if self.phase >= TAU {
                self.phase = self.phase.rem_euclid(TAU);
            }
        }
        self.total += increment;
        increment
    }

    /// Advances the scale-bounce phase. It restarts from zero once it
    /// passes π, where `|cos|` is back at 1.
    pub fn advance_bounce(&mut self, dt: f64, bpm: f64) {
        self.beat_phase = if self.beat_phase > PI {
            0.0
        } else {
            self.beat_phase + phase_increment(bpm, dt)
        };
    }

    /// Requests a fresh cycle on the next [`advance`](Self::advance).
    pub fn start_playing(&mut self) {
        self.reset_requested = true;
        self.audio_stopped = false;
    }

    pub fn stop_playing(&mut self) {
        self.audio_stopped = true;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn beat_phase(&self) -> f64 {
        self.beat_phase
    }

    /// Sum of every increment applied since construction.
    pub fn total_advance(&self) -> f64 {
        self.total
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_requested
    }

    pub fn is_audio_stopped(&self) -> bool {
        self.audio_stopped
    }

    pub fn curve_phase(&self) -> f64 {
        curve_phase_of(self.phase)
    }

    /// Uniform scale of the central shape, in \[0, 1\].
    pub fn bounce_scale(&self) -> f32 {
        self.beat_phase.cos().abs() as f32
    }

    /// Angle of orbital `index` around the central shape.
    pub fn orbit_angle(&self, index: usize) -> f64 {
        self.phase + self.curve_phase() + index as f64 * FRAC_PI_2
    }

    /// Radial wiggle of the orbitals; zero while no audio plays.
    pub fn wiggle_offset(&self, wiggle_speed: f32) -> f32 {
        if self.audio_stopped {
            return 0.0;
        }
        (self.phase * f64::from(wiggle_speed)).sin() as f32 * WIGGLE_AMPLITUDE
    }
}

/// A value that drifts back and forth across \[0, 1\] at a random speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BouncingNumber {
    speed: f64,
    phase: f64,
}

impl BouncingNumber {
    pub fn new() -> Self {
        Self::from_rng(&mut thread_rng())
    }

    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            speed: 0.0004 + 0.0007 * rng.gen::<f64>(),
            phase: rng.gen::<f64>(),
        }
    }

    pub fn with_params(speed: f64, phase: f64) -> Self {
        Self { speed, phase }
    }

    /// Same number at 30% of the speed.
    pub fn slower(mut self) -> Self {
        self.speed *= 0.3;
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Triangle wave over a millisecond clock.
    pub fn value(&self, now_ms: f64) -> f32 {
        let v = (self.phase + self.speed * now_ms).rem_euclid(2.0);
        (if v >= 1.0 { 2.0 - v } else { v }) as f32
    }
}

impl Default for BouncingNumber {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock frame delta measurement.
#[derive(Clone, Debug)]
pub struct FrameTimer {
    start: Instant,
    last: Instant,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        dt
    }

    /// Milliseconds since the timer was created.
    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bouncing_number_stays_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = BouncingNumber::from_rng(&mut rng);
        for t in 0..2000 {
            let v = n.value(t as f64 * 37.0);
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn slower_scales_speed() {
        let n = BouncingNumber::with_params(0.001, 0.0);
        assert!((n.slower().speed() - 0.0003).abs() < 1e-12);
        assert!((n.value(500.0) - 0.5).abs() < 1e-6);
        assert!((n.value(1500.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn negative_or_nan_inputs_do_not_move_the_phase() {
        let mut c = AnimationClock::new();
        c.advance(-1.0, 120.0);
        c.advance(f64::NAN, 120.0);
        c.advance(1.0, -60.0);
        assert_eq!(c.phase(), 0.0);
    }
}
