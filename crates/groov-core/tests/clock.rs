// Beat clock: looper phase, curve warp, bounce and orbit angles.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use groov_core::{curve_phase_of, phase_increment, AnimationClock, WIGGLE_AMPLITUDE};

#[test]
fn half_turn_per_beat() {
    // 120 bpm = 2 beats per second.
    assert!((phase_increment(120.0, 1.0) - TAU).abs() < 1e-12);
    assert!((phase_increment(60.0, 0.5) - PI / 2.0).abs() < 1e-12);
    assert_eq!(phase_increment(0.0, 1.0), 0.0);
}

#[test]
fn phase_wraps_once_every_two_beats() {
    let mut c = AnimationClock::new();
    let mut seen = Vec::new();
    for _ in 0..4 {
        c.advance(0.5, 120.0);
        seen.push(c.phase());
    }
    let expected = [PI, 0.0, PI, 0.0];
    for (i, (got, want)) in seen.iter().zip(expected).enumerate() {
        assert!((got - want).abs() < 1e-9, "step {i}: {got} != {want}");
    }
    assert!((c.total_advance() - 4.0 * PI).abs() < 1e-9);
}

#[test]
fn phase_stays_in_range_for_many_frame_rates() {
    let mut c = AnimationClock::new();
    for (k, dt) in [1.0 / 144.0, 1.0 / 60.0, 1.0 / 24.0, 0.2, 3.7].iter().cycle().take(2000).enumerate() {
        c.advance(*dt, 173.0);
        assert!((0.0..TAU).contains(&c.phase()), "step {k}: {}", c.phase());
    }
}

#[test]
fn curve_is_continuous_across_the_cycle() {
    assert_eq!(curve_phase_of(0.0), 0.0);
    let eps = 1e-7;
    assert!((curve_phase_of(PI - eps) - curve_phase_of(PI)).abs() < 1e-6);
    assert!((curve_phase_of(PI) - FRAC_PI_2).abs() < 1e-12);
    assert!(curve_phase_of(TAU - eps).abs() < 1e-6);

    let mut prev = curve_phase_of(0.0);
    for k in 1..=1000 {
        let v = curve_phase_of(TAU * k as f64 / 1000.0);
        assert!((v - prev).abs() < 0.01, "jump at step {k}");
        assert!((0.0..=FRAC_PI_2 + 1e-12).contains(&v));
        prev = v;
    }
}

#[test]
fn start_playing_restarts_the_cycle() {
    let mut c = AnimationClock::new();
    c.advance(0.3, 120.0);
    assert!(c.phase() > 0.0);
    c.start_playing();
    assert!(c.reset_pending());
    let inc = c.advance(0.01, 120.0);
    assert!(!c.reset_pending());
    assert!((c.phase() - inc).abs() < 1e-12);
}

#[test]
fn wiggle_only_while_audio_plays() {
    let mut c = AnimationClock::new();
    c.advance(0.1, 120.0);
    assert!(c.is_audio_stopped());
    assert_eq!(c.wiggle_offset(2.0), 0.0);

    c.start_playing();
    c.advance(0.1, 120.0);
    let w = c.wiggle_offset(2.0);
    let expected = ((c.phase() * 2.0).sin() as f32) * WIGGLE_AMPLITUDE;
    assert!((w - expected).abs() < 1e-6);
    assert!(w != 0.0);

    c.stop_playing();
    assert_eq!(c.wiggle_offset(2.0), 0.0);
}

#[test]
fn bounce_restarts_after_half_turn() {
    let mut c = AnimationClock::new();
    assert_eq!(c.bounce_scale(), 1.0);
    // π/2 per step at 120 bpm with quarter-second frames.
    c.advance_bounce(0.25, 120.0);
    assert!(c.bounce_scale() < 1e-6);
    c.advance_bounce(0.25, 120.0);
    assert!((c.bounce_scale() - 1.0).abs() < 1e-6);
    c.advance_bounce(0.25, 120.0);
    assert!(c.beat_phase() > PI);
    c.advance_bounce(0.25, 120.0);
    assert_eq!(c.beat_phase(), 0.0);
    assert_eq!(c.bounce_scale(), 1.0);
}

#[test]
fn bounce_scale_stays_in_unit_range() {
    let mut c = AnimationClock::new();
    for _ in 0..500 {
        c.advance_bounce(1.0 / 60.0, 190.0);
        let s = c.bounce_scale();
        assert!((0.0..=1.0).contains(&s), "{s}");
    }
}

#[test]
fn orbitals_are_a_quarter_turn_apart() {
    let mut c = AnimationClock::new();
    c.advance(0.37, 97.0);
    for i in 1..8 {
        let d = c.orbit_angle(i) - c.orbit_angle(i - 1);
        assert!((d - FRAC_PI_2).abs() < 1e-12, "orbital {i}");
    }
    assert!((c.orbit_angle(0) - (c.phase() + c.curve_phase())).abs() < 1e-12);
}
