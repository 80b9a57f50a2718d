use glam::Vec3;

/// HSV to linear RGB in \[0, 1\].
///
/// `hue_degrees` wraps, so any finite angle (including negative ones and
/// values past 360) is valid. Saturation and value are clamped.
pub fn angle_to_rgb(hue_degrees: f32, saturation: f32, value: f32) -> Vec3 {
    let h = if hue_degrees.is_finite() {
        wrap_degrees(hue_degrees) / 60.0
    } else {
        0.0
    };
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    let (r, g, b) = match sector as i32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Vec3::new(r, g, b)
}

/// Wraps an angle into \[0, 360).
///
/// `rem_euclid` rounds tiny negative angles up to exactly 360.0.
#[inline]
pub fn wrap_degrees(degrees: f32) -> f32 {
    let d = degrees.rem_euclid(360.0);
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Hue in degrees for an animation phase in radians.
#[inline]
pub fn phase_to_hue(phase: f64) -> f32 {
    wrap_degrees(phase.to_degrees().rem_euclid(360.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn primaries() {
        assert!(close(angle_to_rgb(0.0, 1.0, 1.0), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(angle_to_rgb(120.0, 1.0, 1.0), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(angle_to_rgb(240.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn hue_wraps_both_ways() {
        assert!(close(angle_to_rgb(-120.0, 1.0, 1.0), angle_to_rgb(240.0, 1.0, 1.0)));
        assert!(close(angle_to_rgb(720.0 + 60.0, 0.5, 0.8), angle_to_rgb(60.0, 0.5, 0.8)));
    }

    #[test]
    fn tiny_negative_hue_is_red() {
        assert_eq!(wrap_degrees(-1e-6), 0.0);
        assert!(close(angle_to_rgb(-1e-6, 1.0, 1.0), Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn zero_saturation_is_grey() {
        let c = angle_to_rgb(200.0, 0.0, 0.4);
        assert!(close(c, Vec3::splat(0.4)));
    }
}
