use glam::{Mat4, Quat, Vec2, Vec3};

const RADIUS: f32 = 1.0;

/// Arcball rotation driven by mouse drags over the viewport.
#[derive(Clone, Debug)]
pub struct DragOrientation {
    width: f32,
    height: f32,
    last: Vec2,
    rotation: Quat,
    dragging: bool,
}

impl Default for DragOrientation {
    fn default() -> Self {
        Self::new()
    }
}

impl DragOrientation {
    pub fn new() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            last: Vec2::ZERO,
            rotation: Quat::IDENTITY,
            dragging: false,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    pub fn mouse_down(&mut self, x: f32, y: f32) {
        self.last = self.to_proportion(x, y);
        self.dragging = true;
    }

    pub fn mouse_drag(&mut self, x: f32, y: f32) {
        if !self.dragging {
            return;
        }
        let from = project_on_sphere(self.last);
        self.last = self.to_proportion(x, y);
        let to = project_on_sphere(self.last);
        if let Some(step) = rotation_between(from, to) {
            self.rotation = (step * self.rotation).normalize();
        }
    }

    pub fn mouse_up(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    /// Pixel position to \[-1, 1\] around the viewport centre, y up.
    fn to_proportion(&self, x: f32, y: f32) -> Vec2 {
        let scale = self.width.min(self.height) / 2.0;
        if scale <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (x - self.width / 2.0) / scale,
            (self.height / 2.0 - y) / scale,
        )
    }
}

/// Sphere near the centre, hyperbolic sheet further out, so points off the
/// ball still rotate smoothly.
fn project_on_sphere(p: Vec2) -> Vec3 {
    let r2 = RADIUS * RADIUS;
    let xy2 = p.length_squared();
    let z = if xy2 < r2 * 0.5 {
        (r2 - xy2).sqrt()
    } else {
        r2 / (2.0 * xy2.sqrt())
    };
    Vec3::new(p.x, p.y, z)
}

fn rotation_between(from: Vec3, to: Vec3) -> Option<Quat> {
    let axis = from.cross(to);
    if axis.length_squared() < 1e-12 {
        return None;
    }
    let d = ((to - from).length() / (2.0 * RADIUS)).clamp(-1.0, 1.0);
    Some(Quat::from_axis_angle(axis.normalize(), 2.0 * d.asin()))
}
