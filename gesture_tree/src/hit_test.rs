//! Camera projection and the ornament hit-test handed to the scene
//! controller.
//!
//! The hit-test works on what was last drawn: after each frame the render
//! loop refreshes it with the projected ornament positions, so a pinch picks
//! the ornament the user actually saw under their fingers.

use glam::{Mat4, Quat, Vec3};
use tree_scene::OrnamentResolver;

// ════════════════════════════════════════════════════════════════════════════
// Camera
// ════════════════════════════════════════════════════════════════════════════

/// Orbit camera looking at the tree's middle.  The scene, not the camera,
/// rotates: `yaw` spins the world about the vertical axis.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub target:   Vec3,
    pub distance: f32,
    pub height:   f32,
    pub fov_y:    f32,
    pub yaw:      f32,
}

impl Camera {
    pub fn for_tree(tree_height: f32, chaos_radius: f32) -> Self {
        Camera {
            target:   Vec3::new(0.0, tree_height * 0.5, 0.0),
            distance: chaos_radius * 2.2,
            height:   tree_height * 0.15,
            fov_y:    45f32.to_radians(),
            yaw:      0.0,
        }
    }

    fn view_projection(&self, aspect: f32) -> Mat4 {
        let eye  = self.target + Vec3::new(0.0, self.height, self.distance);
        let view = Mat4::look_at_rh(eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, 0.1, 100.0);
        proj * view * Mat4::from_quat(Quat::from_rotation_y(self.yaw))
    }

    /// A projector for one frame at the given framebuffer size.
    pub fn projector(&self, width: usize, height: usize) -> Projector {
        let aspect = width as f32 / height.max(1) as f32;
        Projector {
            vp:     self.view_projection(aspect),
            width:  width as f32,
            height: height as f32,
            focal:  height as f32 / (2.0 * (self.fov_y * 0.5).tan()),
        }
    }
}

/// A world point mapped to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    /// Pixel coordinates, top-left origin.
    pub x:     f32,
    pub y:     f32,
    /// Distance along the view axis; smaller is nearer.
    pub depth: f32,
    /// Pixels per world unit at this depth.
    pub scale: f32,
}

pub struct Projector {
    vp:     Mat4,
    width:  f32,
    height: f32,
    focal:  f32,
}

impl Projector {
    /// `None` when the point is behind the camera.
    pub fn project(&self, p: Vec3) -> Option<ScreenPoint> {
        let clip = self.vp * p.extend(1.0);
        if clip.w <= 1e-4 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(ScreenPoint {
            x:     (ndc.x * 0.5 + 0.5) * self.width,
            y:     (0.5 - ndc.y * 0.5) * self.height,
            depth: clip.w,
            scale: self.focal / clip.w,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ProjectedHitTest
// ════════════════════════════════════════════════════════════════════════════

/// Hit-test over the ornaments as they were last drawn.
#[derive(Debug, Default)]
pub struct ProjectedHitTest {
    points: Vec<Option<ScreenPoint>>,
    width:  f32,
    height: f32,
    /// Ornament world radius; the pick circle is this, projected, plus slack.
    radius: f32,
}

/// Extra pick radius in pixels so small, distant ornaments stay pickable.
const PICK_SLACK_PX: f32 = 14.0;

impl ProjectedHitTest {
    pub fn new(ornament_radius: f32) -> Self {
        ProjectedHitTest { radius: ornament_radius, ..ProjectedHitTest::default() }
    }

    /// Replace the projected positions; index `i` is ornament `i`.
    pub fn update(&mut self, points: Vec<Option<ScreenPoint>>, width: usize, height: usize) {
        self.points = points;
        self.width  = width as f32;
        self.height = height as f32;
    }

    pub fn points(&self) -> &[Option<ScreenPoint>] { &self.points }
}

impl OrnamentResolver for ProjectedHitTest {
    fn resolve_ornament_at(&self, screen_x: f32, screen_y: f32) -> Option<usize> {
        let px = screen_x * self.width;
        let py = (1.0 - screen_y) * self.height;

        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
            .filter(|(_, p)| {
                let r = self.radius * p.scale + PICK_SLACK_PX;
                let (dx, dy) = (p.x - px, p.y - py);
                dx * dx + dy * dy <= r * r
            })
            .min_by(|(_, a), (_, b)| a.depth.total_cmp(&b.depth))
            .map(|(i, _)| i)
    }

    fn ornament_count(&self) -> usize {
        self.points.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32, depth: f32) -> Option<ScreenPoint> {
        Some(ScreenPoint { x, y, depth, scale: 10.0 })
    }

    #[test]
    fn camera_target_projects_to_centre() {
        let cam = Camera::for_tree(6.0, 7.0);
        let p = cam.projector(800, 600).project(cam.target).unwrap();
        assert!((p.x - 400.0).abs() < 0.5);
        assert!((p.y - 300.0).abs() < 0.5);
    }

    #[test]
    fn yaw_moves_off_axis_points() {
        let mut cam = Camera::for_tree(6.0, 7.0);
        let side = Vec3::new(2.0, 3.0, 0.0);
        let before = cam.projector(800, 600).project(side).unwrap();
        cam.yaw = std::f32::consts::FRAC_PI_2;
        let after = cam.projector(800, 600).project(side).unwrap();
        assert!((before.x - after.x).abs() > 10.0);
    }

    #[test]
    fn points_behind_camera_are_dropped() {
        let cam = Camera::for_tree(6.0, 7.0);
        let behind = cam.target + Vec3::new(0.0, 0.0, cam.distance * 2.0);
        assert!(cam.projector(800, 600).project(behind).is_none());
    }

    #[test]
    fn hit_uses_bottom_left_origin() {
        let mut ht = ProjectedHitTest::new(0.2);
        // Ornament 0 drawn near the top-left of a 100×100 frame.
        ht.update(vec![pt(10.0, 10.0, 5.0), pt(90.0, 90.0, 5.0)], 100, 100);
        assert_eq!(ht.resolve_ornament_at(0.1, 0.9), Some(0));
        assert_eq!(ht.resolve_ornament_at(0.9, 0.1), Some(1));
        assert_eq!(ht.resolve_ornament_at(0.5, 0.5), None);
        assert_eq!(ht.ornament_count(), 2);
    }

    #[test]
    fn nearest_ornament_wins_overlap() {
        let mut ht = ProjectedHitTest::new(0.2);
        ht.update(vec![pt(50.0, 50.0, 9.0), pt(52.0, 50.0, 4.0), None], 100, 100);
        assert_eq!(ht.resolve_ornament_at(0.5, 0.5), Some(1));
        assert_eq!(ht.ornament_count(), 3);
    }
}
