//! Top-level application state machine.
//!
//! `AppState` owns the gesture interpreter, the scene controller, and the
//! animated ornaments and foliage.  Each window frame it takes the landmark
//! samples that arrived, turns them into scene intents, advances the
//! animation, and refreshes the ornament hit-test from the new projection.

use std::sync::mpsc;
use std::time::Instant;

use gesture_intent::{FrameEvents, GestureInterpreter, LandmarkFrame, SceneEvent};
use thiserror::Error;
use tracing::{debug, info};
use tree_scene::{OrnamentArena, ParticleField, SceneController, SceneLayout, SceneSnapshot};

use crate::config::{AppConfig, ConfigError, SourceKind};
use crate::hit_test::{Camera, ProjectedHitTest, Projector, ScreenPoint};
use crate::source::{
    CommandLandmarkSource, GestureSession, ReplayLandmarkSource, SimInput, SimLandmarkSource,
};
use crate::visualizer::{star_position, Visualizer, WindowInput, ORNAMENT_RADIUS};

/// Rotation speeds are per frame at this rate.
const REFERENCE_FPS: f32 = 60.0;
/// Longest step the animation takes, so a stalled frame does not teleport.
const MAX_DT: f32 = 0.1;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── intent ───────────────────────────────────────────────────────────
    interpreter: GestureInterpreter,
    scene:       SceneController<ProjectedHitTest>,

    // ── animation ────────────────────────────────────────────────────────
    arena:       OrnamentArena,
    field:       ParticleField,
    camera:      Camera,
    tree_height: f32,

    // ── framebuffer size the hit-test projects into ──────────────────────
    width:  usize,
    height: usize,
    star:   Option<ScreenPoint>,

    /// Arrow-key rotation; overrides the wrist while held.
    manual_rotation: Option<f32>,

    // ── status message ────────────────────────────────────────────────────
    pub status: String,
}

impl AppState {
    pub fn new(cfg: &AppConfig, width: usize, height: usize) -> Self {
        let scene_cfg = &cfg.scene;
        let layout  = SceneLayout::generate(scene_cfg);
        let initial = scene_cfg.initial_formation;

        let mut app = AppState {
            interpreter: GestureInterpreter::new(cfg.interpreter.clone()),
            scene: SceneController::new(
                ProjectedHitTest::new(ORNAMENT_RADIUS),
                initial,
                scene_cfg.seed,
            ),
            arena:       OrnamentArena::from_layout(&layout, initial),
            field:       ParticleField::from_layout(&layout, initial),
            camera:      Camera::for_tree(scene_cfg.tree_height, scene_cfg.chaos_radius),
            tree_height: scene_cfg.tree_height,
            width,
            height,
            star:            None,
            manual_rotation: None,
            status:          "waiting for landmarks…".to_string(),
        };
        app.refresh_projection();
        app
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Interpret one recognizer result and apply it to the scene.
    pub fn handle_frame(&mut self, frame: &LandmarkFrame) -> FrameEvents {
        let events = self.interpreter.interpret(frame);
        if events.formation.is_some() || events.pinch.is_some() {
            debug!(?events, "frame intents");
        }
        self.scene.apply_frame(events);
        events
    }

    /// Apply keyboard controls.
    pub fn handle_window(&mut self, input: WindowInput) {
        if input.toggle_formation {
            let next = self.scene.formation().toggled();
            info!(formation = next.name(), "formation toggled from keyboard");
            self.scene.apply(SceneEvent::SetFormation(next));
        }
        self.manual_rotation = input.manual_rotation;
    }

    pub fn set_source_status(&mut self, status: String) {
        info!(status = status.as_str(), "landmark source");
        self.status = status;
    }

    // ── per-frame logic ───────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_DT);
        let speed = self.manual_rotation.unwrap_or_else(|| self.scene.rotation_speed());
        self.camera.yaw += speed * dt * REFERENCE_FPS;

        let formation = self.scene.formation();
        self.arena.tick(formation, self.scene.selected(), dt);
        self.field.tick(formation, dt);
        self.refresh_projection();
    }

    /// Re-project the ornaments so the next pinch hits what is on screen.
    fn refresh_projection(&mut self) {
        let projector = self.projector();
        let points = self.arena.iter().map(|o| projector.project(o.position)).collect();
        self.star = projector.project(star_position(self.tree_height));
        self.scene.resolver_mut().update(points, self.width, self.height);
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn snapshot(&self)  -> SceneSnapshot   { self.scene.snapshot() }
    pub fn arena(&self)     -> &OrnamentArena  { &self.arena }
    pub fn field(&self)     -> &ParticleField  { &self.field }
    pub fn angle(&self)     -> f32             { self.camera.yaw }
    pub fn star(&self)      -> Option<ScreenPoint> { self.star }

    pub fn projector(&self) -> Projector {
        self.camera.projector(self.width, self.height)
    }

    pub fn ornament_points(&self) -> &[Option<ScreenPoint>] {
        self.scene.resolver().points()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Main loop
// ════════════════════════════════════════════════════════════════════════════

/// Start the landmark source chosen by `cfg.source`.
///
/// The simulated hand also returns the sender the window feeds it through.
fn start_source(cfg: &AppConfig) -> Result<(GestureSession, Option<mpsc::Sender<SimInput>>), AppError> {
    let src = &cfg.source;
    Ok(match src.kind {
        SourceKind::Sim => {
            let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
            (GestureSession::spawn(SimLandmarkSource { rx: sim_rx }), Some(sim_tx))
        }
        SourceKind::Command => {
            let program = src.command.clone().ok_or_else(|| {
                ConfigError::Invalid("source.kind = \"command\" needs source.command".into())
            })?;
            let session = GestureSession::spawn(CommandLandmarkSource {
                program,
                args:       src.args.clone(),
                ready_line: src.ready_line.clone(),
            });
            (session, None)
        }
        SourceKind::Replay => {
            let path = src.replay_path.clone().ok_or_else(|| {
                ConfigError::Invalid("source.kind = \"replay\" needs source.replay_path".into())
            })?;
            (GestureSession::spawn(ReplayLandmarkSource { path, fps: src.replay_fps }), None)
        }
    })
}

pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;
    info!(source = ?cfg.source.kind, "starting gesture tree");

    // ── Landmark source ───────────────────────────────────────────────────
    let (mut session, sim_tx) = start_source(&cfg)?;

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let win = &cfg.window;
    let mut vis = Visualizer::new(win.width, win.height, win.fps, sim_tx)
        .map_err(AppError::Window)?;

    // ── App state ─────────────────────────────────────────────────────────
    let (width, height) = vis.size();
    let mut app = AppState::new(&cfg, width, height);
    let mut last = Instant::now();

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input (also feeds the simulated hand)
        let input = vis.poll_input();
        if input.quit { break; }
        app.handle_window(input);

        // 2. Drain every landmark sample that arrived, in order
        let drained = session.poll();
        if let Some(status) = drained.status {
            app.set_source_status(status);
        }
        for frame in &drained.samples {
            app.handle_frame(frame);
        }

        // 3. Per-frame logic
        let now = Instant::now();
        app.tick(now.duration_since(last).as_secs_f32());
        last = now;

        // 4. Render
        let projector = app.projector();
        vis.render(
            &app.snapshot(),
            app.arena(),
            app.field(),
            &projector,
            app.ornament_points(),
            app.star(),
            &app.status,
        );
    }

    session.shutdown();
    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{synthesize_hand, SimPose};
    use gesture_intent::{Formation, PinchEdge};
    use tree_scene::OrnamentResolver;

    const W: usize = 320;
    const H: usize = 240;

    fn make_app(initial: Formation) -> AppState {
        let mut cfg = AppConfig::default();
        cfg.scene.ornament_count    = 12;
        cfg.scene.particle_count    = 40;
        cfg.scene.initial_formation = initial;
        AppState::new(&cfg, W, H)
    }

    fn hand(x: f32, y: f32, pose: SimPose) -> LandmarkFrame {
        synthesize_hand(x, y, pose).into_frame()
    }

    #[test]
    fn starts_in_configured_formation_with_projection() {
        let app = make_app(Formation::Chaos);
        let snap = app.snapshot();
        assert_eq!(snap.formation, Formation::Chaos);
        assert_eq!(snap.selected_ornament, None);
        assert_eq!(app.ornament_points().len(), 12);
    }

    #[test]
    fn space_toggles_formation() {
        let mut app = make_app(Formation::Formed);
        app.handle_window(WindowInput { toggle_formation: true, ..WindowInput::default() });
        assert_eq!(app.snapshot().formation, Formation::Chaos);
        app.handle_window(WindowInput { toggle_formation: true, ..WindowInput::default() });
        assert_eq!(app.snapshot().formation, Formation::Formed);
    }

    #[test]
    fn open_palm_then_fist() {
        let mut app = make_app(Formation::Formed);
        let open = SimPose { open_palm: true, ..SimPose::default() };
        app.handle_frame(&hand(0.5, 0.5, open));
        assert_eq!(app.snapshot().formation, Formation::Chaos);

        let fist = SimPose { closed_fist: true, ..SimPose::default() };
        app.handle_frame(&hand(0.5, 0.5, fist));
        assert_eq!(app.snapshot().formation, Formation::Formed);
    }

    #[test]
    fn pinch_selects_ornament_under_fingers() {
        let mut app = make_app(Formation::Chaos);

        let (x, y) = app
            .ornament_points()
            .iter()
            .flatten()
            .map(|p| (p.x / W as f32, p.y / H as f32))
            .find(|&(x, y)| (0.1..0.9).contains(&x) && (0.1..0.9).contains(&y))
            .expect("an ornament on screen");

        let pinch = SimPose { pinch: true, ..SimPose::default() };
        let events = app.handle_frame(&hand(x, y, pinch));
        let Some(PinchEdge::Start { x: px, y: py }) = events.pinch else {
            panic!("expected pinch start, got {:?}", events.pinch);
        };
        let expected = app.scene.resolver().resolve_ornament_at(px, py);
        assert!(expected.is_some());
        assert_eq!(app.snapshot().selected_ornament, expected);

        // Releasing the fingers clears the selection.
        app.handle_frame(&hand(x, y, SimPose::default()));
        assert_eq!(app.snapshot().selected_ornament, None);
    }

    #[test]
    fn hand_leaving_releases_selection() {
        let mut app = make_app(Formation::Chaos);
        let pinch = SimPose { pinch: true, ..SimPose::default() };
        app.handle_frame(&hand(0.5, 0.5, pinch));
        assert!(app.snapshot().selected_ornament.is_some());

        app.handle_frame(&LandmarkFrame::empty());
        let snap = app.snapshot();
        assert_eq!(snap.selected_ornament, None);
        assert_eq!(snap.rotation_speed, 0.0);
    }

    #[test]
    fn manual_rotation_overrides_wrist() {
        let mut app = make_app(Formation::Formed);
        // Wrist far left: the gesture asks for a positive speed.
        app.handle_frame(&hand(0.1, 0.5, SimPose::default()));
        assert!(app.snapshot().rotation_speed > 0.0);

        app.handle_window(WindowInput { manual_rotation: Some(-0.04), ..WindowInput::default() });
        let before = app.angle();
        app.tick(1.0 / 60.0);
        assert!((app.angle() - before + 0.04).abs() < 1e-4);

        app.handle_window(WindowInput::default());
        let before = app.angle();
        app.tick(1.0 / 60.0);
        assert!(app.angle() > before);
    }

    #[test]
    fn tick_moves_ornaments_toward_new_formation() {
        let mut app = make_app(Formation::Formed);
        let start: Vec<_> = app.arena().iter().map(|o| o.position).collect();
        app.handle_window(WindowInput { toggle_formation: true, ..WindowInput::default() });
        for _ in 0..10 {
            app.tick(1.0 / 60.0);
        }
        let moved = app.arena().iter().zip(&start).filter(|(o, s)| o.position.distance(**s) > 1e-3).count();
        assert!(moved > 0);
        assert_eq!(app.ornament_points().len(), 12);
    }
}
