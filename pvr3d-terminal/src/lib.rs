/// Terminal front end: drives a `Renderer` and rasterizes into ASCII
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::{debug, info, warn};
use pvr3d_core::math::{self, Vec3};
use pvr3d_core::{
    Buttons, ControllerState, InputSource, Light, MatrixMode, ModelHandle, Renderer,
    ResourceError, TextureHandle,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod input;
pub mod renderer;

pub use input::KeyboardInput;
pub use renderer::AsciiRenderer;

const ROTATE_STEP: f32 = 5.0;
const ZOOM_STEP: f32 = 0.25;
const NEAR_PLANE: f32 = 0.1;
/// Keeps the built-in cube (half-diagonal sqrt(3)) in front of the near plane
const MIN_DISTANCE: f32 = 2.5;
const MAX_DISTANCE: f32 = 40.0;

/// Camera and model pose for the demo scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    /// Degrees about the x axis
    pub pitch: f32,
    /// Degrees about the y axis
    pub yaw: f32,
    /// Degrees about the z axis
    pub roll: f32,
    pub distance: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            pitch: 20.0,
            yaw: 30.0,
            roll: 0.0,
            distance: 5.0,
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    renderer: Renderer,
    sink: AsciiRenderer,
    input: KeyboardInput,
    model: ModelHandle,
    font: Option<TextureHandle>,
    scene: Scene,
    previous: Buttons,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(
        mut renderer: Renderer,
        model: ModelHandle,
        font: Option<TextureHandle>,
        width: usize,
        height: usize,
    ) -> Self {
        renderer
            .lighting
            .set_ambient(Light::ambient(pvr3d_core::Color::WHITE, 0.25));
        renderer.lighting.set_point(Light::point(
            Vec3::new(3.0, 4.0, 2.0),
            pvr3d_core::Color::WHITE,
            0.9,
        ));
        let sink = AsciiRenderer::new(width, height, renderer.viewport());

        Self {
            renderer,
            sink,
            input: KeyboardInput::new(),
            model,
            font,
            scene: Scene::default(),
            previous: Buttons::empty(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn sink(&self) -> &AsciiRenderer {
        &self.sink
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        info!("Entering render loop.");

        while self.running {
            let frame_start = Instant::now();

            let state = self.input.read_state()?;
            if !state.buttons.is_empty() {
                debug!("{}", state);
            }
            if let Some((width, height)) = self.input.take_resize() {
                self.sink.resize(width as usize, height as usize);
            }
            self.apply_input(&state);

            self.draw_frame();
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("Leaving render loop.");
        Ok(())
    }

    /// Update the scene from one controller snapshot.
    pub fn apply_input(&mut self, state: &ControllerState) {
        let pressed = |button| state.test_button(button, true);

        if pressed(Buttons::START) {
            self.running = false;
            return;
        }

        if pressed(Buttons::DPAD_UP) {
            self.scene.pitch -= ROTATE_STEP;
        }
        if pressed(Buttons::DPAD_DOWN) {
            self.scene.pitch += ROTATE_STEP;
        }
        if pressed(Buttons::DPAD_LEFT) {
            self.scene.yaw -= ROTATE_STEP;
        }
        if pressed(Buttons::DPAD_RIGHT) {
            self.scene.yaw += ROTATE_STEP;
        }
        self.scene.roll +=
            (state.trigger_r as f32 - state.trigger_l as f32) / 255.0 * ROTATE_STEP;

        if pressed(Buttons::A) {
            self.scene.distance = (self.scene.distance - ZOOM_STEP).max(MIN_DISTANCE);
        }
        if pressed(Buttons::B) {
            self.scene.distance = (self.scene.distance + ZOOM_STEP).min(MAX_DISTANCE);
        }

        // Toggle on the press edge only
        if pressed(Buttons::X) && !self.previous.contains(Buttons::X) {
            let enabled = !self.renderer.lighting_enabled();
            self.renderer.set_lighting_enabled(enabled);
            info!("Lighting {}", if enabled { "enabled" } else { "disabled" });
        }
        self.previous = state.buttons;

        // Continuous slow rotation for demo effect
        self.scene.yaw += 0.5;
    }

    /// Submit one frame of the scene to the ASCII sink.
    pub fn draw_frame(&mut self) {
        let scene = self.scene;
        let aspect = self.renderer.viewport().aspect();
        let sink = &mut self.sink;
        let renderer = &mut self.renderer;

        renderer.begin_frame(sink);

        renderer.transform.select(MatrixMode::Projection);
        renderer.transform.load_identity();
        renderer
            .transform
            .perspective(math::deg_to_rad(60.0), aspect, NEAR_PLANE, 100.0);

        renderer.transform.select(MatrixMode::ModelView);
        renderer.transform.load_identity();
        if renderer.transform.push().is_ok() {
            renderer.transform.translate(0.0, 0.0, -scene.distance);
            let rotations = [
                (scene.pitch, 1.0, 0.0, 0.0),
                (scene.yaw, 0.0, 1.0, 0.0),
                (scene.roll, 0.0, 0.0, 1.0),
            ];
            for (angle, x, y, z) in rotations {
                if let Err(e) = renderer.transform.rotate(math::deg_to_rad(angle), x, y, z) {
                    warn!("Skipping rotation: {}", e);
                }
            }
            renderer.transform.recompute_combined();

            if let Err(e) = renderer.draw_model(self.model, sink) {
                warn!("Failed to draw model: {}", e);
            }
            if let Err(e) = renderer.transform.pop() {
                warn!("Failed to restore model-view matrix: {}", e);
            }
        }

        if let Some(font) = self.font {
            let info = renderer.vram_info();
            let label = format!("{} tris", info.vertex_count / 3);
            if let Err(e) = draw_label(renderer, font, &label, sink) {
                warn!("Failed to draw label: {}", e);
            }
        }

        renderer.end_frame(sink);
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        self.sink.draw(&mut stdout)?;

        // Draw UI overlay
        let info = self.renderer.vram_info();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "PVR3D | FPS: {:.1} | verts: {} ({:.1} KiB) | tex: {} | light: {} | Arrows=Rotate Z/X=Zoom L=Light Q=Quit",
                self.fps,
                info.vertex_count,
                info.vertex_memory as f32 / 1024.0,
                info.texture_count,
                if self.renderer.lighting_enabled() { "on" } else { "off" },
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

fn draw_label(
    renderer: &mut Renderer,
    font: TextureHandle,
    label: &str,
    sink: &mut AsciiRenderer,
) -> Result<usize, ResourceError> {
    let size = 16.0;
    let y = renderer.viewport().height - size - 4.0;
    renderer.draw_text(font, size, 4.0, y, label, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvr3d_core::{Config, Mesh};

    fn app() -> TerminalApp {
        let mut renderer = Renderer::new(Config::default()).unwrap();
        renderer.initialize();
        let model = renderer.models.insert(Mesh::cube(2.0), None, false).unwrap();
        TerminalApp::new(renderer, model, None, 64, 24)
    }

    fn state(buttons: Buttons) -> ControllerState {
        ControllerState {
            buttons,
            ..Default::default()
        }
    }

    #[test]
    fn test_draw_frame_covers_center() {
        let mut app = app();
        app.draw_frame();

        assert!(app.sink().coverage() > 0);
        assert_ne!(app.sink().cell(32, 12).unwrap().character, ' ');
        assert_eq!(app.renderer().vram_info().vertex_count, 36);
    }

    #[test]
    fn test_loaded_obj_renders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "v -1 -1 0\nv 1 -1 0\nv 0 1 0").unwrap();
        writeln!(file, "vt 0 0\nvt 1 0\nvt 0.5 1").unwrap();
        writeln!(file, "f 1/1 2/2 3/3").unwrap();

        let mut renderer = Renderer::default();
        let model = renderer.models.load_obj(file.path(), None, false).unwrap();
        let mut app = TerminalApp::new(renderer, model, None, 40, 20);
        app.draw_frame();

        assert_eq!(app.renderer().vram_info().vertex_count, 3);
        assert!(app.sink().coverage() > 0);
    }

    #[test]
    fn test_closest_zoom_keeps_cube_in_front() {
        assert!(MIN_DISTANCE > 3.0f32.sqrt() + NEAR_PLANE);

        let mut app = app();
        for _ in 0..100 {
            app.apply_input(&state(Buttons::A));
        }
        // Corner pointing straight at the eye
        app.scene.pitch = 35.26;
        app.scene.yaw = 45.0;
        app.draw_frame();

        assert_eq!(app.scene().distance, MIN_DISTANCE);
        assert_eq!(app.renderer().vram_info().vertex_count, 36);
    }

    #[test]
    fn test_start_exits() {
        let mut app = app();
        app.apply_input(&state(Buttons::START));
        assert!(!app.is_running());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut app = app();
        for _ in 0..100 {
            app.apply_input(&state(Buttons::A));
        }
        assert_eq!(app.scene().distance, MIN_DISTANCE);

        for _ in 0..1000 {
            app.apply_input(&state(Buttons::B));
        }
        assert_eq!(app.scene().distance, MAX_DISTANCE);
    }

    #[test]
    fn test_lighting_toggles_on_press_edge() {
        let mut app = app();
        app.apply_input(&state(Buttons::X));
        app.apply_input(&state(Buttons::X));
        assert!(app.renderer().lighting_enabled());

        app.apply_input(&state(Buttons::empty()));
        app.apply_input(&state(Buttons::X));
        assert!(!app.renderer().lighting_enabled());
    }

    #[test]
    fn test_dpad_rotates() {
        let mut app = app();
        let before = app.scene();
        app.apply_input(&state(Buttons::DPAD_UP | Buttons::DPAD_RIGHT));
        assert_eq!(app.scene().pitch, before.pitch - ROTATE_STEP);
        assert_eq!(app.scene().yaw, before.yaw + ROTATE_STEP + 0.5);
    }
}
