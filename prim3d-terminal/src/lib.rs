/// Terminal front end: drives the render core through the ASCII rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use prim3d_core::{Camera, CameraConfig, Mat44, RenderCore, SolidKind, Transform, Vec3};
use std::f32::consts::PI;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod logging;
pub mod renderer;

pub use logging::{init_logging, LoggingConfig};
pub use renderer::{AsciiGpu, SoftwareShaders};

/// Terminal rows are roughly twice as tall as columns are wide.
const CELL_ASPECT: u32 = 2;

const SLIDE_STEP: f32 = 0.5;
const SPIN_STEP: f32 = 0.005;
const SOLID_SCALE: f32 = 2.0;
const SOLID_SPACING: f32 = 3.0;

/// Colors cycled with `c`.
const PALETTE: [[f32; 3]; 4] = [[0.8, 0.8, 0.8], [0.9, 0.3, 0.2], [0.2, 0.8, 0.3], [0.3, 0.4, 0.9]];

fn render_failure(err: prim3d_core::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    camera: Camera,
    core: RenderCore<AsciiGpu>,
    angle: f32,
    spin: f32,
    color: usize,
    translucent: bool,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Self::with_size(width, height)
    }

    /// Build the app for a terminal of `width` x `height` cells.
    pub fn with_size(width: u16, height: u16) -> io::Result<Self> {
        let camera = Camera::new(CameraConfig {
            eye: Vec3::new(0.0, 3.0, 12.0),
            width: u32::from(width),
            height: u32::from(height) * CELL_ASPECT,
            ..CameraConfig::default()
        })
        .map_err(render_failure)?;

        // The software pipeline carries its own shading
        let gpu = AsciiGpu::new(usize::from(width), usize::from(height));
        let core = RenderCore::new(gpu, &mut SoftwareShaders, "", "").map_err(render_failure)?;

        Ok(Self {
            camera,
            core,
            angle: 0.0,
            spin: 0.02,
            color: 0,
            translucent: false,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
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

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.angle = (self.angle + self.spin) % (2.0 * PI);
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                self.handle_key(code)
            }
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('w') => self.camera.slide(0.0, 0.0, -SLIDE_STEP),
            KeyCode::Char('s') => self.camera.slide(0.0, 0.0, SLIDE_STEP),
            KeyCode::Char('a') => self.camera.slide(-SLIDE_STEP, 0.0, 0.0),
            KeyCode::Char('d') => self.camera.slide(SLIDE_STEP, 0.0, 0.0),
            KeyCode::Char('r') => self.camera.slide(0.0, SLIDE_STEP, 0.0),
            KeyCode::Char('f') => self.camera.slide(0.0, -SLIDE_STEP, 0.0),
            KeyCode::Left => self.spin -= SPIN_STEP,
            KeyCode::Right => self.spin += SPIN_STEP,
            KeyCode::Char('c') => {
                self.color = (self.color + 1) % PALETTE.len();
                self.apply_material();
            }
            KeyCode::Char('t') => {
                self.translucent = !self.translucent;
                self.apply_material();
            }
            _ => {}
        }
    }

    fn apply_material(&mut self) {
        let [r, g, b] = PALETTE[self.color];
        let alpha = if self.translucent { 0.5 } else { 1.0 };
        self.core.set_material(r, g, b, alpha);
    }

    fn resize(&mut self, width: u16, height: u16) {
        log::debug!("terminal resized to {width}x{height}");
        self.core.gpu_mut().resize(usize::from(width), usize::from(height));
        self.camera
            .set_projection(u32::from(width), u32::from(height) * CELL_ASPECT);
    }

    /// Model transform for the `slot`-th solid in the row.
    fn solid_model(&self, kind: SolidKind, slot: usize) -> prim3d_core::Result<Mat44> {
        let x = (slot as f32 - 1.5) * SOLID_SPACING;
        // Cylinder and prism are built along +Z from the origin
        let centering = match kind {
            SolidKind::Cylinder | SolidKind::Prism => Transform::translate(0.0, 0.0, -0.5),
            SolidKind::Cube | SolidKind::Sphere => Mat44::identity(),
        };
        let tumble = Transform::rotate(self.angle, &Vec3::new(1.0, 1.0, 0.0))?;
        let scale = Transform::scale_uniform(SOLID_SCALE);
        Ok(Transform::translate(x, 0.0, 0.0) * tumble * scale * centering)
    }

    /// Draw one frame into the rasterizer without touching the terminal.
    pub fn draw_scene(&mut self) -> prim3d_core::Result<()> {
        self.core.gpu_mut().clear();
        let projection = *self.camera.projection();
        let view = *self.camera.view();

        let mut centers = Vec::with_capacity(SolidKind::ALL.len());
        for (slot, kind) in SolidKind::ALL.into_iter().enumerate() {
            let model = self.solid_model(kind, slot)?;
            self.core.draw_solid(kind, &projection, &view, &model)?;
            centers.push(Vec3::new((slot as f32 - 1.5) * SOLID_SPACING, -2.5, 0.0));
        }

        // A floor line under the row with a marker below each solid
        let half = 2.0 * SOLID_SPACING;
        let floor = [Vec3::new(-half, -2.5, 0.0), Vec3::new(half, -2.5, 0.0)];
        self.core.draw_path(&projection, &view, &Mat44::identity(), &floor)?;
        self.core
            .draw_points(&projection, &view, &Mat44::identity(), &centers, None)?;
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        self.draw_scene().map_err(render_failure)?;

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.core.gpu().draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "prim3d | FPS: {:.1} | WASD/RF=Move Left/Right=Spin C=Color T=Glass Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
