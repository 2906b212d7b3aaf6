//! Desktop simulator for the fbui widget toolkit.
//!
//! Shows a small drawing board in an SDL2 window via
//! `embedded-graphics-simulator`: a canvas to draw on with the mouse, a
//! floating title, and buttons to clear the canvas or downsample it to the
//! 28x28 classifier input.
//!
//! # Usage
//!
//! ```text
//! fbui-simulator [config.bin]
//! ```
//!
//! The optional argument is a postcard-encoded `UiConfig`.
//!
//! # Key bindings
//!
//! | Key | Action              |
//! |-----|---------------------|
//! | C   | Clear the canvas    |
//! | G   | Guess               |
//! | R   | Full redraw         |
//! | Q   | Quit                |

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{debug, info, warn};

use fbui_core::ui::colors::YELLOW;
use fbui_core::ui::{
    AnimationType, Alignment, CLASSIFIER_INPUT_LEN, CLASSIFIER_INPUT_SIDE, ClassifierInput,
    LayoutType, TextSize, WidgetId, WidgetTree,
};
use fbui_core::{Framebuffer, UiConfig};

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Canvas side: eight screen pixels per classifier cell.
const CANVAS_SIDE: i32 = CLASSIFIER_INPUT_SIDE as i32 * 8;

const BRUSH_SIZE: i32 = 9;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Widgets the main loop needs to reach after building the tree.
struct Board {
    root: WidgetId,
    canvas: WidgetId,
    result: WidgetId,
    clear_requested: Rc<Cell<bool>>,
    guess_requested: Rc<Cell<bool>>,
}

fn build_board(tree: &mut WidgetTree, width: i32, height: i32) -> Board {
    let root = tree.create_container(0, 0, width, height, LayoutType::HBox);
    tree.set_padding(root, 16);
    tree.set_spacing(root, 16);
    tree.set_alignment(root, Alignment::Center);

    let canvas = tree.create_canvas(0, 0, CANVAS_SIDE, CANVAS_SIDE);
    tree.set_brush_size(canvas, BRUSH_SIZE);

    let side = tree.create_container(0, 0, 0, CANVAS_SIDE, LayoutType::VBox);
    tree.set_spacing(side, 12);

    let title = tree.create_container(0, 0, 0, 28, LayoutType::HBox);
    tree.set_justify(title, Alignment::Center);
    tree.set_animation(title, AnimationType::Floating);
    let heading = tree.create_label_auto(0, 0, "Draw a digit", TextSize::Large);
    tree.set_label_color(heading, YELLOW);

    let buttons = tree.create_container(0, 0, 0, 30, LayoutType::HBox);
    tree.set_spacing(buttons, 8);
    tree.set_justify(buttons, Alignment::Center);
    let clear = tree.create_button_auto(0, 0, "Clear", TextSize::Medium);
    let guess = tree.create_button_auto(0, 0, "Guess", TextSize::Medium);

    let result = tree.create_label_auto(0, 0, "Ink: -", TextSize::Medium);

    let structure = [
        (title, heading),
        (buttons, clear),
        (buttons, guess),
        (side, title),
        (side, buttons),
        (side, result),
        (root, canvas),
        (root, side),
    ];
    for (parent, child) in structure {
        if let Err(e) = tree.add_child(parent, child) {
            warn!("Failed to attach {:?} to {:?}: {}", child, parent, e);
        }
    }

    let clear_requested = Rc::new(Cell::new(false));
    let guess_requested = Rc::new(Cell::new(false));
    let flag = clear_requested.clone();
    tree.set_on_click(clear, move |_| flag.set(true));
    let flag = guess_requested.clone();
    tree.set_on_click(guess, move |_| flag.set(true));

    Board {
        root,
        canvas,
        result,
        clear_requested,
        guess_requested,
    }
}

/// Stamp the brush along the segment between two points so fast mouse
/// moves leave a continuous stroke.
fn stroke_line(tree: &mut WidgetTree, canvas: WidgetId, from: Point, to: Point) {
    let delta = to - from;
    let steps = delta.x.abs().max(delta.y.abs()).max(1);
    for i in 0..=steps {
        let x = from.x + delta.x * i / steps;
        let y = from.y + delta.y * i / steps;
        tree.draw_at(canvas, x, y);
    }
}

/// Summarize the classifier input on the result label and dump it to the log.
fn show_guess(tree: &mut WidgetTree, board: &Board, input: &ClassifierInput) {
    let inked = input.iter().filter(|&&v| v > 0).count();
    let percent = inked * 100 / CLASSIFIER_INPUT_LEN;
    tree.set_label_text(board.result, &format!("Ink: {}%", percent));
    tree.label_auto_size(board.result);
    if let Some(side) = tree.parent(board.result) {
        tree.update_layout(side);
    }

    for row in input.chunks(CLASSIFIER_INPUT_SIDE) {
        let line: String = row
            .iter()
            .map(|&v| match v {
                0 => '.',
                1..=127 => '+',
                _ => '#',
            })
            .collect();
        debug!("{}", line);
    }
    info!("Guess requested: {} of {} cells inked", inked, CLASSIFIER_INPUT_LEN);
}

fn load_config() -> UiConfig {
    let Some(path) = std::env::args().nth(1) else {
        return UiConfig::default();
    };
    match std::fs::read(&path).map(|bytes| UiConfig::from_bytes(&bytes)) {
        Ok(Ok(config)) => {
            info!("Loaded configuration from {}", path);
            config
        }
        Ok(Err(e)) => {
            warn!("Invalid configuration in {}: {}", path, e);
            UiConfig::default()
        }
        Err(e) => {
            warn!("Cannot read {}: {}", path, e);
            UiConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting fbui simulator");

    let config = load_config();
    let mut fb = Framebuffer::from_config(&config);
    let mut tree = WidgetTree::new(&config);
    let board = build_board(&mut tree, fb.width() as i32, fb.height() as i32);

    info!(
        "Display: {}x{} {:?} (scale {}x), {} widgets",
        fb.width(),
        fb.height(),
        fb.orientation(),
        WINDOW_SCALE,
        tree.len()
    );
    info!("Keys: C=Clear  G=Guess  R=Redraw  Q=Quit");

    let mut display = SimulatorDisplay::<Rgb565>::new(fb.physical_size());
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("fbui Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    tree.render_full(board.root, &mut fb);
    let Ok(()) = fb.flush(&mut display);
    window.update(&display);

    let mut pen: Option<Point> = None;
    let mut last_frame = Instant::now();

    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::C => board.clear_requested.set(true),
                    Keycode::G => board.guess_requested.set(true),
                    Keycode::R => tree.force_redraw(board.root),
                    _ => {}
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    let Some(point) = fb.to_logical(point) else {
                        continue;
                    };
                    tree.handle_click(board.root, point.x, point.y);
                    if tree.contains_point(board.canvas, point.x, point.y) {
                        tree.draw_at(board.canvas, point.x, point.y);
                        pen = Some(point);
                    }
                }

                SimulatorEvent::MouseMove { point } => {
                    if let Some(last) = pen
                        && let Some(point) = fb.to_logical(point)
                    {
                        stroke_line(&mut tree, board.canvas, last, point);
                        pen = Some(point);
                    }
                }

                SimulatorEvent::MouseButtonUp { .. } => pen = None,

                _ => {}
            }
        }

        // --- Button actions -----------------------------------------------
        if board.clear_requested.replace(false) {
            tree.clear_canvas(board.canvas);
            tree.set_label_text(board.result, "Ink: -");
            tree.label_auto_size(board.result);
        }
        if board.guess_requested.replace(false)
            && let Some(input) = tree.get_28x28(board.canvas)
        {
            show_guess(&mut tree, &board, &input);
        }

        // --- Tick and render ----------------------------------------------
        let now = Instant::now();
        tree.update(now.duration_since(last_frame).as_secs_f32());
        last_frame = now;

        tree.render_frame(board.root, &mut fb);
        let Ok(()) = fb.flush(&mut display);
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
