//! Live relief map viewer.
//! Resize the window to re-render, S saves a PNG snapshot, R rerolls the
//! seed, Escape exits.

use std::error::Error;
use std::time::{Duration, Instant};

use clap::Parser;
use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};

use relief_map::geography::GeographyCatalog;
use relief_map::{PixelRect, PixelSink, RenderConfig, Renderer};

/// Size must hold still this long before a resize re-renders.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "relief_viewer")]
#[command(about = "Interactive shaded-relief map viewer")]
struct Args {
    /// Initial window width
    #[arg(short = 'W', long, default_value = "600")]
    width: u32,

    /// Initial window height
    #[arg(short = 'H', long, default_value = "720")]
    height: u32,

    /// Master seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u32>,
}

/// 0RGB framebuffer in the layout minifb expects.
struct WindowSink {
    buffer: Vec<u32>,
    width: u32,
    height: u32,
}

impl WindowSink {
    fn new() -> Self {
        Self { buffer: Vec::new(), width: 0, height: 0 }
    }
}

impl PixelSink for WindowSink {
    fn begin_frame(&mut self, width: u32, height: u32) -> relief_map::Result<()> {
        self.width = width;
        self.height = height;
        self.buffer.clear();
        self.buffer.resize(width as usize * height as usize, 0);
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let [r, g, b, _] = rgba;
            self.buffer[(y * self.width + x) as usize] = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        }
    }

    fn write_buffer(&mut self, rect: PixelRect, pixels: &[u8]) {
        if rect == PixelRect::full(self.width, self.height) {
            for (dst, px) in self.buffer.iter_mut().zip(pixels.chunks_exact(4)) {
                *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
            }
            return;
        }
        for (i, px) in pixels.chunks_exact(4).enumerate() {
            let i = i as u32;
            self.set_pixel(rect.x + i % rect.width, rect.y + i / rect.width, [px[0], px[1], px[2], px[3]]);
        }
    }
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Viewer error: {}", e);
        std::process::exit(1);
    }
}

fn create_renderer(sink: WindowSink, width: u32, height: u32, seed: u32) -> relief_map::Result<Renderer<WindowSink>> {
    println!("Rendering with seed: {}...", seed);
    let config = RenderConfig::default().with_master_seed(seed);
    let mut renderer = Renderer::create(sink, width, height, GeographyCatalog::british_isles(), config)?;
    renderer.render()?;
    Ok(renderer)
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut window = Window::new(
        "Relief Map - S: Save, R: Reroll, Esc: Exit",
        args.width as usize,
        args.height as usize,
        WindowOptions {
            resize: true,
            scale_mode: ScaleMode::Stretch,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    let mut seed = args.seed.unwrap_or_else(rand::random);
    let mut renderer = create_renderer(WindowSink::new(), args.width, args.height, seed)?;

    println!("Viewer started. Controls:");
    println!("  S: Save snapshot");
    println!("  R: Reroll seed");
    println!("  Esc: Exit");

    // Last observed window size and when it last changed
    let mut pending = (args.width, args.height);
    let mut changed_at = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let (w, h) = window.get_size();
        let size = (w as u32, h as u32);
        if size != pending {
            pending = size;
            changed_at = Instant::now();
        }
        if pending != renderer.size() && changed_at.elapsed() >= RESIZE_DEBOUNCE {
            println!("Resizing to {}x{}", pending.0, pending.1);
            renderer.resize(pending.0, pending.1)?;
        }

        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            seed = rand::random();
            let (width, height) = renderer.size();
            let sink = renderer.destroy()?;
            renderer = create_renderer(sink, width, height, seed)?;
        }

        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            let path = format!("relief_{}.png", seed);
            match renderer.to_blob() {
                Ok(bytes) => match std::fs::write(&path, bytes) {
                    Ok(()) => println!("Saved snapshot to: {}", path),
                    Err(e) => eprintln!("Failed to save snapshot: {}", e),
                },
                Err(e) => eprintln!("Failed to encode snapshot: {}", e),
            }
        }

        match renderer.surface() {
            Some(sink) if !sink.buffer.is_empty() => {
                window.update_with_buffer(&sink.buffer, sink.width as usize, sink.height as usize)?;
            }
            _ => window.update(),
        }
    }

    renderer.destroy()?;
    Ok(())
}
