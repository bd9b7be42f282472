//! Mochi Surface Demo
//!
//! Double-buffers two surfaces over a virtual console sized to the real
//! terminal: each frame is drawn into the hidden surface, swapped in, and the
//! presented buffer is pushed to stdout.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use mochi_surface::app::Config;
use mochi_surface::console::{terminal_size, Console, TtyPresenter, VirtualConsole};
use mochi_surface::escape::{self, Colour};
use mochi_surface::{DoubleBuffer, SurfaceResult, TerminalSurface};

use nix::libc::STDOUT_FILENO;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config_path: Option<PathBuf>,
    frames: Option<u32>,
    json: bool,
    show_help: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Options::default();
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| format!("Missing value for '{}'", arg))?;
                    options.config_path = Some(PathBuf::from(path));
                },
                "-n" | "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| format!("Missing value for '{}'", arg))?;
                    let frames = value
                        .parse::<u32>()
                        .map_err(|e| format!("Invalid frame count '{}': {}", value, e))?;
                    options.frames = Some(frames);
                },
                "-j" | "--json" => options.json = true,
                "-h" | "--help" => options.show_help = true,
                other => return Err(format!("Unknown argument '{}'", other)),
            }
        }
        Ok(options)
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let options = match Options::parse(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            print_help();
            return ExitCode::FAILURE;
        },
    };

    if options.show_help {
        print_help();
        return ExitCode::SUCCESS;
    }
    let Options {
        config_path,
        frames,
        json,
        ..
    } = options;

    let mut config = match &config_path {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => Config::load_or_default(),
    };
    if let Some(frames) = frames {
        config.demo.frames = frames;
    }

    // Headless output uses the configured window; otherwise follow the tty
    let mut console_config = config.console.clone();
    if !json {
        match terminal_size(STDOUT_FILENO) {
            Ok(size) => console_config = console_config.with_window(size),
            Err(e) => tracing::warn!("Could not query terminal size: {}", e),
        }
    }
    let console = VirtualConsole::new(console_config);

    let result = if json {
        run_headless(&console)
    } else {
        run_animation(&console, &config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

/// Render a single frame and print the presented buffer as JSON
fn run_headless(console: &VirtualConsole) -> Result<(), Box<dyn std::error::Error>> {
    let mut pair = DoubleBuffer::new(console)?;
    draw_frame(pair.back(), 0)?;
    pair.swap()?;

    let snapshot = console.snapshot(console.active_screen_buffer()?)?;
    println!("{}", snapshot.to_json()?);
    Ok(())
}

fn run_animation(console: &VirtualConsole, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut pair = DoubleBuffer::new(console)?;
    let mut presenter = TtyPresenter::new(io::stdout().lock());
    let delay = Duration::from_millis(config.demo.frame_delay_ms);

    for frame in 0..config.demo.frames {
        draw_frame(pair.back(), frame)?;
        pair.swap()?;
        presenter.present(console)?;
        std::thread::sleep(delay);
    }

    // Leave the real terminal the way we found it
    let mut out = presenter.into_inner();
    write!(out, "{}{}{}", escape::RESET, escape::CLEAR_SCREEN, escape::CURSOR_SHOW)?;
    out.flush()?;
    Ok(())
}

/// Draw one frame: a title line and diagonal colour bands that shift each frame
fn draw_frame<C: Console + ?Sized>(surface: &TerminalSurface<'_, C>, frame: u32) -> SurfaceResult<()> {
    let width = surface.width()?;
    let height = surface.height()?;

    surface.clear_screen()?;
    surface.set_cursor_visibility(false)?;

    let title = format!(" mochi-surface  frame {} ", frame);
    let title: String = title.chars().take(usize::from(width)).collect();
    surface.write_coloured_at(0, 0, &title, Some(Colour::Black), Some(Colour::White))?;

    // The last row stays empty so nothing scrolls
    for y in 1..height.saturating_sub(1) {
        let mut x = 0;
        while x < width {
            let band = (u32::from(x / 4) + u32::from(y) + frame) % 8;
            let colour = Colour::ALL[band as usize];
            let run = 4.min(width - x);
            surface.write_coloured_at(x, y, &" ".repeat(usize::from(run)), None, Some(colour))?;
            x += run;
        }
    }
    Ok(())
}

fn print_help() {
    println!("Mochi Surface Demo");
    println!();
    println!("Usage: mochi-surface-demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Load configuration from a JSON file");
    println!("  -n, --frames <N>     Number of frames to draw");
    println!("  -j, --json           Render one frame and print its snapshot as JSON");
    println!("  -h, --help           Show this help message");
    println!();
    println!("Without --config, ~/.config/mochi/surface.json is used if present.");
}
