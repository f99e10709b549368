// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The `chip8vm` binary program.

extern crate chip8vm;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;
extern crate sdl2;

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process;
use std::thread;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;

use chip8vm::display;
use chip8vm::input::Key;
use chip8vm::interpreter::{Interpreter, Options};
use chip8vm::timer::{Clock, TIMER_FREQ};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The most instructions run between two looks at the event queue, so that a
/// long stall (e.g. the window being dragged) doesn't turn into a burst.
const MAX_STEPS_PER_LAP: u64 = 100;

/// An SDL error.
#[derive(Debug, Fail)]
#[fail(display = "SDL error: {}", _0)]
struct SdlError(String);

/// The display window for the interpreter.
struct Display {
    /// The underlying SDL canvas.
    canvas: Canvas<Window>,
    /// The background color to use.
    bg: Color,
    /// The foreground color to use.
    fg: Color,
}

impl Display {
    /// Initializes the display and returns the resulting object.
    fn new(
        video_subsystem: sdl2::VideoSubsystem,
        width: u32,
        height: u32,
        bg: Color,
        fg: Color,
    ) -> Result<Self, Error> {
        let window = video_subsystem.window("Chip-8", width, height).build()?;
        let mut canvas = window.into_canvas().build()?;

        canvas.set_draw_color(bg);
        canvas.clear();
        canvas.present();

        Ok(Display { canvas, bg, fg })
    }

    /// Draws the given Chip-8 display buffer to the window, scaling it to
    /// fill the window.
    fn draw(&mut self, buffer: &display::Buffer) -> Result<(), SdlError> {
        let (width, height) = self.canvas.window().size();
        let scalex = width / display::WIDTH as u32;
        let scaley = height / display::HEIGHT as u32;

        self.canvas.set_draw_color(self.bg);
        self.canvas.clear();
        self.canvas.set_draw_color(self.fg);
        for (x, y) in buffer.lit_pixels() {
            let x = x as i32 * scalex as i32;
            let y = y as i32 * scaley as i32;

            self.canvas
                .fill_rect(Rect::new(x, y, scalex, scaley))
                .map_err(SdlError)?;
        }
        self.canvas.present();
        Ok(())
    }
}

/// A utility to process SDL key events and press/release the corresponding
/// keys on the interpreter's keypad.
struct Controller {
    /// The map from keycodes to Chip-8 keys.
    keymap: HashMap<Keycode, Key>,
}

impl Controller {
    /// Returns a controller with the default keymap, which lays the hex
    /// keypad out over the left-hand side of a QWERTY keyboard.
    fn new() -> Self {
        use Keycode::*;
        use Key::*;

        Controller::with_keymap(hashmap![
            Num1 => K1,
            Num2 => K2,
            Num3 => K3,
            Num4 => KC,
            Q => K4,
            W => K5,
            E => K6,
            R => KD,
            A => K7,
            S => K8,
            D => K9,
            F => KE,
            Z => KA,
            X => K0,
            C => KB,
            V => KF,
        ])
    }

    /// Returns a controller with the given keymap.
    fn with_keymap(keymap: HashMap<Keycode, Key>) -> Self {
        Controller { keymap }
    }

    /// Processes the given SDL event, applying the corresponding action to the
    /// given interpreter.  Repeated key-down events for a held key are ignored.
    fn process(&self, event: Event, interpreter: &mut Interpreter) {
        let (keycode, pressed) = match event {
            Event::KeyDown {
                keycode: Some(keycode),
                repeat: false,
                ..
            } => (keycode, true),
            Event::KeyUp {
                keycode: Some(keycode),
                ..
            } => (keycode, false),
            _ => return,
        };
        if let Some(&key) = self.keymap.get(&keycode) {
            if let Err(e) = interpreter.set_key(key as u8, pressed) {
                warn!("{}", e);
            }
        }
    }
}

/// Settings for a run, taken from the command line.
struct RunOptions {
    /// The instruction rate, in Hz.
    rate: u32,
    /// The timer rate, in Hz.
    timer_freq: u32,
    /// The window scale.
    scale: u32,
    /// The seed for the random number generator, if any.
    seed: Option<u32>,
}

impl RunOptions {
    /// Returns the default settings.
    fn new() -> Self {
        RunOptions {
            rate: 700,
            timer_freq: TIMER_FREQ,
            scale: 10,
            seed: None,
        }
    }
}

fn main() {
    let matches = App::new("chip8vm")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("A Chip-8 interpreter")
        .help_message("show this help message and exit")
        .version_message("show version information and exit")
        .arg(
            Arg::with_name("rate")
                .short("r")
                .long("rate")
                .value_name("HZ")
                .help("set instructions executed per second")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("timer-frequency")
                .long("timer-frequency")
                .value_name("HZ")
                .help("set delay/sound timer frequency (in Hz)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("scale")
                .short("s")
                .long("scale")
                .value_name("SCALE")
                .help("set game display scale")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("seed the random number generator")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.causes().skip(1) {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut opts = RunOptions::new();
    process_opts(&mut opts, matches)?;

    let filename = matches
        .value_of("FILE")
        .ok_or_else(|| format_err!("no program file given"))?;
    let mut input =
        File::open(filename).with_context(|_| format!("could not open file '{}'", filename))?;
    let mut interpreter = Interpreter::with_options(match opts.seed {
        Some(seed) => Options::seeded(seed),
        None => Options::new(),
    });
    interpreter.initialize();
    interpreter
        .load_rom(&mut input)
        .with_context(|_| format!("could not load program from file '{}'", filename))?;
    info!("loaded '{}'", filename);

    let sdl_context = sdl2::init()
        .map_err(SdlError)
        .context("could not initialize SDL")?;
    let video_subsystem = sdl_context
        .video()
        .map_err(SdlError)
        .context("could not initialize SDL video subsystem")?;
    let mut event_pump = sdl_context
        .event_pump()
        .map_err(SdlError)
        .context("could not initialize SDL event loop")?;
    let mut display = Display::new(
        video_subsystem,
        display::WIDTH as u32 * opts.scale,
        display::HEIGHT as u32 * opts.scale,
        Color::RGB(0, 0, 0),
        Color::RGB(255, 255, 255),
    )?;
    let controller = Controller::new();

    let mut cpu_clock = Clock::new(opts.rate);
    let mut timer_clock = Clock::new(opts.timer_freq);
    info!(
        "running at {} Hz with timers at {} Hz",
        cpu_clock.frequency(),
        timer_clock.frequency()
    );

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,
                Event::Window { .. } => interpreter.display_mut().force_refresh(),
                e => controller.process(e, &mut interpreter),
            }
        }

        let steps = cpu_clock.lap();
        if steps > MAX_STEPS_PER_LAP {
            debug!("running behind; dropping {} steps", steps - MAX_STEPS_PER_LAP);
        }
        for _ in 0..steps.min(MAX_STEPS_PER_LAP) {
            let pc = interpreter.pc();
            interpreter
                .step()
                .with_context(|_| format!("execution stopped at {:#05X}", pc))?;
        }
        for _ in 0..timer_clock.lap() {
            interpreter.tick();
        }

        interpreter
            .display_mut()
            .refresh(|buf| display.draw(buf))
            .context("could not refresh display window")?;
        thread::yield_now();
    }

    Ok(())
}

/// Processes the command-line arguments and changes the necessary fields of
/// the given run options.
fn process_opts(opts: &mut RunOptions, matches: &ArgMatches) -> Result<(), Error> {
    if let Some(rate) = matches.value_of("rate") {
        opts.rate = rate.parse::<u32>().context("invalid rate argument")?;
    }
    if let Some(freq) = matches.value_of("timer-frequency") {
        opts.timer_freq = freq.parse::<u32>()
            .context("invalid timer frequency argument")?;
    }
    if let Some(scale) = matches.value_of("scale") {
        opts.scale = scale.parse::<u32>().context("invalid scale argument")?;
    }
    if let Some(seed) = matches.value_of("seed") {
        opts.seed = Some(seed.parse::<u32>().context("invalid seed argument")?);
    }
    if opts.rate == 0 || opts.timer_freq == 0 || opts.scale == 0 {
        bail!("rate, timer frequency and scale must all be positive");
    }

    Ok(())
}
