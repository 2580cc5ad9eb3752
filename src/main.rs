// swipe: step through an ordered queue of images and dispatch each to an
// outcome, copying accepted images into category folders.
// Core: queue navigation + texture preload/eviction (engine, window,
// texture, preload). This file is the CLI and a line-oriented session
// driver standing in for a GUI surface.
// Usage: swipe local <input> <output> [--watch]

mod config;
mod debug;
mod engine;
mod outcome;
mod preload;
mod present;
mod queue;
mod scanner;
mod sink;
mod texture;
mod watcher;
mod window;

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use config::SwipeConfig;
use engine::{Engine, Phase};
use outcome::ActionButton;
use present::FitMode;
use sink::OutputSink;
use watcher::DirWatcher;

/// Nominal surface the geometry printouts are computed against.
const PAGE_SURFACE: (u32, u32) = (1280, 720);
const SLOT_PADDING: u32 = 10;

#[derive(Parser)]
#[command(
    name = "swipe",
    version,
    about = "Sort a queue of images into keep/discard folders"
)]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Sort a directory one image at a time.
    Local {
        /// Directory to load images from.
        input: PathBuf,
        /// Directory to place category folders in.
        output: PathBuf,
        /// Keep watching the input directory and enqueue new images.
        #[arg(long)]
        watch: bool,
    },
    /// Show several images per page and keep at most one of each page.
    Multi {
        input: PathBuf,
        output: PathBuf,
        /// Images shown per page (1-9).
        #[arg(short = 'n', long, default_value_t = 2)]
        per_page: usize,
    },
    /// Multi-round selection: narrow the queue down to K images.
    Pickn {
        input: PathBuf,
        output: PathBuf,
        /// Number of images to keep.
        #[arg(short = 'k', long, default_value_t = 1)]
        keep: usize,
    },
    /// Show the effective configuration.
    Config {
        /// Write the current values to the config file.
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.debug {
        debug::enable();
    }

    match args.cmd {
        Command::Local {
            input,
            output,
            watch,
        } => run_local(&input, &output, watch),
        Command::Multi {
            input,
            output,
            per_page,
        } => run_multi(&input, &output, per_page),
        Command::Pickn {
            input,
            output,
            keep,
        } => run_pickn(&input, &output, keep),
        Command::Config { init } => run_config(init),
    }
}

fn run_config(init: bool) -> Result<()> {
    let cfg = SwipeConfig::load();
    if init {
        cfg.save()?;
        if let Some(path) = config::config_path() {
            eprintln!("wrote {}", path.display());
        }
    }
    println!("page_size:         {}", cfg.page_size);
    println!("step_size:         {}", cfg.step_size);
    println!("preload_radius:    {}", cfg.preload_radius);
    println!("max_texture:       {}x{}", cfg.max_texture.0, cfg.max_texture.1);
    println!("background_decode: {}", cfg.background_decode);
    Ok(())
}

// ── Session actions ─────────────────────────────────────────────────────

/// A session command: which button fires, on which page slot.
struct SlotAction {
    slot: usize,
    button: ActionButton,
}

/// The local mode's stock buttons, all targeting slot 0.
fn local_actions() -> Vec<SlotAction> {
    outcome::default_buttons()
        .into_iter()
        .map(|button| SlotAction { slot: 0, button })
        .collect()
}

/// Multi mode: digit key N keeps slot N-1; `d` discards the whole page.
fn multi_actions(per_page: usize) -> Vec<SlotAction> {
    let mut actions: Vec<SlotAction> = (0..per_page)
        .map(|i| {
            let key = char::from_digit(i as u32 + 1, 10).unwrap();
            SlotAction {
                slot: i,
                button: ActionButton::accept("Keep", key),
            }
        })
        .collect();
    actions.push(SlotAction {
        slot: 0,
        button: ActionButton::reject("Discard all", 'd'),
    });
    actions
}

// ── Modes ───────────────────────────────────────────────────────────────

fn load_queue(input: &Path) -> Result<Vec<(PathBuf, String)>> {
    let paths = scanner::discover(input);
    if paths.is_empty() {
        bail!("no images found in {}", input.display());
    }
    eprintln!("queue: {} images from {}", paths.len(), input.display());
    Ok(scanner::to_entries(paths))
}

fn run_local(input: &Path, output: &Path, watch: bool) -> Result<()> {
    let cfg = SwipeConfig::load();
    let mut engine = Engine::new(&cfg);
    engine.append_items(load_queue(input)?);

    let sink = OutputSink::new(output);
    eprintln!("output: {}", sink.root().display());
    let actions = local_actions();
    engine.set_on_complete(Box::new(|| eprintln!("queue complete — all images sorted")));

    let (watcher, watch_rx) = if watch {
        let (w, rx) = DirWatcher::start(input);
        (Some(w), Some(rx))
    } else {
        (None, None)
    };
    let mut seen: HashSet<PathBuf> = engine.queue().iter().map(|i| i.source_path.clone()).collect();

    engine.start();
    run_session(&mut engine, &sink, &actions, watch_rx.as_ref(), &mut seen)?;
    drop(watcher);
    Ok(())
}

fn run_multi(input: &Path, output: &Path, per_page: usize) -> Result<()> {
    if !(1..=9).contains(&per_page) {
        bail!("per-page must be between 1 and 9");
    }
    let mut cfg = SwipeConfig::load();
    cfg.page_size = per_page;
    cfg.step_size = per_page; // acting on one slot moves past the whole page
    cfg.preload_radius = cfg.preload_radius.max(3 * per_page);

    let mut engine = Engine::new(&cfg);
    engine.append_items(load_queue(input)?);

    let sink = OutputSink::new(output);
    eprintln!("output: {}", sink.root().display());
    let actions = multi_actions(per_page);
    engine.set_on_complete(Box::new(|| eprintln!("queue complete — all pages seen")));
    let mut seen = HashSet::new();

    engine.start();
    run_session(&mut engine, &sink, &actions, None, &mut seen)?;
    Ok(())
}

fn run_pickn(input: &Path, output: &Path, keep_count: usize) -> Result<()> {
    let mut cfg = SwipeConfig::load();
    cfg.page_size = 1; // one image per decision, whatever the config says
    cfg.step_size = 1;
    let mut engine = Engine::new(&cfg);
    engine.append_items(load_queue(input)?);
    let sink = OutputSink::new(output);
    eprintln!("output: {}", sink.root().display());
    engine.set_on_complete(Box::new(|| eprintln!("round complete")));

    // Kept entries of the current round, recorded by the Keep button.
    let kept: Rc<RefCell<Vec<(PathBuf, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let recorder = kept.clone();
    let actions = vec![
        SlotAction {
            slot: 0,
            button: ActionButton::custom(
                "Keep",
                'k',
                Box::new(move |_, item| {
                    recorder
                        .borrow_mut()
                        .push((item.source_path.clone(), item.label.clone()));
                    Ok(())
                }),
            ),
        },
        SlotAction {
            slot: 0,
            button: ActionButton::reject("Discard", 'd'),
        },
    ];

    let mut round = 1u32;
    loop {
        engine.start();
        eprintln!("round {}: {} images", round, engine.queue().len());
        let end = run_session(&mut engine, &sink, &actions, None, &mut HashSet::new())?;
        let picked: Vec<(PathBuf, String)> = kept.borrow_mut().drain(..).collect();

        if end == SessionEnd::Quit {
            return Ok(());
        }
        if picked.is_empty() {
            eprintln!("nothing kept; done");
            return Ok(());
        }
        if picked.len() <= keep_count {
            for (path, _label) in &picked {
                match sink.save(path, "Keep") {
                    Ok(dest) => eprintln!("kept: {}", dest.display()),
                    Err(e) => eprintln!("save failed: {:#}", e),
                }
            }
            eprintln!("done: {} of {} kept", picked.len(), keep_count);
            return Ok(());
        }

        eprintln!(
            "round {} kept {}, still above {} — next round",
            round,
            picked.len(),
            keep_count
        );
        engine.replace_queue(picked);
        round += 1;
    }
}

// ── Session driver ──────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SessionEnd {
    /// The queue round ran to exhaustion.
    Completed,
    /// The user quit (or stdin closed) mid-round.
    Quit,
}

fn run_session(
    engine: &mut Engine,
    sink: &OutputSink,
    actions: &[SlotAction],
    watch_rx: Option<&mpsc::Receiver<PathBuf>>,
    seen: &mut HashSet<PathBuf>,
) -> Result<SessionEnd> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        engine.pump();

        if let Some(rx) = watch_rx {
            let mut added = Vec::new();
            while let Ok(path) = rx.try_recv() {
                if seen.insert(path.clone()) {
                    added.push(path);
                }
            }
            if !added.is_empty() {
                eprintln!("queue: +{} new image(s)", added.len());
                engine.append_items(scanner::to_entries(added));
            }
        }

        if engine.phase() == Phase::Exhausted {
            return Ok(SessionEnd::Completed);
        }

        print_page(engine);
        print!("> ");
        io::stdout().flush().ok();

        let line = match lines.next() {
            Some(l) => l?,
            None => return Ok(SessionEnd::Quit),
        };
        let cmd = line.trim();
        match cmd {
            "" => {}
            "q" => return Ok(SessionEnd::Quit),
            "b" => engine.retreat(),
            "l" => print_queue(engine),
            "h" | "?" => print_help(actions),
            _ => dispatch(engine, sink, actions, cmd),
        }
    }
}

fn dispatch(engine: &mut Engine, sink: &OutputSink, actions: &[SlotAction], cmd: &str) {
    let mut chars = cmd.chars();
    let key = chars.next().unwrap_or(' ');
    if chars.next().is_some() {
        eprintln!("unknown command: {} (h for help)", cmd);
        return;
    }
    let action = match actions.iter().find(|a| a.button.key == key) {
        Some(a) => a,
        None => {
            eprintln!("unknown command: {} (h for help)", cmd);
            return;
        }
    };
    if action.slot >= engine.current_slice().len() {
        eprintln!("no image in slot {} this page", action.slot + 1);
        return;
    }
    if let Err(e) = engine.act(action.slot, &action.button.outcome, sink) {
        // Reportable, not fatal: the cursor stays put and the user keeps going.
        eprintln!("{} failed: {:#}", action.button.label, e);
    }
}

// ── Output ──────────────────────────────────────────────────────────────

fn print_page(engine: &Engine) {
    let slice = engine.current_slice();
    if slice.is_empty() {
        return;
    }
    let total = engine.queue().len();
    let boxes = present::page_layout(PAGE_SURFACE, slice.len());

    for (slot, ((index, item), sbox)) in slice.iter().zip(boxes.iter()).enumerate() {
        let inner = (
            sbox.width.saturating_sub(SLOT_PADDING),
            sbox.height.saturating_sub(SLOT_PADDING),
        );
        let detail = if engine.cache().is_resident(item.id) {
            let (w, h) = engine.cache().dimensions_of(item.id);
            let kib = engine.cache().pixels_of(item.id).len() / 1024;
            let fit = present::best_fit((w, h), inner, FitMode::Contain);
            let note = if engine.cache().is_placeholder(item.id) {
                " (decode failed)"
            } else {
                ""
            };
            format!(
                "{}x{} ({} KiB) → {}x{} @ ({}, {}){}",
                w,
                h,
                kib,
                fit.width,
                fit.height,
                sbox.x as i32 + fit.offset_x,
                fit.offset_y,
                note
            )
        } else {
            "loading…".to_string()
        };
        eprintln!("  [{}] {}/{} {} — {}", slot + 1, index + 1, total, item.label, detail);
    }
}

fn print_queue(engine: &Engine) {
    let pos = engine.cursor().position;
    let total = engine.queue().len();
    eprintln!("viewing image {} of {}", pos + 1, total);
    for (i, item) in engine.queue().iter().enumerate() {
        if i == pos {
            eprintln!("  (CURRENT) {}: {}", i + 1, item.label);
        } else {
            eprintln!("  {}: {}", i + 1, item.label);
        }
    }
}

fn print_help(actions: &[SlotAction]) {
    for a in actions {
        eprintln!("  {} = {}", a.button.key, a.button.label);
    }
    eprintln!("  b = back, l = queue, q = quit");
}
