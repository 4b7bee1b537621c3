//! Wayfarer CLI - drive the locomotion and dialogue runtime from a terminal

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use wayfarer::config::WayfarerConfig;
use wayfarer::game::constants::physics::TIMESTEP;
use wayfarer::game::dialogue::{StoryAsset, StoryInterpreter, StorySource};
use wayfarer::game::player::Key;
use wayfarer::game::Game;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Third-person locomotion and dialogue runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the frame loop in real time, reading commands from stdin
    Run {
        /// Path to wayfarer.toml
        #[arg(short, long, env = "WAYFARER_CONFIG")]
        config: Option<PathBuf>,
        /// Story graph JSON for NPC dialogue
        #[arg(short, long)]
        story: Option<PathBuf>,
        /// Frames per second
        #[arg(long, default_value = "60")]
        rate: u32,
    },
    /// Replay a command file at a fixed timestep
    Script {
        /// Command file, one command per line
        file: PathBuf,
        #[arg(short, long, env = "WAYFARER_CONFIG")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        story: Option<PathBuf>,
    },
    /// Validate a story graph and optionally play one path
    CheckStory {
        story: PathBuf,
        /// Knot to play through, always taking the first choice
        #[arg(long)]
        path: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            story,
            rate,
        } => run_realtime(config.as_deref(), story.as_deref(), rate),
        Commands::Script {
            file,
            config,
            story,
        } => run_script(&file, config.as_deref(), story.as_deref()),
        Commands::CheckStory { story, path } => check_story(&story, path.as_deref()),
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Press(Key),
    Release(Key),
    Look(f32, f32),
    Stick(f32, f32),
    Wait(u32),
    Choose(usize),
    Status,
    Quit,
}

/// Parses one command line. Blank lines and `#` comments yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let key_arg = |args: &[&str]| -> Result<Key> {
        let name = args.first().context("missing key name")?;
        Key::parse(name).with_context(|| format!("unknown key '{}'", name))
    };
    let float_arg = |args: &[&str], i: usize| -> Result<f32> {
        let raw = args.get(i).with_context(|| format!("missing argument {}", i + 1))?;
        raw.parse::<f32>()
            .with_context(|| format!("'{}' is not a number", raw))
    };

    let command = match verb {
        "press" => Command::Press(key_arg(&args)?),
        "release" => Command::Release(key_arg(&args)?),
        "look" => Command::Look(float_arg(&args, 0)?, float_arg(&args, 1)?),
        "stick" => Command::Stick(float_arg(&args, 0)?, float_arg(&args, 1)?),
        "wait" => {
            let frames = args.first().copied().unwrap_or("1");
            Command::Wait(
                frames
                    .parse()
                    .with_context(|| format!("'{}' is not a frame count", frames))?,
            )
        }
        "choose" => {
            let raw = args.first().context("missing choice index")?;
            Command::Choose(
                raw.parse()
                    .with_context(|| format!("'{}' is not a choice index", raw))?,
            )
        }
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(command))
}

// =============================================================================
// Session
// =============================================================================

/// A game plus the bookkeeping needed to print what changed each frame.
struct Session {
    game: Game,
    last_state: String,
    shown_choices: Vec<String>,
    was_playing: bool,
}

impl Session {
    fn load(config_path: Option<&Path>, story_path: Option<&Path>) -> Result<Self> {
        let config = WayfarerConfig::load_or_default(config_path).context("load config")?;

        let mut builder = Game::builder(config);
        if let Some(path) = story_path {
            let story = StoryAsset::from_file(path)
                .with_context(|| format!("load story {}", path.display()))?;
            builder = builder.story(story);
        }
        let game = builder.build();
        let last_state = game.movement_state().to_string();

        Ok(Self {
            game,
            last_state,
            shown_choices: Vec::new(),
            was_playing: false,
        })
    }

    /// Applies a command. Returns false on quit.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Press(key) => self.game.input_mut().key(key, true),
            Command::Release(key) => self.game.input_mut().key(key, false),
            Command::Look(dx, dy) => self.game.input_mut().look(dx, dy),
            Command::Stick(x, y) => self.game.input_mut().set_stick(x, y),
            Command::Wait(frames) => {
                for _ in 0..frames {
                    self.frame(TIMESTEP);
                }
            }
            Command::Choose(index) => match self.game.dialogue_mut() {
                Some(dialogue) => dialogue.make_choice(index),
                None => log::warn!("No dialogue manager loaded"),
            },
            Command::Status => self.print_status(),
            Command::Quit => return false,
        }
        true
    }

    fn frame(&mut self, dt: f32) {
        self.game.frame(dt);
        self.report();
    }

    fn report(&mut self) {
        let frame = self.game.frame_count();

        let state = self.game.movement_state().to_string();
        if state != self.last_state {
            println!("[frame {}] {} -> {}", frame, self.last_state, state);
            self.last_state = state;
        }

        let Some(dialogue) = self.game.dialogue_mut() else {
            return;
        };
        for line in dialogue.view_mut().take_transcript() {
            println!("[frame {}] {}", frame, line);
        }

        let choices: Vec<String> = dialogue
            .view()
            .visible_choices()
            .into_iter()
            .map(|(slot, text, _)| format!("{}) {}", slot, text))
            .collect();
        if choices != self.shown_choices {
            for choice in &choices {
                println!("[frame {}]   {}", frame, choice);
            }
            self.shown_choices = choices;
        }

        let playing = dialogue.dialogue_is_playing();
        if self.was_playing && !playing {
            println!("[frame {}] (dialogue ended)", frame);
        }
        self.was_playing = playing;
    }

    fn print_status(&self) {
        match serde_json::to_string(&self.game.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize status: {}", e),
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

fn run_script(file: &Path, config: Option<&Path>, story: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("read script {}", file.display()))?;
    let mut session = Session::load(config, story)?;

    for (number, line) in text.lines().enumerate() {
        let command = parse_command(line)
            .with_context(|| format!("{}:{}", file.display(), number + 1))?;
        if let Some(command) = command {
            if !session.apply(command) {
                break;
            }
        }
    }

    session.print_status();
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_realtime(config: Option<&Path>, story: Option<&Path>, rate: u32) -> Result<()> {
    if rate == 0 {
        bail!("--rate must be positive");
    }
    let mut session = Session::load(config, story)?;
    let commands = spawn_stdin_reader();
    let frame_duration = Duration::from_secs_f32(1.0 / rate as f32);
    let dt = 1.0 / rate as f32;

    log::info!("Running at {} Hz, type commands (press w, look 10 0, status, quit)", rate);

    'frames: loop {
        let start = Instant::now();

        // Drain everything typed since the last frame
        loop {
            match commands.try_recv() {
                Ok(line) => match parse_command(&line) {
                    // Frames advance on their own in real time
                    Ok(Some(Command::Wait(_))) => {}
                    Ok(Some(command)) => {
                        if !session.apply(command) {
                            break 'frames;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("error: {:#}", e),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'frames,
            }
        }

        session.frame(dt);

        let elapsed = start.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }

    session.print_status();
    Ok(())
}

fn check_story(path: &Path, knot: Option<&str>) -> Result<()> {
    let story =
        StoryAsset::from_file(path).with_context(|| format!("load story {}", path.display()))?;
    let knots: Vec<&str> = story.knot_names().collect();
    println!("{}: {} knots ({})", path.display(), knots.len(), knots.join(", "));

    let Some(knot) = knot else {
        return Ok(());
    };

    let mut runner = story.instantiate();
    runner.choose_path(knot)?;

    // Bounded so sticky loops terminate
    for _ in 0..100 {
        while runner.can_continue() {
            println!("{}", runner.continue_line()?);
        }
        let Some(first) = runner.current_choices().first() else {
            return Ok(());
        };
        println!("  > {}", first.text);
        runner.choose_choice_index(0)?;
    }
    println!("(stopped after 100 choices)");
    Ok(())
}
