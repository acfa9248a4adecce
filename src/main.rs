use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lean_timer::audio_manager::{AudioManager, TerminalBell};
use lean_timer::config::AppConfig;
use lean_timer::data_manager::DataManager;
use lean_timer::events::TimerEvent;
use lean_timer::history::group_workouts;
use lean_timer::models::{Profile, Settings, SharedWorkout};
use lean_timer::preferences::Preferences;
use lean_timer::progress_store::ProgressStore;
use lean_timer::runner::{parse_command, run_session, SessionCommand};
use lean_timer::session_recovery::resolve_start;
use lean_timer::session_stats::calculate_profile_stats;
use lean_timer::workout_session::{ResumePolicy, WorkoutSession};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Parser)]
#[command(author, version, about = "Offline interval workout timer")]
struct Cli {
    /// Directory for progress and preference files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Workout catalog file (JSON or JS array literal) instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show workouts grouped by cycle and week
    List,
    /// Run a workout (1-based catalog number); defaults to the resumable or next workout
    Run {
        number: Option<usize>,
        /// Keep a resumed session paused until `p` is entered
        #[arg(long)]
        paused: bool,
    },
    /// Toggle the done mark of a workout
    Done { number: usize },
    /// Mark every workout in a cycle done
    MarkCycle { cycle: String },
    /// Clear progress for every workout in a cycle
    ResetCycle { cycle: String },
    /// Delete all progress
    ResetAll {
        #[arg(long)]
        yes: bool,
    },
    /// Completed workouts and per-exercise rep stats
    Stats,
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Show or set the profile name
    Profile { name: Option<String> },
    /// Collapse or expand a cycle in `list`
    Collapse { cycle: String },
    /// Show, set or clear the saved music video id
    Music {
        id: Option<String>,
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Set { key: SettingName, value: Toggle },
}

#[derive(Clone, Copy, ValueEnum)]
enum SettingName {
    AudioCues,
    TrackReps,
    Warmup,
    Cooldown,
    GlassMotion,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

struct App {
    config: AppConfig,
    workouts: Vec<SharedWorkout>,
    progress: ProgressStore<Arc<DataManager>>,
    prefs: Preferences<Arc<DataManager>>,
}

impl App {
    fn open(config: AppConfig) -> Result<Self> {
        let workouts = config.load_catalog().context("Failed to load workout catalog")?;
        if workouts.is_empty() {
            return Err(anyhow!("Workout catalog has no valid workouts"));
        }
        let store = Arc::new(DataManager::new(config.data_dir()).with_context(|| {
            format!("Failed to open data dir {}", config.data_dir().display())
        })?);
        Ok(Self {
            config,
            workouts,
            progress: ProgressStore::new(Arc::clone(&store)),
            prefs: Preferences::new(store),
        })
    }

    fn workout(&self, number: usize) -> Result<&SharedWorkout> {
        number
            .checked_sub(1)
            .and_then(|index| self.workouts.get(index))
            .ok_or_else(|| anyhow!("No workout #{number} (catalog has {})", self.workouts.len()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let app = App::open(AppConfig::from_env(cli.data_dir, cli.catalog))?;
    log::debug!("Using data dir {}", app.config.data_dir().display());

    match cli.command.unwrap_or(Command::List) {
        Command::List => print_history(&app),
        Command::Run { number, paused } => run_workout(&app, number, paused).await?,
        Command::Done { number } => {
            let id = app.workout(number)?.id.clone();
            let progress = app.progress.toggle_done(&id)?;
            let done = progress.get(&id).is_some_and(|item| item.is_done());
            println!("{id}: {}", if done { "done" } else { "not done" });
        }
        Command::MarkCycle { cycle } => {
            app.progress.mark_cycle_done(&app.workouts, &cycle)?;
            println!("Marked {cycle} done");
        }
        Command::ResetCycle { cycle } => {
            app.progress.reset_cycle(&app.workouts, &cycle)?;
            println!("Reset {cycle}");
        }
        Command::ResetAll { yes } => {
            if !yes {
                return Err(anyhow!("Refusing to delete all progress without --yes"));
            }
            app.progress.reset_all()?;
            println!("All progress deleted");
        }
        Command::Stats => print_stats(&app),
        Command::Settings { action } => {
            let mut settings = app.prefs.load_settings();
            if let Some(SettingsAction::Set { key, value }) = action {
                set_setting(&mut settings, key, matches!(value, Toggle::On));
                app.prefs.save_settings(&settings)?;
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Profile { name } => {
            if let Some(name) = name {
                app.prefs.save_profile(&Profile { name })?;
            }
            match app.prefs.load_profile() {
                Some(profile) => println!("{}", profile.name),
                None => println!("No profile yet"),
            }
        }
        Command::Collapse { cycle } => {
            let state = app.prefs.toggle_collapse(&cycle)?;
            let collapsed = state.get(&cycle).copied().unwrap_or(false);
            println!("{cycle}: {}", if collapsed { "collapsed" } else { "expanded" });
        }
        Command::Music { id, clear } => {
            if clear {
                app.prefs.clear_music_id()?;
            } else if let Some(id) = id {
                app.prefs.set_music_id(&id)?;
            }
            match app.prefs.music_id() {
                Some(id) => println!("{id}"),
                None => println!("No music set"),
            }
        }
    }
    Ok(())
}

fn set_setting(settings: &mut Settings, key: SettingName, value: bool) {
    match key {
        SettingName::AudioCues => settings.audio_cues = value,
        SettingName::TrackReps => settings.track_reps = value,
        SettingName::Warmup => settings.enable_warmup = value,
        SettingName::Cooldown => settings.enable_cooldown = value,
        SettingName::GlassMotion => settings.enable_glass_motion = value,
    }
}

fn print_history(app: &App) {
    let progress = app.progress.load();
    let collapsed = app.prefs.collapse_state();
    for cycle in group_workouts(&app.workouts, &progress) {
        println!("{} ({}/{})", cycle.name, cycle.done_count, cycle.total);
        if collapsed.get(&cycle.name).copied().unwrap_or(false) {
            continue;
        }
        for week in &cycle.weeks {
            println!("  {} ({}/{})", week.name, week.done_count, week.total);
            for item in &week.items {
                let mark = match progress.get(&item.workout.id) {
                    Some(entry) if entry.is_done() => "x",
                    Some(entry) if entry.is_in_progress() => "~",
                    _ => " ",
                };
                println!(
                    "    [{mark}] {:>3}. {} {}",
                    item.index + 1,
                    item.workout.day,
                    item.workout.timing
                );
            }
        }
    }
}

fn print_stats(app: &App) {
    let stats = calculate_profile_stats(&app.workouts, &app.progress.load());
    if let Some(profile) = app.prefs.load_profile() {
        println!("{}", profile.name);
    }
    println!("Workouts done: {}", stats.workouts_done);
    for exercise in &stats.exercises {
        println!(
            "  {:<28} last {:>3}  pr {:>3}  total {:>5}",
            exercise.name, exercise.last, exercise.pr, exercise.total
        );
    }
}

async fn run_workout(app: &App, number: Option<usize>, paused: bool) -> Result<()> {
    let workout = match number {
        Some(number) => Arc::clone(app.workout(number)?),
        None => {
            let index = resolve_start(&app.workouts, &app.progress).index();
            Arc::clone(app.workout(index + 1)?)
        }
    };
    println!(
        "{} / {} / {} ({} work, {} rest, {} rounds)",
        workout.cycle, workout.week, workout.day, workout.work, workout.rest, workout.rounds
    );
    println!("Commands: p pause/resume, n next, b back, r reset, q quit, rep <n> <count|->, f finish");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let policy = if paused {
        ResumePolicy::Paused
    } else {
        ResumePolicy::Running
    };
    let session = WorkoutSession::start(
        workout,
        app.prefs.load_settings(),
        app.progress.clone(),
        AudioManager::new(Box::new(TerminalBell)),
        event_tx,
        policy,
    )?;

    let printer = tokio::spawn(print_events(event_rx));
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    spawn_input_reader(command_tx);

    let session = run_session(session, command_rx).await;
    app.prefs.save_settings(session.settings())?;
    drop(session);
    printer.await.context("Event printer stopped unexpectedly")?;
    Ok(())
}

/// Stdin is read on a plain thread so a blocked read never holds up shutdown.
fn spawn_input_reader(commands: UnboundedSender<SessionCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                None => eprintln!("Unknown command: {}", line.trim()),
            }
        }
    });
}

async fn print_events(mut events: UnboundedReceiver<TimerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            TimerEvent::Tick { view } => println!(
                "{:<10} {:<24} {:>2}:{:02}  round {}",
                view.header_label,
                view.display_exercise.name,
                view.seconds / 60,
                view.seconds % 60,
                view.round
            ),
            TimerEvent::PhaseChanged { from, to, view } => {
                println!("-- {from} -> {to}: {} {}", view.header_label, view.display_exercise.name)
            }
            TimerEvent::RepPrompt {
                exercise_index,
                exercise_name,
                current,
            } => {
                let current = current.map(|reps| format!(" (now {reps})")).unwrap_or_default();
                println!(
                    "Reps for {exercise_name}{current}? Enter `rep {} <count>`",
                    exercise_index + 1
                );
            }
            TimerEvent::Completed { workout_id } => {
                println!("Workout {workout_id} complete. Adjust reps with `rep <n> <count>`, then `f`.")
            }
            TimerEvent::Paused => println!("Paused"),
            TimerEvent::Resumed => println!("Resumed"),
            TimerEvent::Reset => println!("Reset to start (paused)"),
            TimerEvent::Exited => println!("Left workout"),
        }
    }
}
