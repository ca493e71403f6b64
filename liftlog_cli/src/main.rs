use clap::{Parser, Subcommand};
use liftlog_core::config::DataConfig;
use liftlog_core::context::DEFAULT_TARGET_SETS;
use liftlog_core::history::format_weight;
use liftlog_core::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout program scheduler and training log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active program and any workout in progress (default)
    Status,

    /// Manage the exercise catalog
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommand,
    },

    /// Manage programs
    Program {
        #[command(subcommand)]
        command: ProgramCommand,
    },

    /// Start, log and finish workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommand,
    },

    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace all data with a JSON export
    Import { file: PathBuf },

    /// Write every logged set to a CSV file
    ExportCsv { file: PathBuf },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// List exercises grouped by muscle group
    List,
    /// Add a custom exercise
    Add {
        name: String,
        /// legs, chest, back, shoulders or arms
        #[arg(long)]
        muscle: String,
    },
    /// Replace an exercise's notes
    Notes { exercise: String, text: String },
    /// Delete an exercise that has never been logged
    Delete { exercise: String },
    /// Show every session an exercise was logged in
    History { exercise: String },
}

#[derive(Subcommand)]
enum ProgramCommand {
    /// List programs
    List,
    /// Show a program's workouts
    Show { id: ProgramId },
    /// Create a program from a TOML file
    Create { file: PathBuf },
    /// Replace a program's name and workouts from a TOML file
    Update { id: ProgramId, file: PathBuf },
    /// Delete a program, keeping its logged sessions
    Delete { id: ProgramId },
    /// Make a program the active one
    Activate { id: ProgramId },
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Start the next workout of the active program
    Start,
    /// Log a set in the workout in progress
    Log {
        exercise: String,
        #[arg(allow_hyphen_values = true)]
        weight: String,
        #[arg(allow_hyphen_values = true)]
        reps: String,
    },
    /// Change the weight and reps of a logged set
    Edit {
        set: SetId,
        #[arg(allow_hyphen_values = true)]
        weight: String,
        #[arg(allow_hyphen_values = true)]
        reps: String,
    },
    /// Remove a logged set
    DeleteSet { set: SetId },
    /// Complete the workout and move to the next day
    Finish,
    /// Discard the workout and its sets
    Cancel,
}

/// Program file layout
#[derive(Deserialize)]
struct ProgramFile {
    name: String,
    #[serde(default)]
    workouts: Vec<WorkoutFile>,
}

#[derive(Deserialize)]
struct WorkoutFile {
    number: u32,
    #[serde(default)]
    exercises: Vec<SlotFile>,
}

#[derive(Deserialize)]
struct SlotFile {
    exercise: ExerciseRef,
    #[serde(default = "default_sets")]
    sets: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseRef {
    Id(u64),
    Name(String),
}

fn default_sets() -> u32 {
    DEFAULT_TARGET_SETS
}

fn main() {
    liftlog_core::logging::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data = DataConfig {
        data_dir: cli
            .data_dir
            .unwrap_or_else(|| config.data.data_dir.clone()),
    };
    let mut store = open_store(&data, &config)?;
    let unit = config.display.weight_unit.as_str();

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&store, unit),
        Some(Commands::Exercise { command }) => cmd_exercise(&mut store, command, unit),
        Some(Commands::Program { command }) => cmd_program(&mut store, command),
        Some(Commands::Workout { command }) => cmd_workout(&mut store, command, unit),
        Some(Commands::Export { output }) => cmd_export(&store, output),
        Some(Commands::Import { file }) => cmd_import(&mut store, &file),
        Some(Commands::ExportCsv { file }) => {
            let count = store.export_sets_csv(&file)?;
            println!("✓ Wrote {} sets to {}", count, file.display());
            Ok(())
        }
    }
}

/// Open the store and journal every committed change
fn open_store(data: &DataConfig, config: &Config) -> Result<Store> {
    let backend = JsonFileBackend::new(data.store_path());
    let mut store = Store::open_with(
        backend,
        OpenOptions {
            seed_catalog: config.catalog.seed_predefined,
        },
    )?;

    let mut journal = JsonlJournal::new(data.journal_path());
    store.subscribe(move |event| {
        if let Err(e) = journal.append(event) {
            tracing::warn!("Failed to journal {:?}: {}", event, e);
        }
    });
    Ok(store)
}

/// Accept a case-insensitive exercise name or an id. An exact name match
/// wins, so a custom exercise named "5" is reachable by name.
fn resolve_exercise(store: &Store, reference: &str) -> Result<ExerciseId> {
    if let Some(exercise) = store.find_exercise_by_name(reference) {
        return Ok(exercise.id);
    }
    reference
        .parse::<ExerciseId>()
        .ok()
        .filter(|&id| store.exercise(id).is_some())
        .ok_or_else(|| Error::NotFound(format!("No exercise matching '{}'", reference)))
}

fn exercise_name(store: &Store, id: ExerciseId) -> String {
    store
        .exercise(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| format!("(deleted exercise {})", id))
}

fn load_program_file(store: &Store, path: &Path) -> Result<ProgramDraft> {
    let contents = std::fs::read_to_string(path)?;
    let file: ProgramFile = toml::from_str(&contents)?;

    let mut builder = ProgramBuilder::new(file.name);
    for workout in &file.workouts {
        for slot in &workout.exercises {
            let exercise_id = match &slot.exercise {
                ExerciseRef::Id(id) => ExerciseId(*id),
                ExerciseRef::Name(name) => resolve_exercise(store, name)?,
            };
            builder.add_exercise(workout.number, exercise_id, slot.sets)?;
        }
    }
    Ok(builder.build())
}

fn cmd_status(store: &Store, unit: &str) -> Result<()> {
    match store.phase() {
        SessionPhase::NoProgram => {
            println!("No active program.");
            println!("Create one with `liftlog program create <file>` and activate it.");
        }
        SessionPhase::Previewing(preview) => {
            println!(
                "{}: next up Workout {} of {}",
                preview.program.name,
                preview.workout_number,
                preview.program.workouts.len()
            );
            match preview.workout {
                None => println!(
                    "  No exercises configured for Workout {}. Edit the program to add some.",
                    preview.workout_number
                ),
                Some(workout) => {
                    let last = store
                        .last_completed_workout(preview.program.id, preview.workout_number);
                    for slot in &workout.exercises {
                        println!(
                            "  {}: {} sets",
                            exercise_name(store, slot.exercise_id),
                            slot.target_sets
                        );
                        if let Some(last) = &last {
                            let summary = format_performance(last.sets_for(slot.exercise_id));
                            if !summary.is_empty() {
                                println!("    last time: {}", summary.render(unit));
                            }
                        }
                    }
                }
            }
        }
        SessionPhase::Logging(sheet) => {
            let program_name = sheet
                .program
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("(deleted program)");
            println!(
                "In progress: {} Workout {} (session {}, started {})",
                program_name,
                sheet.session.workout_number,
                sheet.session.id,
                sheet.session.date.format("%Y-%m-%d %H:%M")
            );
            for entry in sheet.entries.iter().chain(sheet.extras.iter()) {
                let name = entry
                    .exercise
                    .as_ref()
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| format!("(deleted exercise {})", entry.exercise_id));
                match entry.target_sets {
                    Some(target) => println!("  {}: {}/{} sets", name, entry.logged.len(), target),
                    None => println!("  {}: {} sets (extra)", name, entry.logged.len()),
                }
                for set in &entry.logged {
                    println!(
                        "    #{}  {}{} × {}",
                        set.id,
                        format_weight(set.weight),
                        unit,
                        set.reps
                    );
                }
                let last = format_performance(&entry.last_time);
                if !last.is_empty() {
                    println!("    last time: {}", last.render(unit));
                }
            }
        }
    }
    Ok(())
}

fn cmd_exercise(store: &mut Store, command: ExerciseCommand, unit: &str) -> Result<()> {
    match command {
        ExerciseCommand::List => {
            for (group, exercises) in store.exercises_by_muscle_group() {
                println!("{}", group);
                for exercise in exercises {
                    let marker = if exercise.is_custom { " (custom)" } else { "" };
                    println!("  {:>3}  {}{}", exercise.id.0, exercise.name, marker);
                }
            }
        }
        ExerciseCommand::Add { name, muscle } => {
            let group = parse_muscle_group(&muscle)?;
            let exercise = store.add_custom_exercise(&name, group)?;
            println!("✓ Added exercise {} '{}' ({})", exercise.id, exercise.name, group);
        }
        ExerciseCommand::Notes { exercise, text } => {
            let id = resolve_exercise(store, &exercise)?;
            store.update_exercise_notes(id, &text)?;
            println!("✓ Updated notes for {}", exercise_name(store, id));
        }
        ExerciseCommand::Delete { exercise } => {
            let id = resolve_exercise(store, &exercise)?;
            let name = exercise_name(store, id);
            store.delete_exercise(id)?;
            println!("✓ Deleted exercise {} '{}'", id, name);
        }
        ExerciseCommand::History { exercise } => {
            let id = resolve_exercise(store, &exercise)?;
            let name = exercise_name(store, id);
            let history = store.history_for(id);
            if history.is_empty() {
                println!("No history for {}.", name);
                return Ok(());
            }
            println!("{}", name);
            if let Some(notes) = store.exercise(id).map(|e| e.notes.as_str()) {
                if !notes.is_empty() {
                    println!("  notes: {}", notes);
                }
            }
            for entry in history {
                let program = entry.program_name.as_deref().unwrap_or("(deleted program)");
                let marker = if entry.is_complete { "" } else { " (in progress)" };
                println!(
                    "  {}  {} W{}{}  {}",
                    entry.date.format("%Y-%m-%d"),
                    program,
                    entry.workout_number,
                    marker,
                    entry.performance().render(unit)
                );
            }
        }
    }
    Ok(())
}

fn cmd_program(store: &mut Store, command: ProgramCommand) -> Result<()> {
    match command {
        ProgramCommand::List => {
            if store.list_programs().is_empty() {
                println!("No programs yet.");
            }
            for program in store.list_programs() {
                let marker = if program.is_active { "*" } else { " " };
                println!(
                    "{} {:>3}  {}  ({} workouts, next: {})",
                    marker,
                    program.id.0,
                    program.name,
                    program.workouts.len(),
                    program.current_workout
                );
            }
        }
        ProgramCommand::Show { id } => {
            let program = store
                .program(id)
                .ok_or_else(|| Error::NotFound(format!("program {}", id)))?;
            let status = if program.is_active { " (active)" } else { "" };
            println!("{}{}", program.name, status);
            let mut workouts: Vec<&WorkoutDef> = program.workouts.iter().collect();
            workouts.sort_by_key(|w| w.workout_number);
            for workout in workouts {
                let pointer = if workout.workout_number == program.current_workout {
                    "  <- next"
                } else {
                    ""
                };
                println!("  Workout {}{}", workout.workout_number, pointer);
                for slot in &workout.exercises {
                    println!(
                        "    {}: {} sets",
                        exercise_name(store, slot.exercise_id),
                        slot.target_sets
                    );
                }
            }
        }
        ProgramCommand::Create { file } => {
            let draft = load_program_file(store, &file)?;
            let program = store.create_program(draft)?;
            println!("✓ Created program {} '{}'", program.id, program.name);
        }
        ProgramCommand::Update { id, file } => {
            let draft = load_program_file(store, &file)?;
            let program = store.update_program(id, draft)?;
            println!(
                "✓ Updated program {} '{}' (next: Workout {})",
                program.id, program.name, program.current_workout
            );
        }
        ProgramCommand::Delete { id } => {
            store.delete_program(id)?;
            println!("✓ Deleted program {}", id);
        }
        ProgramCommand::Activate { id } => {
            store.activate(id)?;
            if let Some(program) = store.program(id) {
                println!(
                    "✓ Activated '{}' (next: Workout {})",
                    program.name, program.current_workout
                );
            }
        }
    }
    Ok(())
}

fn active_session_id(store: &Store) -> Result<SessionId> {
    store
        .active_session()
        .map(|s| s.id)
        .ok_or_else(|| Error::Constraint("No workout in progress".into()))
}

fn cmd_workout(store: &mut Store, command: WorkoutCommand, unit: &str) -> Result<()> {
    match command {
        WorkoutCommand::Start => {
            let program = store
                .active_program()
                .ok_or_else(|| Error::Constraint("No active program".into()))?;
            let (program_id, program_name) = (program.id, program.name.clone());

            match store.start(program_id)? {
                StartOutcome::Started(session) => println!(
                    "✓ Started {} Workout {} (session {})",
                    program_name, session.workout_number, session.id
                ),
                StartOutcome::NoWorkoutDefined { workout_number } => println!(
                    "Workout {} of '{}' has no exercises configured. Edit the program to add some.",
                    workout_number, program_name
                ),
            }
        }
        WorkoutCommand::Log {
            exercise,
            weight,
            reps,
        } => {
            let input = SetInput::parse(&weight, &reps)?;
            let session_id = active_session_id(store)?;
            let exercise_id = resolve_exercise(store, &exercise)?;
            let set = store.log_set(session_id, exercise_id, input.weight, input.reps)?;
            println!(
                "✓ Logged set {}: {} {}{} × {}",
                set.id,
                exercise_name(store, exercise_id),
                format_weight(set.weight),
                unit,
                set.reps
            );
        }
        WorkoutCommand::Edit { set, weight, reps } => {
            let input = SetInput::parse(&weight, &reps)?;
            let set = store.edit_set(set, input.weight, input.reps)?;
            println!(
                "✓ Set {} is now {}{} × {}",
                set.id,
                format_weight(set.weight),
                unit,
                set.reps
            );
        }
        WorkoutCommand::DeleteSet { set } => {
            store.delete_set(set)?;
            println!("✓ Deleted set {}", set);
        }
        WorkoutCommand::Finish => {
            let session_id = active_session_id(store)?;
            let outcome = store.finish(session_id)?;
            match outcome.next_workout {
                Some(next) => println!("✓ Workout complete. Next up: Workout {}", next),
                None => println!("✓ Workout complete."),
            }
        }
        WorkoutCommand::Cancel => {
            let session_id = active_session_id(store)?;
            let removed = store.cancel(session_id)?;
            println!("✓ Cancelled workout ({} sets discarded)", removed);
        }
    }
    Ok(())
}

fn cmd_export(store: &Store, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            store.export_to_file(&path)?;
            println!("✓ Exported to {}", path.display());
        }
        None => println!("{}", store.export_json()?),
    }
    Ok(())
}

fn cmd_import(store: &mut Store, file: &Path) -> Result<()> {
    let summary = store.import_from_file(file)?;
    println!(
        "✓ Imported {} exercises, {} programs, {} sessions, {} sets",
        summary.exercises, summary.programs, summary.workout_sessions, summary.sets
    );
    Ok(())
}
