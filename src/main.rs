use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use petfarm::app::{FarmApp, FrameLoop};
use petfarm::config::FarmConfig;
use petfarm::journal::Farm;
use petfarm::pet::PetKind;
use petfarm::scene::HeadlessScene;
use petfarm::store::{self, FileStore};
use petfarm::sync::SyncClient;

/// Headless pet farm: roam the island, keep a diary, earn pets.
#[derive(Parser, Debug)]
#[command(name = "petfarm", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the saved farm
    #[arg(short, long, default_value = "farm-data")]
    data_dir: PathBuf,

    /// Seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation
    Run {
        /// Number of frames to simulate
        #[arg(long, default_value_t = 600)]
        frames: u64,

        /// Pace frames against the wall clock
        #[arg(long)]
        realtime: bool,
    },
    /// Write a diary entry (earns a dog)
    Diary { text: String },
    /// Add a note
    Note { text: String },
    /// Complete a note (earns a cat)
    CompleteNote { id: String },
    /// Delete a note (gives back a cat)
    DeleteNote { id: String },
    /// Delete a diary entry (gives back its pet)
    DeleteDiary { id: String },
    /// Adopt a pet of the given kind, or a random one
    Adopt { kind: Option<PetKind> },
    /// Write a backup file
    Export { path: Option<PathBuf> },
    /// Restore a backup file
    Import { path: PathBuf },
    /// Print the farm's contents
    Status,
}

fn main() {
    env_logger::init();
    log::info!("petfarm starting up");

    if let Err(e) = run(Args::parse()) {
        log::error!("Fatal error: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => FarmConfig::load(path)?,
        None => FarmConfig::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    let store = FileStore::open(&args.data_dir)?;
    let farm = Farm::open(store, SyncClient::offline(), rng.fork());
    let tick = config.tick_seconds();
    let mut app = FarmApp::new(config, farm, HeadlessScene::new(), rng)?;

    match args.command {
        Command::Run { frames, realtime } => {
            let mut frame_loop = FrameLoop::new(tick);
            if realtime {
                frame_loop.run(&mut app, Some(frames));
            } else {
                frame_loop.step_frames(&mut app, frames);
            }
            let debug = app.debug();
            println!(
                "{} ticks, {} pets roaming, {} errors",
                app.sim().tick_count(),
                app.sim().pet_count(),
                debug.error_count
            );
            for msg in debug.messages.iter() {
                println!("[{:?}] {}", msg.level, msg.text);
            }
        }
        Command::Diary { text } => {
            app.save_diary(&text)?;
            println!("diary saved, {} pets now", app.farm().pets().len());
        }
        Command::Note { text } => {
            let note = app.add_note(&text)?;
            println!("note {} added", note.id);
        }
        Command::CompleteNote { id } => app.complete_note(&id)?,
        Command::DeleteNote { id } => app.delete_note(&id)?,
        Command::DeleteDiary { id } => app.delete_diary(&id)?,
        Command::Adopt { kind } => {
            app.adopt_pet(kind);
            println!("{} pets now", app.farm().pets().len());
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| store::backup_file_name(chrono::Utc::now()).into());
            fs::write(&path, app.export()?)?;
            println!("backup written to {}", path.display());
        }
        Command::Import { path } => {
            app.import(&fs::read_to_string(&path)?)?;
            println!("imported {} pets", app.farm().pets().len());
        }
        Command::Status => print_status(&app),
    }

    for err in app.debug().errors() {
        eprintln!("warning: {}", err.text);
    }
    Ok(())
}

fn print_status(app: &FarmApp<HeadlessScene, FileStore>) {
    let farm = app.farm();
    let stats = farm.stats();
    println!(
        "dogs: {}  cats: {}  diaries: {}  last entry: {}",
        stats.dogs,
        stats.cats,
        stats.total_diaries,
        stats
            .last_entry_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".into())
    );
    for note in farm.notes() {
        println!("note  {}  {}", note.id, note.content);
    }
    for diary in farm.diaries() {
        let reward = diary.pet_reward.map(|b| b.display_name()).unwrap_or("-");
        println!("diary {}  {}  ({reward})", diary.id, diary.content);
    }
    for msg in app.debug().messages.iter() {
        println!("[{:?}] {}", msg.level, msg.text);
    }
}
