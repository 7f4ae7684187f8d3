//! Noteblock CLI - convert, inspect and simulate note block songs

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

use noteblock::allocation::{playable_keys, required_counts};
use noteblock::discovery::discover;
use noteblock::sim::SimWorld;
use noteblock::{
    BlockPos, InstrumentTable, Lifecycle, NoteblockError, Player, PlayerConfig, SongSource,
};

#[derive(Parser)]
#[command(name = "noteblock")]
#[command(about = "Play MIDI songs on note blocks", long_about = None)]
struct Cli {
    /// Log every note, probe and increment
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a MIDI file and save it as a song file
    Convert {
        /// Input MIDI file
        midi: PathBuf,

        /// Output song file (.json)
        output: PathBuf,

        /// Song title (defaults to the MIDI track name)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Summarize a song and the blocks it needs
    Inspect {
        /// MIDI file or song file
        song: PathBuf,
    },

    /// Play a song in a simulated world
    Simulate {
        /// MIDI file or song file
        song: PathBuf,

        /// Player configuration (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pause playback after this many milliseconds
        #[arg(long)]
        pause_after_ms: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let result = match cli.command {
        Commands::Convert { midi, output, title } => convert(midi, output, title),
        Commands::Inspect { song } => inspect(song),
        Commands::Simulate { song, config, pause_after_ms } => {
            simulate(song, config, pause_after_ms).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn convert(midi: PathBuf, output: PathBuf, title: Option<String>) -> Result<(), NoteblockError> {
    let song = noteblock::convert_file(&midi, &output, title.as_deref())?;
    eprintln!(
        "Wrote '{}' ({} notes, {} sequences) to {}",
        song.title,
        song.note_count(),
        song.sequences.len(),
        output.display()
    );
    Ok(())
}

fn inspect(path: PathBuf) -> Result<(), NoteblockError> {
    let song = SongSource::from_path(&path)?.resolve(&PlayerConfig::default())?;
    let keys = song.key_range();
    let playable = playable_keys(&song);

    println!("Title:      {}", song.title);
    println!("PPQ:        {}", song.ppq);
    println!("Sequences:  {}", song.sequences.len());
    println!("Notes:      {}", song.note_count());
    println!("Duration:   {:.1} s", song.duration_ms() / 1000.0);
    println!("Keys:       {:?}", keys);
    println!("Unplayable: {}", keys.len() - playable.len());
    println!("Blocks needed:");
    for (family, count) in required_counts(&playable) {
        println!("  {:<9} {}", family.short_name(), count);
    }
    Ok(())
}

async fn simulate(
    path: PathBuf,
    config_path: Option<PathBuf>,
    pause_after_ms: Option<u64>,
) -> Result<(), NoteblockError> {
    let config = match config_path {
        Some(p) => PlayerConfig::load(p)?,
        None => PlayerConfig::default(),
    };
    let source = SongSource::from_path(&path)?;
    let table = InstrumentTable::new(&config.materials);

    let (mut world, mut observations) = SimWorld::new(table.clone());
    let mut supports: Vec<String> = Vec::new();
    supports.extend(config.materials.percussion.first().cloned());
    supports.extend(config.materials.bass.first().cloned());
    supports.push("dirt".to_string());
    supports.extend(config.materials.bell.first().cloned());

    // A floor of note blocks on mixed supports, each starting on an arbitrary step
    let center = BlockPos::new(0, 0, 0);
    let radius = config.discovery_radius;
    let mut index = 0usize;
    for x in -radius..=radius {
        for z in -radius..=radius {
            let support = &supports[index % supports.len()];
            let tone = (x * 7 + z * 3).rem_euclid(25) as u8;
            world.place_note_block(center.offset(x, 0, z), support, tone);
            index += 1;
        }
    }

    let blocks = discover(&world, center, radius, &table);
    eprintln!("Found {} note blocks", blocks.len());

    let outcome = {
        let mut player = Player::new(&mut world, &mut observations, config);
        let pause = player.pause_handle();
        let play = player.play_song(source, &blocks, |event| eprintln!("[{}] {}", event.reason(), event));
        let pauser = async {
            if let Some(ms) = pause_after_ms {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                pause.pause();
            }
        };
        let (outcome, ()) = tokio::join!(play, pauser);
        outcome?
    };

    if let Lifecycle::Pause(rest) = &outcome {
        eprintln!("Paused with {} notes left", rest.note_count());
    }
    eprintln!(
        "Actions: {} plays, {} increments",
        world.play_count(),
        world.increment_count()
    );
    Ok(())
}
