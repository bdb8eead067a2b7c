mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Args, Command};
use pmoaltplaylist::filter::dedup_by_uri;
use pmoaltplaylist::{
    BuildMode, BuildSession, LengthMultiplier, PlatformClient, PlaylistBuilder, ProgressReport,
    RecommenderClient, SessionOutcome, Track, ValidatedIdCache,
};
use pmoconfig::Config;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let directory = match &args.config {
        Some(path) => path.to_string_lossy().to_string(),
        None => String::new(),
    };
    let config = Config::load_config(&directory)?;
    init_logging(&config)?;

    match args.command {
        Command::Queue => show_queue(&config).await,
        Command::Generate {
            multiplier,
            playlist,
            extend,
            enqueue,
        } => {
            let multiplier = LengthMultiplier::try_from(multiplier)?;
            generate(&config, multiplier, playlist, extend, enqueue).await
        }
        Command::Cache { clear } => show_cache(&config, clear),
    }
}

/// Installe le subscriber tracing ; `RUST_LOG` prime sur le niveau configuré
fn init_logging(config: &Config) -> Result<()> {
    if !config.get_log_enable_console()? {
        return Ok(());
    }

    let level = config.get_log_min_level()?.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn report(progress: ProgressReport) {
    eprintln!("[{:>3}%] {}", progress.percentage, progress.phase);
}

fn print_tracks(tracks: &[Track]) {
    for (index, track) in tracks.iter().enumerate() {
        println!("{:>3}. {}  [{}]", index + 1, track.label(), track.uri);
    }
}

async fn show_queue(config: &Config) -> Result<()> {
    let platform = PlatformClient::from_config_obj(config)?;
    let snapshot = platform.queue_snapshot().await?;

    match &snapshot.currently_playing {
        Some(track) => println!("Now playing: {}", track.label()),
        None => println!("Nothing playing"),
    }
    println!("{} track(s) queued", snapshot.queue.len());
    print_tracks(&snapshot.queue);
    Ok(())
}

async fn generate(
    config: &Config,
    multiplier: LengthMultiplier,
    playlist: Option<String>,
    extend: u32,
    enqueue: bool,
) -> Result<()> {
    let platform = Arc::new(PlatformClient::from_config_obj(config)?);
    let recommender = Arc::new(RecommenderClient::from_config_obj(config)?);
    let builder = PlaylistBuilder::from_config(platform.clone(), recommender, config)?;
    let session = Arc::new(BuildSession::new(Arc::new(builder)));

    let seeds = match &playlist {
        Some(id) => platform.playlist_tracks(id).await?,
        None => platform.queue_snapshot().await?.source_tracks(),
    };
    if seeds.is_empty() {
        bail!("No seed tracks: the queue (or playlist) is empty");
    }
    info!(seeds = seeds.len(), %multiplier, "Generating alternative playlist");

    let canceller = session.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling build");
            canceller.cancel();
        }
    });

    let mut outcome = session
        .request(seeds, multiplier, BuildMode::Alternative, report)
        .await?;
    let mut tracks = outcome.tracks().to_vec();

    for round in 0..extend {
        if matches!(outcome, SessionOutcome::Cancelled) || outcome.tracks().is_empty() {
            break;
        }
        info!(round = round + 1, "Extending playlist");
        outcome = session.extend(multiplier, report).await?;
        tracks.extend(outcome.tracks().iter().cloned());
    }
    interrupt.abort();

    if matches!(outcome, SessionOutcome::Cancelled) {
        println!("Build cancelled");
        return Ok(());
    }

    let tracks = dedup_by_uri(tracks);
    println!("{} track(s)", tracks.len());
    print_tracks(&tracks);

    if enqueue {
        for track in &tracks {
            platform.add_to_queue(&track.uri).await?;
        }
        info!(tracks = tracks.len(), "Playlist added to the player queue");
    }

    Ok(())
}

fn show_cache(config: &Config, clear: bool) -> Result<()> {
    let mut cache = ValidatedIdCache::from_config(config)?;
    if clear {
        cache.clear();
        println!("Validated-ID cache cleared");
    }

    let stats = cache.stats();
    println!("Entries: {}/{}", stats.entries, stats.max_entries);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("Oldest:  {}", oldest.to_rfc3339());
        println!("Newest:  {}", newest.to_rfc3339());
    }
    Ok(())
}
