#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use crossword_core::model::{CrosswordDraft, Difficulty, Profile, ProfileId, Topic};
use services::{
    AuthoringService, CatalogService, Clock, LevelAccess, PuzzleSession, SessionDeps,
    SessionError, SessionParams, SessionRunner,
};
use storage::cache::{FileCache, LocalCache};
use storage::repository::{ProfileRepository, Storage};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod play;
mod render;
mod seed;
mod tutorial;

use config::{Overrides, Settings, prepare_database_url};

const PROFILE_KEY: &str = "profile-id";

#[derive(Parser, Debug)]
#[command(name = "crossword", version, about = "Project-management crosswords")]
struct Cli {
    /// TOML settings file (default: ./crossword.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite URL or path
    #[arg(long, global = true)]
    db: Option<String>,
    /// Local cache file for staged answers
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
    #[arg(long, global = true)]
    profile: Option<ProfileId>,
    #[arg(long, global = true)]
    username: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct Level {
    #[arg(long)]
    topic: Topic,
    #[arg(long)]
    difficulty: Difficulty,
}

/// Raw play route; parsed the same way the play page reads its URL.
#[derive(Args, Debug, Clone)]
struct Route {
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    id: Option<String>,
}

impl Route {
    fn params(&self) -> Result<SessionParams, SessionError> {
        SessionParams::from_route(
            self.topic.as_deref(),
            self.difficulty.as_deref(),
            self.id.as_deref(),
        )
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the built-in sample crosswords
    Seed {
        /// Also grant the current profile the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List the crosswords of a topic and difficulty
    Levels(Level),
    /// Show the tutorial of a topic and mark it read for a difficulty
    Tutorial(Level),
    /// Play one crossword interactively
    Play(Route),
    /// Validate a crossword draft (JSON) and publish it
    Author {
        #[arg(long)]
        file: PathBuf,
        /// Only validate and print the solved grid
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            db_url: self.db.clone(),
            cache_path: self.cache.clone(),
            profile_id: self.profile,
            username: self.username.clone(),
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The id configured for this device, or the one remembered in the local
/// cache, or a freshly generated one that is then remembered.
fn local_profile_id(settings: &Settings, cache: &dyn LocalCache) -> Result<ProfileId> {
    if let Some(id) = settings.profile_id {
        return Ok(id);
    }
    if let Some(raw) = cache.get(PROFILE_KEY)? {
        match raw.parse() {
            Ok(id) => return Ok(id),
            Err(e) => warn!(error = %e, "remembered profile id is invalid, creating a new one"),
        }
    }
    let id = ProfileId::random();
    cache.set(PROFILE_KEY, &id.to_string())?;
    info!(profile_id = %id, "created local profile");
    Ok(id)
}

async fn resolve_profile(
    storage: &Storage,
    settings: &Settings,
    cache: &dyn LocalCache,
) -> Result<Profile> {
    let id = local_profile_id(settings, cache)?;
    let existing = storage.profiles.get_profile(id).await?;
    let username = settings.username.clone().or_else(|| {
        existing
            .as_ref()
            .and_then(Profile::username)
            .map(ToString::to_string)
    });
    let profile = Profile::new(id, username, existing.as_ref().and_then(Profile::role));
    if existing.as_ref() != Some(&profile) {
        storage.profiles.upsert_profile(&profile).await?;
    }
    Ok(profile)
}

fn read_draft(path: &Path) -> Result<CrosswordDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read draft '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid draft '{}'", path.display()))
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.overrides())?;
    init_tracing(&settings.log_filter);

    // Open + migrate SQLite at startup; the library crates never touch paths.
    let db_url = prepare_database_url(&settings.db_url)?;
    let storage = Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("failed to open database '{db_url}'"))?;
    let cache = Arc::new(
        FileCache::open(&settings.cache_path)
            .with_context(|| format!("failed to open cache '{}'", settings.cache_path.display()))?,
    );
    let profile = resolve_profile(&storage, &settings, cache.as_ref()).await?;
    let clock = Clock::default_clock();
    info!(profile_id = %profile.id(), %db_url, "ready");

    match cli.command {
        Command::Seed { admin } => {
            let report = seed::seed(&storage, clock, &profile, admin).await?;
            println!(
                "seeded {} crossword(s), {} already present",
                report.inserted, report.skipped
            );
            if admin {
                println!("profile {} is now an admin", profile.id());
            }
        }
        Command::Levels(level) => {
            let catalog = CatalogService::new(&storage, clock);
            let menu = catalog
                .levels(profile.session(), level.topic, level.difficulty)
                .await?;
            print!("{}", render::level_menu(&menu));
        }
        Command::Tutorial(level) => {
            print!("{}", render::tutorial(level.topic));
            let catalog = CatalogService::new(&storage, clock);
            catalog
                .complete_tutorial(profile.session(), level.topic, level.difficulty)
                .await?;
            println!(
                "tutorial for {} / {} completed, levels unlocked",
                level.topic, level.difficulty
            );
        }
        Command::Play(route) => {
            let params = route.params()?;
            let id = params.crossword_id;
            let catalog = CatalogService::new(&storage, clock);
            let access = catalog
                .open_level(profile.session(), params.topic, params.difficulty, Some(id))
                .await?;
            match access {
                LevelAccess::Play(_) => {}
                LevelAccess::Locked | LevelAccess::Tutorial => bail!(
                    "level locked: run `crossword tutorial --topic {} --difficulty {}` first",
                    params.topic,
                    params.difficulty
                ),
            }

            let deps = SessionDeps::new(&storage, cache.clone(), clock);
            let session = PuzzleSession::bootstrap(deps, profile.session(), params, &settings.session)
                .await
                .with_context(|| format!("cannot open crossword {id}"))?;
            if let Some(description) = session.crossword().description() {
                println!("{description}");
            }
            print!("{}", render::clues(session.crossword().definition()));
            let handle = SessionRunner::spawn(session, settings.session);
            play::run(handle).await?;
        }
        Command::Author { file, dry_run } => {
            let draft = read_draft(&file)?;
            let authoring = AuthoringService::new(&storage, clock);
            if dry_run {
                let preview = authoring.preview(draft)?;
                println!(
                    "{} ({} / {}), time limit {}s",
                    preview.crossword.title,
                    preview.crossword.topic,
                    preview.crossword.difficulty,
                    preview.crossword.time_limit_secs
                );
                print!("{}", render::clues(&preview.crossword.definition));
                print!("{}", render::solution_grid(preview.grid_size, &preview.solution));
            } else {
                let id = authoring.publish(&profile, draft).await?;
                println!("published crossword {id}");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
