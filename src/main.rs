use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bookmarks;
mod cache;
mod cli;
mod config;
mod feedback;
mod history;
mod index;
mod lock;
mod scheduler;
mod settings;
mod storage;
#[cfg(test)]
mod tests;
mod walker;

use bookmarks::ProfileSource;
use cache::Cache;
use cli::{Command, ProfileArgs};
use config::Config;
use feedback::Feedback;
use index::{IndexBuilder, QueryEngine, QueryOutcome};
use lock::RebuildLock;
use scheduler::{ProcessLauncher, RefreshScheduler};
use settings::SettingsStore;

fn init_logging() {
    // stdout carries the item list, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config() -> anyhow::Result<Config> {
    let base_path = config::base_path()?;
    Config::load_with(&base_path)
}

fn run_query(config: &Config, query: &str) -> anyhow::Result<Feedback> {
    let settings = SettingsStore::new(config.base_path())?;
    let cache = Cache::new(&config.cache_dir())?;
    let builder = IndexBuilder::new(config, &settings, &cache);
    let launcher = ProcessLauncher;
    let scheduler = RefreshScheduler::new(config, &cache, &launcher);

    let index = match builder.current_index() {
        Ok(Some(index)) => index,
        Ok(None) => {
            scheduler.ensure_index();
            return Ok(Feedback::indexing());
        }
        Err(err) => {
            log::error!("failed to open slot {}: {err}", builder.current_slot());
            scheduler.ensure_index();
            return Ok(Feedback::indexing());
        }
    };

    let outcome = match QueryEngine::new(&index).search(query) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::error!("search failed: {err}");
            QueryOutcome::NoMatches
        }
    };

    // staleness never delays the response that was already computed
    scheduler.refresh_if_stale();

    Ok(Feedback::from_outcome(&outcome))
}

fn run_update_index(config: &Config) -> anyhow::Result<()> {
    let Some(_lock) = RebuildLock::try_acquire(config.base_path())? else {
        log::info!("another rebuild is running");
        return Ok(());
    };

    let settings = SettingsStore::new(config.base_path())?;
    let cache = Cache::new(&config.cache_dir())?;
    let builder = IndexBuilder::new(config, &settings, &cache);

    let profiles: Vec<ProfileSource> = config
        .profiles
        .iter()
        .map(|profile| ProfileSource::new(config, profile))
        .collect();

    let index = builder.rebuild(&profiles)?;
    log::info!("{} documents in slot {}", index.doc_count()?, index.slot());
    Ok(())
}

fn run_status(config: &Config) -> anyhow::Result<()> {
    let settings = SettingsStore::new(config.base_path())?;
    let cache = Cache::new(&config.cache_dir())?;
    let builder = IndexBuilder::new(config, &settings, &cache);
    let launcher = ProcessLauncher;
    let scheduler = RefreshScheduler::new(config, &cache, &launcher);

    let (index_dir, documents) = match builder.current_index()? {
        Some(index) => (Some(index.dir().display().to_string()), Some(index.doc_count()?)),
        None => (None, None),
    };

    let status = serde_json::json!({
        "current_slot": builder.current_slot().to_string(),
        "index_dir": index_dir,
        "documents": documents,
        "fresh": scheduler.is_fresh(),
        "rebuild_in_progress": scheduler.rebuild_in_progress(),
        "profiles": config.profiles,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = cli::Args::parse();

    match args.command {
        Command::Query { query } => {
            let query = query.unwrap_or_default();
            let feedback = match load_config().and_then(|config| run_query(&config, &query)) {
                Ok(feedback) => feedback,
                Err(err) => {
                    log::error!("query failed: {err:#}");
                    Feedback::from_outcome(&QueryOutcome::NoMatches)
                }
            };
            println!("{}", feedback.to_json()?);
            Ok(())
        }

        Command::UpdateIndex {} => {
            let config = load_config()?;
            run_update_index(&config)
        }

        Command::Status {} => {
            let config = load_config()?;
            run_status(&config)
        }

        Command::Profile { action } => {
            let mut config = load_config()?;
            match action {
                ProfileArgs::Add { name } => {
                    if config.add_profile(&name) {
                        config.save()?;
                        println!("profile {name} added");
                    } else {
                        println!("profile {name} is already indexed");
                    }
                }
                ProfileArgs::Remove { name } => {
                    if config.remove_profile(&name) {
                        config.save()?;
                        println!("profile {name} removed");
                    } else {
                        println!("profile {name} is not indexed");
                    }
                }
                ProfileArgs::List {} => {
                    for profile in &config.profiles {
                        let source = ProfileSource::new(&config, profile);
                        let marker = if source.bookmarks_path.is_file() { "" } else { " (missing)" };
                        println!("{profile}{marker}");
                    }
                }
            }
            Ok(())
        }
    }
}
