use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use skycast_core::{
    Config, Dashboard, DashboardState, FileStore, HistoryStore, KeyValueStore, ReadingCache,
    SearchOutcome, TimeLocale, provider_from_config,
};
use tokio::sync::watch;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather dashboard with search history")]
pub struct Cli {
    /// Directory for the search history and last reading (defaults to the
    /// platform data directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show the current dashboard, fetching the default city if nothing is
    /// cached. A cached dashboard is shown even without an API key.
    Show,

    /// Look up the weather for a city.
    Search {
        /// City name; several words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// List recent searches.
    History {
        /// Pick an entry and look it up again (needs an API key).
        #[arg(long)]
        select: bool,
    },

    /// Prompt for cities until cancelled.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let locale = TimeLocale::system();

        match &self.command {
            Command::Configure => configure().await?,
            Command::Show => {
                let store = self.store()?;
                match Config::load().and_then(|config| provider_from_config(&config)) {
                    Ok(provider) => {
                        let dashboard = Dashboard::new(provider, store);
                        dashboard.startup().await;
                        print!("{}", render::dashboard(&dashboard.snapshot(), &locale));
                    }
                    Err(err) => {
                        let state = cached_state(store);
                        if state.reading.is_none() {
                            return Err(err);
                        }
                        tracing::info!(error = %err, "no usable API key; showing cached dashboard");
                        print!("{}", render::dashboard(&state, &locale));
                    }
                }
            }
            Command::Search { city } => {
                let dashboard = self.open_dashboard()?;
                let query = city.join(" ");
                if dashboard.search(&query).await == SearchOutcome::Skipped {
                    println!("Nothing to search for.");
                    return Ok(());
                }
                print!("{}", render::dashboard(&dashboard.snapshot(), &locale));
            }
            Command::History { select: false } => {
                let history = HistoryStore::new(self.store()?).load();
                print!("{}", render::history(&history));
            }
            Command::History { select: true } => {
                let dashboard = self.open_dashboard()?;
                if let Some(city) = pick_from_history(&dashboard.snapshot()).await? {
                    dashboard.select_from_history(&city).await;
                    print!("{}", render::dashboard(&dashboard.snapshot(), &locale));
                }
            }
            Command::Interactive => {
                let dashboard = self.open_dashboard()?;
                interactive(&dashboard, &locale).await?;
            }
        }

        Ok(())
    }

    fn store(&self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        let store = match &self.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::default_location()?,
        };
        tracing::debug!(dir = %store.dir().display(), "using storage directory");
        Ok(Arc::new(store))
    }

    fn open_dashboard(&self) -> anyhow::Result<Dashboard> {
        let config = Config::load()?;
        let provider = provider_from_config(&config)?;
        Ok(Dashboard::new(provider, self.store()?))
    }
}

/// Persisted state as it would be restored, without a provider.
fn cached_state(store: Arc<dyn KeyValueStore>) -> DashboardState {
    DashboardState {
        reading: ReadingCache::new(store.clone()).load_last(),
        error: None,
        history: HistoryStore::new(store).load(),
    }
}

async fn configure() -> anyhow::Result<()> {
    let Some(api_key) = prompt(|| {
        Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
    })
    .await?
    else {
        println!("Configuration cancelled.");
        return Ok(());
    };

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let mut config = Config::load()?;
    config.set_api_key(api_key);
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn pick_from_history(state: &DashboardState) -> anyhow::Result<Option<String>> {
    if state.history.is_empty() {
        print!("{}", render::history(&state.history));
        return Ok(None);
    }

    let options = state.history.entries().to_vec();
    prompt(move || Select::new("Pick a city:", options).prompt()).await
}

async fn interactive(dashboard: &Dashboard, locale: &TimeLocale) -> anyhow::Result<()> {
    let mut updates = dashboard.subscribe();

    print!("{}", render::dashboard(&dashboard.snapshot(), locale));
    dashboard.startup().await;
    redraw_if_changed(&mut updates, locale);

    loop {
        let Some(input) = prompt(|| {
            Text::new("City:")
                .with_help_message(":history to pick a recent city, :quit or Esc to exit")
                .prompt()
        })
        .await?
        else {
            break;
        };

        let outcome = match input.trim() {
            ":quit" => break,
            ":history" => match pick_from_history(&dashboard.snapshot()).await? {
                Some(city) => dashboard.select_from_history(&city).await,
                None => continue,
            },
            _ => dashboard.search(&input).await,
        };

        tracing::debug!(?outcome, "interactive action finished");
        redraw_if_changed(&mut updates, locale);
    }

    Ok(())
}

fn redraw_if_changed(updates: &mut watch::Receiver<DashboardState>, locale: &TimeLocale) {
    if !updates.has_changed().unwrap_or(false) {
        return;
    }
    let state = updates.borrow_and_update().clone();
    println!();
    print!("{}", render::dashboard(&state, locale));
}

/// Run a blocking inquire prompt off the async workers. Cancelling the prompt
/// (Esc or Ctrl-C) yields `None`.
async fn prompt<T, F>(f: F) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> inquire::error::InquireResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.context("Prompt task failed")?;

    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Failed to read input"),
    }
}
