//! Scene driver for CarbonScape.
//!
//! Wires the projection backend, the local cache, and the scene core
//! together, then runs every schedule on one tokio runtime until `q` or
//! Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `carbonscape.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the scene and the shared dataset handle
//! 4. Open the local store and the backend client
//! 5. Resolve the dataset for the stored identity on a spawned task
//! 6. Start the account task
//! 7. Run the render, timeline, ambient, dataset, and input loop

mod account;
mod command;
mod error;
mod frame_sink;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use carbonscape_client::{BackendClient, DatasetResolver, FileStore, LocalState, Session};
use carbonscape_core::config::SceneConfig;
use carbonscape_core::dataset::DatasetHandle;
use carbonscape_core::scene::Scene;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::account::AccountTask;
use crate::command::{Command, HELP};
use crate::error::ViewerError;
use crate::frame_sink::{FrameSink, LogSink};

/// Upper bound on the timeline poll interval. Advances are measured by
/// elapsed time, so polling finer than the period keeps them on schedule.
const TIMELINE_POLL: Duration = Duration::from_millis(100);

/// Floor for configured render and ambient periods.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Queue depth for account commands.
const ACCOUNT_QUEUE: usize = 16;

/// Application entry point for the viewer.
///
/// # Errors
///
/// Returns an error if configuration, the timeline, or the HTTP client
/// cannot be initialized. Nothing after startup is fatal.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report the source
    //    once the subscriber exists.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("carbonscape-viewer starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        base_url = config.backend.base_url,
        store_dir = config.storage.dir,
        advance_period_ms = config.timeline.advance_period_ms,
        frame_interval_ms = config.render.frame_interval_ms,
        forest_capacity = config.forest.capacity,
        "Configuration loaded"
    );

    // 3. Scene and dataset handle.
    let mut scene = Scene::new(&config).map_err(ViewerError::from)?;
    let datasets = DatasetHandle::new();
    let mut dataset_rx = datasets.subscribe();
    info!(
        period_ms = config.timeline.advance_period_ms,
        autoplay = config.timeline.autoplay,
        "Scene initialized"
    );

    // 4. Local store and backend client.
    let store = Arc::new(FileStore::new(&config.storage.dir));
    let state = LocalState::new(store, &config.storage.namespace);
    let client = BackendClient::new(&config.backend).map_err(ViewerError::from)?;
    let resolver = Arc::new(DatasetResolver::new(client.clone(), state.clone()));
    info!(base_url = client.base_url(), "Backend client ready");

    // 5. Initial resolution.
    {
        let ticket = datasets.begin();
        let resolver = Arc::clone(&resolver);
        let datasets = datasets.clone();
        tokio::spawn(async move {
            let resolved = resolver.resolve_stored().await;
            datasets.publish(ticket, resolved);
        });
    }

    // 6. Account task.
    let session = Session::restore(client, state).await;
    if let Some(user) = session.user() {
        info!(user = %user, "Restored identity");
    }
    let (account_tx, account_rx) = mpsc::channel(ACCOUNT_QUEUE);
    tokio::spawn(AccountTask::new(session, Arc::clone(&resolver), datasets.clone()).run(account_rx));

    // 7. Main loop.
    let mut sink = LogSink::new(config.logging.frame_log_every);
    let mut render = interval(config.render.frame_interval().max(MIN_PERIOD));
    let mut timeline = interval(config.timeline.advance_period().min(TIMELINE_POLL));
    let mut ambient = interval(config.ambient.period().max(MIN_PERIOD));
    for ticker in [&mut render, &mut timeline, &mut ambient] {
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_frame = Instant::now();
    let mut last_timeline = Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("{HELP}");

    loop {
        tokio::select! {
            now = render.tick() => {
                let elapsed = now.duration_since(last_frame);
                last_frame = now;
                let frame = scene.frame(elapsed);
                sink.present(&frame);
            }
            now = timeline.tick() => {
                let elapsed = now.duration_since(last_timeline);
                last_timeline = now;
                if scene.tick_timeline(elapsed) {
                    debug!(year = ?scene.timeline().current_year(), "year advanced");
                }
            }
            _ = ambient.tick() => {
                scene.tick_ambient();
            }
            changed = dataset_rx.changed() => {
                if changed.is_err() {
                    warn!("dataset handle closed");
                    break;
                }
                let current = dataset_rx.borrow_and_update().current.clone();
                if let Some(resolved) = current {
                    info!(
                        source = resolved.source.as_str(),
                        years = resolved.dataset.len(),
                        "Dataset applied"
                    );
                    scene.set_dataset(resolved.dataset);
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&line, &mut scene, &account_tx) {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed, running until interrupted");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %ViewerError::from(e), "stdin unreadable");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    info!(
        year = ?scene.timeline().current_year(),
        "carbonscape-viewer stopped"
    );
    Ok(())
}

/// Apply one operator line. Returns `false` when the viewer should stop.
fn handle_line(
    line: &str,
    scene: &mut Scene,
    account_tx: &mpsc::Sender<command::AccountCommand>,
) -> bool {
    let parsed = Command::parse(line, scene.timeline().current_year());
    match parsed {
        Ok(Command::TogglePause) => {
            scene.toggle_pause();
            info!(paused = scene.timeline().is_paused(), "Playback toggled");
        }
        Ok(Command::SelectYear(year)) => {
            if scene.select_year(&year) {
                info!(year = %year, "Year selected");
            } else {
                warn!(year = %year, "Year not in dataset");
            }
        }
        Ok(Command::Health) => {
            for reading in scene.health_report() {
                info!(animal = reading.animal, health = reading.health, "health");
            }
        }
        Ok(Command::Account(command)) => {
            account::submit(account_tx, command);
        }
        Ok(Command::Help) => info!("{HELP}"),
        Ok(Command::Quit) => return false,
        Err(command::ParseError::Empty) => {}
        Err(e) => warn!(error = %e, "{HELP}"),
    }
    true
}

/// Load configuration from `carbonscape.yaml`.
///
/// Falls back to defaults if the file does not exist. Environment
/// overrides apply either way. The flag reports whether the file was read.
fn load_config() -> Result<(SceneConfig, bool), ViewerError> {
    let config_path = Path::new("carbonscape.yaml");
    if config_path.exists() {
        let config = SceneConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = SceneConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}
