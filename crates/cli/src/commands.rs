// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context as _, Result};
use clap::ArgMatches;
use console::style;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use std::sync::Arc;
use syncwatch_change_finder::{
    ChangeFinder, DocumentEvents, FinderSettings, LifecycleTransitions, PollSession,
};
use syncwatch_config::{Config, ConfigManager, FinderConfig, StoreBackend};
use syncwatch_core::{
    CollectionMembership, LogEntry, LogStore, MemoryLogStore, MemoryWatermarkStore, Principal,
    SyncWatchError, SynchronizationRoots, SystemClock, WatermarkStore,
};
use syncwatch_database::{SqliteLogStore, SqliteSettings, SqliteWatermarkStore};
use syncwatch_resilience::{with_retry, RetryPolicy, Timeout};

/// Log and cursor stores selected by `store.backend`
pub enum Backend {
    Memory {
        log: Arc<MemoryLogStore>,
        cursors: Arc<MemoryWatermarkStore>,
    },
    Sqlite {
        log: Arc<SqliteLogStore>,
        cursors: Arc<SqliteWatermarkStore>,
    },
}

impl Backend {
    /// Opens the configured backend, migrating the SQLite schema if needed
    pub async fn open(config: &Config, config_dir: &Path) -> Result<Self> {
        match config.store.backend {
            StoreBackend::Memory => {
                log::info!("Using the in-memory log store");
                Ok(Self::Memory {
                    log: Arc::new(MemoryLogStore::new()),
                    cursors: Arc::new(MemoryWatermarkStore::new()),
                })
            }
            StoreBackend::Sqlite => {
                let settings = SqliteSettings::at(config.store.resolved_database_path(config_dir))
                    .pool_size(config.store.max_connections)
                    .wal(config.store.enable_wal);
                let log = SqliteLogStore::open(&settings)
                    .await
                    .context("Failed to open the SQLite log store")?;
                let cursors = SqliteWatermarkStore::new(log.pool().clone());
                Ok(Self::Sqlite {
                    log: Arc::new(log),
                    cursors: Arc::new(cursors),
                })
            }
        }
    }

    pub fn log_store(&self) -> Arc<dyn LogStore> {
        match self {
            Self::Memory { log, .. } => Arc::clone(log) as Arc<dyn LogStore>,
            Self::Sqlite { log, .. } => Arc::clone(log) as Arc<dyn LogStore>,
        }
    }

    pub fn cursor_store(&self) -> Arc<dyn WatermarkStore> {
        match self {
            Self::Memory { cursors, .. } => Arc::clone(cursors) as Arc<dyn WatermarkStore>,
            Self::Sqlite { cursors, .. } => Arc::clone(cursors) as Arc<dyn WatermarkStore>,
        }
    }

    /// Write path; returns the id the entry is stored under.
    ///
    /// A positive id is kept as given, the way entries replicated from
    /// another node arrive. Any other id is assigned by the store.
    pub async fn append(&self, entry: LogEntry) -> Result<i64, SyncWatchError> {
        if entry.id > 0 {
            let id = entry.id;
            match self {
                Self::Memory { log, .. } => log.insert(entry)?,
                Self::Sqlite { log, .. } => log.insert(&entry).await?,
            }
            return Ok(id);
        }
        match self {
            Self::Memory { log, .. } => log.append(entry),
            Self::Sqlite { log, .. } => log.append(&entry).await,
        }
    }
}

/// Maps the `finder` config section onto the settings the finder runs with
pub fn finder_settings(config: &FinderConfig) -> FinderSettings {
    let settings = FinderSettings {
        root_event_category: config.root_event_category.clone(),
        root_registered_event: config.root_registered_event.clone(),
        root_unregistered_event: config.root_unregistered_event.clone(),
        impacted_user_key: config.impacted_user_key.clone(),
        document_events: None,
        default_limit: config.default_limit,
    };

    match &config.document_events {
        Some(event_ids) => settings.with_document_events(DocumentEvents {
            event_ids: event_ids.clone(),
            lifecycle: config
                .track_lifecycle_transitions
                .then(LifecycleTransitions::default),
            ..DocumentEvents::default()
        }),
        None => settings,
    }
}

/// Everything a command needs, built once per invocation
pub struct Context {
    pub backend: Backend,
    pub finder: Arc<ChangeFinder>,
}

impl Context {
    pub async fn open(config: Config, config_dir: &Path) -> Result<Self> {
        let backend = Backend::open(&config, config_dir).await?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: Config, backend: Backend) -> Self {
        let finder = ChangeFinder::new(
            backend.log_store(),
            Arc::new(config.repositories),
            Arc::new(SystemClock),
            finder_settings(&config.finder),
        );
        Self {
            backend,
            finder: Arc::new(finder),
        }
    }

    pub fn session(&self) -> PollSession {
        PollSession::new(Arc::clone(&self.finder), self.backend.cursor_store())
    }
}

/// Create the config file and, for the SQLite backend, the database
pub async fn init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write the default config")?;
    if created {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!(
            "Config already present at {}",
            manager.config_path().display()
        );
    }

    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    Backend::open(&config, manager.config_dir()).await?;
    println!(
        "{} {} log store ready",
        style("✓").green().bold(),
        style(config.store.backend).cyan()
    );
    Ok(())
}

/// Parses a JSON log entry; `id` may be left out or set to 0
pub fn parse_entry(raw: &str) -> Result<LogEntry> {
    let mut value: Value = serde_json::from_str(raw).context("Entry is not valid JSON")?;
    let object = match value.as_object_mut() {
        Some(object) => object,
        None => bail!("Entry must be a JSON object"),
    };
    object.entry("id").or_insert(json!(0));
    serde_json::from_value(value).context("Entry does not describe a log entry")
}

pub async fn append(context: &Context, matches: &ArgMatches) -> Result<Value> {
    let raw = matches
        .get_one::<String>("entry")
        .ok_or_else(|| anyhow::anyhow!("Entry is required"))?;
    let entry = parse_entry(raw)?;
    let id = context
        .backend
        .append(entry)
        .await
        .context("Failed to append the entry")?;
    Ok(json!({ "id": id }))
}

fn principal(matches: &ArgMatches) -> Result<Principal> {
    let user = matches
        .get_one::<String>("user")
        .ok_or_else(|| anyhow::anyhow!("User is required"))?;
    let repository = matches
        .get_one::<String>("repository")
        .map(String::as_str)
        .unwrap_or("default");
    Ok(Principal::new(user.as_str(), repository))
}

fn scope(matches: &ArgMatches) -> Result<(SynchronizationRoots, CollectionMembership)> {
    let roots = SynchronizationRoots::new(
        matches
            .get_many::<String>("root")
            .into_iter()
            .flatten(),
    )
    .context("Invalid synchronization root")?;
    let collections = CollectionMembership::new(
        matches
            .get_many::<String>("collection")
            .into_iter()
            .flatten(),
    );
    Ok((roots, collections))
}

fn limit(context: &Context, matches: &ArgMatches) -> usize {
    matches
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or_else(|| context.finder.default_limit())
}

pub async fn upper_bound(context: &Context, matches: &ArgMatches) -> Result<Value> {
    let principal = principal(matches)?;
    let upper_bound = context
        .finder
        .upper_bound_for(&principal)
        .await
        .context("Failed to compute the upper bound")?;
    Ok(json!({ "user": principal.name(), "upper_bound": upper_bound }))
}

pub async fn changes(context: &Context, matches: &ArgMatches) -> Result<Value> {
    let principal = principal(matches)?;
    let (roots, collections) = scope(matches)?;
    let lower_bound = matches.get_one::<i64>("since").copied().unwrap_or(-1);
    let limit = limit(context, matches);

    let summary = match matches.get_one::<i64>("pinned-upper") {
        Some(upper_bound) => {
            context
                .finder
                .find_changes_in_range(
                    &principal,
                    &roots,
                    &collections,
                    lower_bound,
                    *upper_bound,
                    limit,
                )
                .await
        }
        None => {
            context
                .finder
                .find_changes(&principal, &roots, &collections, lower_bound, limit)
                .await
        }
    }
    .context("Failed to find changes")?;

    Ok(serde_json::to_value(summary)?)
}

pub async fn poll(context: &Context, matches: &ArgMatches) -> Result<Value> {
    let principal = principal(matches)?;
    let (roots, collections) = scope(matches)?;
    let limit = limit(context, matches);
    let attempts = matches.get_one::<usize>("retries").copied().unwrap_or(3);
    let policy = RetryPolicy::new(attempts.max(1));
    let timeout = Timeout::new(Duration::from_secs(
        matches.get_one::<u64>("timeout").copied().unwrap_or(60),
    ));

    let session = context.session();
    let (session_ref, principal_ref, roots_ref, collections_ref) =
        (&session, &principal, &roots, &collections);
    let summary = timeout
        .run(with_retry(&policy, SyncWatchError::is_transient, move || {
            session_ref.poll(principal_ref, roots_ref, collections_ref, limit)
        }))
        .await
        .context("Poll did not finish in time")?
        .context("Failed to poll for changes")?;

    if !matches.get_flag("no-ack") {
        session
            .acknowledge(&principal, &summary)
            .await
            .context("Failed to store the new cursor")?;
    }

    Ok(serde_json::to_value(summary)?)
}
