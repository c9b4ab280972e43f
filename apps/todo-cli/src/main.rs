use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use runtime::{AppConfig, CliArgs};
use todo_sync::config::MODULE_NAME;
use todo_sync::contract::error::TodoSyncError;
use todo_sync::contract::model::{MediaSource, Task, TodoLocation};
use todo_sync::domain::error::DomainError;
use todo_sync::domain::media::MediaResolver;
use todo_sync::domain::ports::GeocodedPlace;
use todo_sync::domain::task_store::TaskEdit;
use todo_sync::infra::device::{PresetLocationDevice, PresetMediaDevice};
use todo_sync::infra::storage::JsonFileStore;
use todo_sync::{Devices, TodoSyncConfig, TodoSyncContext};

/// Todo CLI - task list client with optimistic sync
#[derive(Parser)]
#[command(name = "todo-cli")]
#[command(about = "Todo CLI - task list client with optimistic sync")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Photo and location flags shared by `add` and `edit`.
#[derive(clap::Args, Default)]
struct AttachmentArgs {
    /// Image file to attach
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Latitude where the photo was taken
    #[arg(long, requires_all = ["lon", "photo"], allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude where the photo was taken
    #[arg(long, requires_all = ["lat", "photo"], allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Place name for the location as "city, region, country"
    #[arg(long, requires = "lat")]
    place: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign in
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the stored credentials
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// List tasks
    List,
    /// Show one task
    Show { id: String },
    /// Add a task
    Add {
        title: String,
        #[command(flatten)]
        attachment: AttachmentArgs,
    },
    /// Change a task's title or photo
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        attachment: AttachmentArgs,
    },
    /// Mark a task done or not done
    Toggle { id: String },
    /// Delete a task
    Rm { id: String },
    /// Delete every completed task
    ClearCompleted,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("todo-cli starting");

    let mut module_cfg: TodoSyncConfig = config.module_config_required(MODULE_NAME)?;
    if let Some(url) = cli.base_url {
        module_cfg.api.base_url = url;
    }
    // keep the printed config in step with the effective one
    config.modules.insert(
        MODULE_NAME.to_string(),
        serde_json::to_value(&module_cfg).context("Failed to encode module config")?,
    );

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Commands::List);
    if let Commands::Check = command {
        return check_config(&config, &module_cfg);
    }

    let devices = devices_for(&command);
    let storage = Arc::new(JsonFileStore::new(
        module_cfg.storage_path(&config.home_dir()),
    ));
    tracing::debug!(path = %storage.path().display(), "Using storage file");
    let ctx = TodoSyncContext::build(module_cfg, storage, devices).map_err(public)?;
    ctx.session().initialize().await;

    run_command(&ctx, command).await
}

fn check_config(config: &AppConfig, module_cfg: &TodoSyncConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    if let Err(e) = module_cfg.validate() {
        bail!("invalid {} config: {}", MODULE_NAME, e);
    }
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Only `add` and `edit` can attach media; everything else gets devices that decline.
fn devices_for(command: &Commands) -> Devices {
    let attachment = match command {
        Commands::Add { attachment, .. } | Commands::Edit { attachment, .. } => attachment,
        _ => return Devices::default(),
    };

    let media = PresetMediaDevice {
        camera: None,
        gallery: attachment.photo.clone(),
    };
    let location = match (attachment.lat, attachment.lon) {
        (Some(lat), Some(lon)) => PresetLocationDevice {
            place: attachment.place.as_deref().map(parse_place),
            ..PresetLocationDevice::at(lat, lon)
        },
        _ => PresetLocationDevice::default(),
    };

    Devices {
        media: Arc::new(media),
        location: Arc::new(location),
    }
}

fn parse_place(raw: &str) -> GeocodedPlace {
    let mut parts = raw
        .split(',')
        .map(str::trim)
        .map(|s| (!s.is_empty()).then(|| s.to_string()));
    GeocodedPlace {
        city: parts.next().flatten(),
        region: parts.next().flatten(),
        country: parts.next().flatten(),
    }
}

fn public(e: DomainError) -> anyhow::Error {
    anyhow::Error::new(TodoSyncError::from(e))
}

async fn run_command(ctx: &TodoSyncContext, command: Commands) -> Result<()> {
    let session = ctx.session();
    let tasks = ctx.tasks();

    match command {
        Commands::Register { email, password } => {
            let snap = session.register(&email, &password).await.map_err(public)?;
            if snap.is_authenticated {
                print_signed_in(snap.user.as_ref().map(|u| u.email.as_str()));
            } else {
                println!("Registered {email}; run `login` to sign in");
            }
        }
        Commands::Login { email, password } => {
            let snap = session.login(&email, &password).await.map_err(public)?;
            print_signed_in(snap.user.as_ref().map(|u| u.email.as_str()));
        }
        Commands::Logout => {
            ctx.sign_out().await;
            println!("Signed out");
        }
        Commands::Whoami { refresh } => {
            if !session.is_authenticated() {
                bail!(TodoSyncError::Unauthenticated);
            }
            let user = if refresh {
                Some(session.refresh_profile().await.map_err(public)?)
            } else {
                session.fetch_user().await
            };
            match user {
                Some(u) => println!(
                    "{} (id: {})",
                    u.email,
                    u.id.as_deref().unwrap_or("unknown")
                ),
                None => println!("Signed in (user unknown)"),
            }
        }
        Commands::List => {
            let list = tasks.load().await.map_err(public)?;
            for task in &list {
                println!("{}", task_line(task));
            }
            println!(
                "{} task(s), {} completed",
                tasks.total_count(),
                tasks.completed_count()
            );
        }
        Commands::Show { id } => {
            let task = tasks.fetch(&id).await.map_err(public)?;
            print_task(&task);
        }
        Commands::Add { title, attachment } => {
            let media = ctx.media();
            let (photo_uri, location) = attach_photo(media, &attachment).await;

            match tasks
                .add(&title, photo_uri, location)
                .await
                .map_err(public)?
            {
                Some(task) => println!("{}", task_line(&task)),
                None => println!("Nothing to add: title is blank"),
            }
        }
        Commands::Edit {
            id,
            title,
            attachment,
        } => {
            tasks.load().await.map_err(public)?;
            let (photo_uri, location) = attach_photo(ctx.media(), &attachment).await;
            let edit = TaskEdit {
                title,
                photo_uri,
                location,
            };
            let task = tasks.update(&id, edit).await.map_err(public)?;
            println!("{}", task_line(&task));
        }
        Commands::Toggle { id } => {
            tasks.load().await.map_err(public)?;
            let task = tasks.toggle(&id).await.map_err(public)?;
            println!("{}", task_line(&task));
        }
        Commands::Rm { id } => {
            tasks.load().await.map_err(public)?;
            tasks.remove(&id).await.map_err(public)?;
            println!("Removed {}", id);
        }
        Commands::ClearCompleted => {
            tasks.load().await.map_err(public)?;
            let report = tasks.clear_completed().await.map_err(public)?;
            println!("Removed {} completed task(s)", report.removed.len());
            if !report.failed.is_empty() {
                bail!(
                    "{} task(s) could not be deleted: {}",
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }
        }
        // validated in main without a context
        Commands::Check => {}
    }

    Ok(())
}

/// A location is only recorded alongside a photo that was actually attached.
async fn attach_photo(
    media: &MediaResolver,
    attachment: &AttachmentArgs,
) -> (Option<String>, Option<TodoLocation>) {
    if attachment.photo.is_none() {
        return (None, None);
    }
    match media.capture_with_location(MediaSource::Gallery).await {
        Some(a) => (Some(a.photo_uri), a.location),
        None => {
            eprintln!("warning: photo not attached");
            (None, None)
        }
    }
}

fn print_signed_in(email: Option<&str>) {
    match email {
        Some(email) => println!("Signed in as {}", email),
        None => println!("Signed in"),
    }
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{}  [{}] {}",
        task.id,
        if task.completed { "x" } else { " " },
        task.title
    );
    if task.photo_uri.is_some() {
        line.push_str("  (photo)");
    }
    if let Some(address) = task.location.as_ref().and_then(|l| l.address.as_deref()) {
        line.push_str("  @ ");
        line.push_str(address);
    }
    line
}

fn print_task(task: &Task) {
    println!("id:        {}", task.id);
    println!("title:     {}", task.title);
    println!("completed: {}", task.completed);
    println!("created:   {}", task.created_at.to_rfc3339());
    if let Some(updated) = task.updated_at {
        println!("updated:   {}", updated.to_rfc3339());
    }
    if let Some(photo) = &task.photo_uri {
        println!("photo:     {}", photo);
    }
    if let Some(loc) = &task.location {
        println!(
            "location:  {:.5}, {:.5} {}",
            loc.latitude,
            loc.longitude,
            loc.address.as_deref().unwrap_or("")
        );
    }
}
