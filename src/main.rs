use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use pointer_accel::accel::SharedModifier;
use pointer_accel::channel::{ChannelError, FileEndpoint};
use pointer_accel::config::{AppConfig, EndpointConfig};
use pointer_accel::service::{ServiceError, SettingsHandle};
use pointer_accel::{Modifier, Settings, Vec2};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(
    name = "pointer-accel",
    version,
    about = "Inspect, validate and apply pointer acceleration settings"
)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the active settings and whether they are valid (default)
    Status,
    /// Print the default settings record as TOML
    #[command(name = "default")]
    Defaults,
    /// Print the active settings as TOML
    Read,
    /// Validate a profile and make it the active settings
    Write(ProfileArgs),
    /// Check a profile without touching the driver
    Validate(ProfileArgs),
    /// Run one movement sample through a profile's pipeline
    Simulate(SimulateArgs),
    /// Create the settings file for a file endpoint, filled with defaults
    Init,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    /// TOML profile holding a full settings record
    profile: PathBuf,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    profile: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    dx: i32,

    #[arg(long, allow_hyphen_values = true)]
    dy: i32,

    /// Elapsed time for the sample in milliseconds
    #[arg(long, default_value_t = 1.0)]
    time: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load_or_create(&config_path).await?;
    setup(config.tracing_level().unwrap_or(Level::INFO))?;
    debug!("Using config {}", config_path.display());

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => status(&config).await,
        Command::Defaults => print_toml(&Settings::default()),
        Command::Read => read(&config).await,
        Command::Write(args) => write(&config, &args.profile).await,
        Command::Validate(args) => validate(&args.profile).await.map(|_| ()),
        Command::Simulate(args) => simulate(&args).await,
        Command::Init => init(&config),
    }
}

fn setup(level: Level) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .pretty()
        .init();
}

fn spawn_service(config: &AppConfig) -> Result<SettingsHandle> {
    let endpoint = config.endpoint.open_endpoint()?;
    let modifier = Arc::new(SharedModifier::default());
    let mut settings = config.service_settings();
    settings.load_on_start = false;
    Ok(SettingsHandle::spawn(endpoint, modifier, settings))
}

fn report(err: ServiceError) -> color_eyre::Report {
    match err {
        ServiceError::Channel(ChannelError::NotInstalled { endpoint }) => {
            eyre!("Driver is not installed ({} could not be opened)", endpoint)
        }
        ServiceError::Channel(err @ ChannelError::Io { .. }) => {
            eyre!("Driver I/O failed: {}", err)
        }
        other => eyre!(other),
    }
}

async fn read_active(config: &AppConfig) -> Result<Settings> {
    let mut handle = spawn_service(config)?;
    let result = handle.read_active().await;
    handle.shutdown().await.map_err(report)?;
    result.map_err(report)
}

async fn status(config: &AppConfig) -> Result<()> {
    let settings = read_active(config).await?;
    let errors = settings.errors();

    println!("rotation:     {} deg", settings.rotation_degrees);
    println!("acceleration: {}", if settings.apply_acceleration { "on" } else { "off" });
    println!("combine axes: {}", settings.combine_axes);
    println!("modes:        x = {}, y = {}", settings.modes.x, settings.modes.y);
    println!(
        "sensitivity:  x = {}, y = {}",
        settings.sensitivity.x, settings.sensitivity.y
    );
    println!("min time:     {} ms", settings.min_time_ms);

    if errors.is_empty() {
        println!("valid:        yes");
    } else {
        println!("valid:        no");
        for message in errors.messages() {
            println!("  {}", message);
        }
    }
    Ok(())
}

async fn read(config: &AppConfig) -> Result<()> {
    let settings = read_active(config).await?;
    print_toml(&settings)
}

fn print_toml(settings: &Settings) -> Result<()> {
    let text = toml::to_string_pretty(settings)
        .map_err(|e| eyre!("Failed to serialize settings: {}", e))?;
    print!("{}", text);
    Ok(())
}

async fn load_profile(path: &Path) -> Result<Settings> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| eyre!("Failed to read profile {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| eyre!("Failed to parse profile {}: {}", path.display(), e))
}

async fn validate(path: &Path) -> Result<Settings> {
    let settings = load_profile(path).await?;
    let errors = settings.errors();

    if !errors.is_empty() {
        for message in errors.messages() {
            warn!("{}", message);
        }
        return Err(eyre!(
            "Profile {} is invalid: {}",
            path.display(),
            errors.messages().join("; ")
        ));
    }

    info!("Profile {} is valid", path.display());
    Ok(settings)
}

async fn write(config: &AppConfig, path: &Path) -> Result<()> {
    let settings = validate(path).await?;

    let mut handle = spawn_service(config)?;
    let result = handle.write_active(settings).await;
    handle.shutdown().await.map_err(report)?;
    result.map_err(report)?;

    println!("Applied {}", path.display());
    Ok(())
}

async fn simulate(args: &SimulateArgs) -> Result<()> {
    let settings = validate(&args.profile).await?;
    if args.time <= 0.0 {
        return Err(eyre!("Sample time must be positive, got {}", args.time));
    }

    let modifier = Modifier::new(&settings);
    let out = modifier.modify(Vec2::new(f64::from(args.dx), f64::from(args.dy)), args.time);
    println!("in:  ({}, {}) over {} ms", args.dx, args.dy, args.time);
    println!("out: ({:.4}, {:.4})", out.x, out.y);
    Ok(())
}

fn init(config: &AppConfig) -> Result<()> {
    match &config.endpoint {
        EndpointConfig::File { path } => {
            let endpoint = FileEndpoint::create(path.clone(), &Settings::default())
                .map_err(|e| eyre!("Failed to create {}: {}", path.display(), e))?;
            println!("Created {}", endpoint.path().display());
            Ok(())
        }
        EndpointConfig::Driver { device } => Err(eyre!(
            "Endpoint {} is a driver device and is created by the driver install",
            device
        )),
    }
}
