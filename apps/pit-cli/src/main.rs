use clap::{Args, Parser, Subcommand};
use pit_core::format_sim_time;
use pit_server::{ServerConfig, ServerError};
use pit_session::{unix_now, AlarmTargets, Reading, Session};
use pit_sim::{builtin_profiles, find_profile, Profile, SimError, ThermalModel};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pit-cli")]
#[command(about = "Smoker simulator - thermal model and live session server", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live simulator server (default)
    Serve(ServeArgs),
    /// List built-in profiles
    Profiles,
    /// Run a profile offline and export the readings as CSV
    Simulate {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Simulated duration in seconds
        #[arg(long, default_value_t = 8.0 * 3600.0)]
        duration_s: f64,
        /// Simulated seconds per step
        #[arg(long, default_value_t = 5.0)]
        dt: f64,
        /// Noise seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
struct ProfileArgs {
    /// Built-in profile name
    #[arg(long, env = "PROFILE", default_value = "normal")]
    profile: String,
    /// YAML profile file, used instead of the built-in profile
    #[arg(long)]
    profile_file: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[command(flatten)]
    profile: ProfileArgs,
    /// Simulated-time multiplier (minimum 0.1)
    #[arg(long, env = "SPEED", default_value_t = 1.0)]
    speed: f64,
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    /// Listen address
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,
    /// Session snapshot file
    #[arg(long, env = "SESSION_FILE", default_value = "session.json")]
    session_file: PathBuf,
    /// Dashboard assets to serve at /
    #[arg(long)]
    static_dir: Option<PathBuf>,
    /// Wall-clock milliseconds between ticks
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
    /// Noise seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => cmd_serve(&cli.serve),
        Some(Commands::Serve(args)) => cmd_serve(&args),
        Some(Commands::Profiles) => {
            cmd_profiles();
            Ok(())
        }
        Some(Commands::Simulate {
            profile,
            duration_s,
            dt,
            seed,
            output,
        }) => cmd_simulate(&profile, duration_s, dt, seed, output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_profile(args: &ProfileArgs) -> CliResult<Profile> {
    let profile = match &args.profile_file {
        Some(path) => Profile::load_yaml(path)?,
        None => find_profile(&args.profile)?,
    };
    Ok(profile)
}

fn cmd_serve(args: &ServeArgs) -> CliResult<()> {
    let profile = load_profile(&args.profile)?;
    if args.tick_ms == 0 {
        return Err(CliError::InvalidArg("--tick-ms must be positive".to_string()));
    }

    let config = ServerConfig {
        listen_addr: SocketAddr::new(args.bind, args.port),
        tick_period: Duration::from_millis(args.tick_ms),
        session_file: args.session_file.clone(),
        static_dir: args.static_dir.clone(),
        seed: args.seed,
        ..ServerConfig::default()
    }
    .with_speed(args.speed);

    tracing::info!(
        profile = %profile.name,
        description = %profile.description,
        speed = config.speed,
        "starting simulator"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(pit_server::run(config, profile, shutdown_signal()))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn cmd_profiles() {
    let profiles = builtin_profiles();
    let width = profiles.iter().map(|p| p.name.len()).max().unwrap_or(0);
    println!("Built-in profiles:");
    for profile in profiles {
        println!("  {:width$}  {}", profile.name, profile.description);
    }
}

fn cmd_simulate(
    args: &ProfileArgs,
    duration_s: f64,
    dt: f64,
    seed: Option<u64>,
    output: Option<&Path>,
) -> CliResult<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(CliError::InvalidArg("--dt must be positive".to_string()));
    }
    if !(duration_s.is_finite() && duration_s >= 0.0) {
        return Err(CliError::InvalidArg(
            "--duration-s must be non-negative".to_string(),
        ));
    }

    let profile = load_profile(args)?;
    let mut model = match seed {
        Some(seed) => ThermalModel::with_seed(&profile, seed),
        None => ThermalModel::new(&profile),
    };
    let mut session = Session::new(unix_now(), AlarmTargets::from_profile(&profile));

    while model.sim_time() < duration_s {
        let sample = model.update(dt, None);
        session.push(Reading::from_sample(&sample, session.start_ts()));
    }
    tracing::info!(
        profile = %profile.name,
        readings = session.len(),
        sim_time = %format_sim_time(model.sim_time()),
        "simulation finished"
    );

    let csv = session.to_csv();
    if let Some(path) = output {
        std::fs::write(path, csv).map_err(|source| CliError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        println!(
            "✓ Exported {} readings to {}",
            session.len(),
            path.display()
        );
    } else {
        println!("{csv}");
    }

    Ok(())
}
