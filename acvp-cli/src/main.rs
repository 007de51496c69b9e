// ── acvp-cli: CLI front-end over acvp-core ─────────────────────────────────
// §4 component N. `clap`-derived subcommands driving one `Session`: `login`
// exchanges credentials for a JWT and stops there; `run` drives one vector
// set end to end; `session --resume <url>` is the explicit name for the same
// thing, for scripts that saved a session URL from a previous run (§1
// non-goal: no persistence beyond re-reading that URL).

mod config;

use acvp_core::ctx::Ctx;
use acvp_core::dispatch::Registration;
use acvp_core::error::AcvpResult;
use acvp_core::session::Session;
use acvp_core::testing::StubDut;
use clap::{Parser, Subcommand};
use config::{CliOverrides, FileConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "acvp", about = "Drive an ACVP test session")]
struct Cli {
    /// Path to `acvp.toml` (§6 config schema).
    #[arg(long, default_value = "acvp.toml", global = true)]
    config: PathBuf,

    #[arg(long, global = true)]
    host: Option<String>,
    #[arg(long, global = true)]
    port: Option<u16>,
    #[arg(long, global = true)]
    ca_file: Option<String>,
    #[arg(long, env = "ACVP_USERNAME", global = true)]
    username: Option<String>,
    #[arg(long, env = "ACVP_PASSWORD", global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print whether a JWT was issued; does not run any vector set.
    Login,
    /// Fetch, answer, and submit one vector set against the stub DUT.
    Run {
        /// Vector-set URL to fetch. Falls back to `[session].resume_url` in
        /// the config file if omitted.
        vector_set_url: Option<String>,
    },
    /// Resume a previously saved session URL.
    Session {
        #[arg(long)]
        resume: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!(%err, "acvp session failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> AcvpResult<()> {
    let file = config::FileConfig::load(&cli.config).unwrap_or_else(|err| {
        tracing::warn!(%err, "could not read config file, using defaults");
        FileConfig::default()
    });
    let resolved = config::resolve(
        file,
        CliOverrides {
            host: cli.host,
            port: cli.port,
            ca_file: cli.ca_file,
            username: cli.username,
            password: cli.password,
            resume_url: None,
        },
    );

    let mut ctx = Ctx::new(resolved.host.clone(), resolved.port)
        .with_user_agent(acvp_core::useragent::assemble());
    if let Some(ca) = &resolved.ca_file {
        ctx = ctx.with_ca_file(ca.clone());
    }
    if let (Some(cert), Some(key)) = (&resolved.client_cert, &resolved.client_key) {
        ctx = ctx.with_client_identity(cert.clone(), key.clone());
    }
    if let (Some(user), Some(pass)) = (&resolved.username, &resolved.password) {
        ctx = ctx.with_credentials(user.clone(), pass.clone());
    }

    let dut = StubDut;
    let duts: Vec<Registration<'_>> = resolved
        .algorithms
        .iter()
        .map(|algorithm| Registration {
            algorithm: algorithm.as_str(),
            dut: &dut,
        })
        .collect();

    let mut session = Session::new(ctx, duts)?;

    match cli.command {
        Command::Login => {
            session.login().await?;
            println!("login succeeded");
        }
        Command::Run { vector_set_url } => {
            let url = vector_set_url
                .or(resolved.resume_url)
                .ok_or_else(|| acvp_core::error::AcvpError::MissingArg("vector_set_url".to_string()))?;
            if resolved.username.is_some() {
                session.login().await?;
            }
            session.run_once(&url).await?;
            println!("vector set submitted");
        }
        Command::Session { resume } => {
            if resolved.username.is_some() {
                session.login().await?;
            }
            session.run_once(&resume).await?;
            println!("session resumed and vector set submitted");
        }
    }

    Ok(())
}
