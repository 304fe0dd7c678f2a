use std::process::ExitCode;

use burstchain_core::RestClient;
use burstchain_demo::Admin;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "https://testnet.burstiq.com";

/// Burst Chain Client - Hello World Demo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The testnet server
    #[arg(short, long, env = "BURSTCHAIN_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// The client name to interact with
    #[arg(short, long, env = "BURSTCHAIN_CLIENT")]
    client: String,

    /// The admin account for the client space
    #[arg(short, long, env = "BURSTCHAIN_USERNAME")]
    username: String,

    /// Password of the admin account
    #[arg(short, long, env = "BURSTCHAIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// An existing private id to use instead of generating a new one
    #[arg(long = "privateid")]
    private_id: Option<String>,

    /// Log only warnings
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log low level details, including HTTP traffic
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level())))
        .init();

    info!("Burst Chain Client - Hello World Demo");

    let client = RestClient::new(&args.server, &args.client);
    let admin = Admin {
        username: args.username.clone(),
        password: args.password.clone(),
    };

    // The failing call has already been logged by the client.
    match burstchain_demo::run(&client, &admin, args.private_id.as_deref()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
