//! statboard CLI binary: query the statistics API through the cached data layer.
//!
//! Subcommands: `get` (fetch through the SWR cache), `download` (raw-data export), `config`
//! (print effective settings).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::CliError;
use config::{Settings, APP_NAME};
use statboard::{Fetcher, SwrCache};

#[derive(Parser, Debug)]
#[command(name = "statboard")]
#[command(about = "statboard: query the statistics API through the dashboard data layer")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Verbose: log requests, dedupe hits and retries
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a resource and print its JSON payload
    Get(GetArgs),
    /// Save a resource's raw JSON to a file
    Download(DownloadArgs),
    /// Print the effective base URL and fetch policy
    Config,
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    /// API path relative to the base URL, e.g. /debt/latest
    path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Pretty-print (multi-line). Default: one line
    #[arg(long)]
    pretty: bool,

    /// Retries after a failed attempt (default: from config)
    #[arg(long, value_name = "N")]
    retries: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    /// API path relative to the base URL
    path: String,

    /// Dataset label; the file name is derived from it
    #[arg(long)]
    label: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Output directory (default: current directory)
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// File name instead of the one derived from the label
    #[arg(long, value_name = "NAME")]
    filename: Option<String>,
}

async fn run(args: Args, settings: Settings) -> Result<(), CliError> {
    match args.cmd {
        Command::Get(ga) => {
            let key = cli::request_key(&ga.path, &ga.params)?;
            let cache = SwrCache::new(Fetcher::new(&settings.api), cli::policy(&settings, ga.retries));
            let value = cli::get(&cache, key).await?;
            println!("{}", cli::render_json(&value, ga.pretty)?);
        }
        Command::Download(da) => {
            let key = cli::request_key(&da.path, &da.params)?;
            let path =
                cli::download(Fetcher::new(&settings.api), &da.label, key, &da.out, da.filename)
                    .await?;
            println!("{}", path.display());
        }
        Command::Config => {
            println!("{}", cli::render_json(&cli::effective_config(&settings), true)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    config::load_and_apply(APP_NAME, None::<&std::path::Path>).ok();
    let args = Args::parse();
    let filter = if args.verbose {
        "statboard=debug,cli=debug"
    } else {
        "warn"
    };
    let guard = config::init_tracing(APP_NAME, filter);

    let result = match Settings::load(APP_NAME) {
        Ok(settings) => run(args, settings).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("statboard: {}", e);
        // Flush the log file before exiting.
        drop(guard);
        std::process::exit(1);
    }
}
