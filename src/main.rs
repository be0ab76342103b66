use std::{path::PathBuf, sync::Arc};

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use favsync::{cli, config, types::PkceToken, warning};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Increase printed messages. Can be provided multiple times.
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Like every track of every saved album
    Sync(SyncOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Only request read access, enough for `sync --dry-run`
    #[clap(long)]
    pub read_only: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SyncOptions {
    /// CSV file with a `spotify_id` column of tracks never to like
    /// [default: <local-data>/favsync/skiplist.csv or $FAVSYNC_SKIPLIST]
    #[clap(short, long)]
    pub skiplist_file: Option<PathBuf>,

    /// Do not update 'Liked' songs
    #[clap(short = 'n', long)]
    pub dry_run: bool,

    /// Save a tab separated list of all album tracks to this file
    #[clap(long, value_name = "PATH")]
    pub save_tsv: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    favsync::set_verbosity(cli.verbose);

    match cli.command {
        Command::Auth(opt) => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result), opt.read_only).await;
        }
        Command::Sync(opt) => cli::sync(opt.skiplist_file, opt.dry_run, opt.save_tsv).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
