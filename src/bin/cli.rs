//! WordKV CLI
//!
//! Small host application driving a local WordKV store.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use wordkv::{Config, Result, SeedPolicy, Snapshot, WordStore};

/// WordKV CLI
#[derive(Parser, Debug)]
#[command(name = "wordkv-cli")]
#[command(about = "CLI for the WordKV word store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./wordkv_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add words (duplicates are ignored)
    Add {
        /// The words to add
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// List all words in ascending order
    List,

    /// Delete every word
    Clear,

    /// Reset the table to the sample words
    Seed,

    /// Subscribe, add words one by one and print every pushed snapshot
    Watch {
        /// The words to add while watching
        words: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wordkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!("WordKV CLI v{}, data directory {}", wordkv::VERSION, args.data_dir);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder().data_dir(&args.data_dir);
    if matches!(args.command, Commands::Seed) {
        builder = builder.seed_policy(SeedPolicy::sample());
    }
    let store = WordStore::open(builder.build())?;

    match args.command {
        Commands::Add { words } => {
            for word in &words {
                store.insert(word)?;
            }
            store.sync()?;
            print_snapshot(&store.list_ordered());
        }
        Commands::List => print_snapshot(&store.list_ordered()),
        Commands::Clear => {
            store.delete_all()?;
            store.sync()?;
            println!("cleared");
        }
        Commands::Seed => {
            store.sync()?;
            print_snapshot(&store.list_ordered());
        }
        Commands::Watch { words } => {
            let subscription = store.subscribe();
            for word in &words {
                store.insert(word)?;
            }
            store.sync()?;

            while let Some(snapshot) = subscription.recv_timeout(Duration::from_millis(100)) {
                print!("[v{}] ", snapshot.version());
                print_snapshot(&snapshot);
            }
            store.unsubscribe(subscription.id());
        }
    }

    store.close()
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("{}", snapshot.keys().join(", "));
}
