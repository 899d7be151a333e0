//! thumbcache CLI
//!
//! Entry point for the `thumbcache` command-line tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use thumbcache::store::{self, RegistryStore, SimpleStore};
use thumbcache::{Backend, Capabilities, Config, Resolver};

#[derive(Parser)]
#[command(name = "thumbcache")]
#[command(about = "Thumbnail cache for inline link previews", version)]
struct Cli {
    /// Path to config file (default: platform config dir)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which frame-extraction tool is available
    Probe {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve a preview for a media file, generating one on a miss
    Resolve {
        /// Source media file
        path: PathBuf,

        /// Use the persistent registry backend regardless of config
        #[arg(long)]
        registry: bool,
    },

    /// Sweep expired entries out of the registry backend
    Gc {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove all simple-backend entries
    Purge,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Probe { json } => {
            let caps = Capabilities::probe();
            if json {
                let value = serde_json::json!({
                    "extractor": caps.extractor,
                    "video_previews": caps.video_previews(),
                });
                println!("{}", serde_json::to_string_pretty(&value).unwrap());
            } else {
                match caps.extractor {
                    Some(kind) => println!("frame extractor: {}", kind.program()),
                    None => println!("no frame extractor found; video previews disabled"),
                }
            }
        }

        Commands::Resolve { path, registry } => {
            let mut config = config;
            if registry {
                config.backend = Backend::Registry;
            }
            let caps = Capabilities::probe();
            let resolver = match Resolver::from_config(&config, &caps) {
                Ok(resolver) => resolver,
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            };
            match resolver.resolve(&path) {
                Some(preview) => println!("{}", preview.display()),
                None => {
                    eprintln!("no preview available for {}", path.display());
                    process::exit(1);
                }
            }
        }

        Commands::Gc { json } => {
            let result = RegistryStore::open(
                config.cache_dir.clone(),
                config.purpose.clone(),
                config.expiry_days,
            )
            .and_then(|registry| store::sweep(&registry));
            match result {
                Ok(summary) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
                    } else {
                        println!(
                            "scanned {} entries, evicted {}, removed {} orphans, reclaimed {} bytes",
                            summary.scanned,
                            summary.evicted,
                            summary.orphans_removed,
                            summary.reclaimed_bytes
                        );
                    }
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }

        Commands::Purge => {
            let simple = SimpleStore::new(config.cache_dir.clone(), config.file_prefix.clone());
            match simple.purge() {
                Ok(removed) => println!("removed {removed} cached previews"),
                Err(e) => {
                    eprintln!("error: {e}");
                    process::exit(1);
                }
            }
        }
    }
}
