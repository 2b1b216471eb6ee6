use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fiftymm::config;
use fiftymm::output;
use fiftymm::site::Site;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fiftymm")]
#[command(about = "Photo albums served from object storage")]
#[command(long_about = "\
Photo albums served from object storage

Each album is a key prefix in a bucket. Photos are listed from the bucket and
shown in bucket order unless the album carries an ordering.yaml:

  japan/
  ├── ordering.yaml        # Optional: cover, thumbnails, ordering
  ├── 010-harbour.jpg
  ├── 020-market.jpg
  └── 030-temple.jpg

Listings and manifests are cached per album and refreshed in the background
once older than cache.ttl_secs.

Run 'fiftymm gen-config' to generate a documented site config.")]
#[command(version)]
struct Cli {
    /// Site config file
    #[arg(long, env = "FIFTYMM_CONFIG", default_value = "fiftymm.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the site config and list its albums
    Check {
        /// List every album in storage and report its photo count
        #[arg(long)]
        probe: bool,
    },
    /// Print cover, thumbnails and ordering of one album
    Show {
        /// Album URL path, e.g. /japan/
        album: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fiftymm=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { probe } => {
            let site_config = config::load_config(&cli.config)?;
            output::print_site(&site_config);
            if probe {
                let site = Site::from_config(site_config)?;
                println!("==> Probing storage");
                site.warm().await;
                let mut failed = false;
                for album in site.albums() {
                    let result = album.get_all_image_keys().await.map(|keys| keys.len());
                    failed |= result.is_err();
                    println!("{}", output::format_probe(album, &result));
                }
                if failed {
                    return Err("one or more albums could not be listed".into());
                }
            }
            println!("==> Config is valid");
        }
        Command::Show { album, json } => {
            let site = Site::from_config(config::load_config(&cli.config)?)?;
            let album = site.album_for_path(&album)?;
            album.warm().await;
            let ordering = album.get_ordered_photos().await?;
            if json {
                let view = output::OrderingView::new(album, &ordering);
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                output::print_ordering(album, &ordering);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
