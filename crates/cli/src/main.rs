use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_app::modules::sitemap::{manifest, SitemapService};
use shelf_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "shelf", version, about = "E-book catalog and sitemap service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Convert a sitemap XML file into a JSON URL manifest
    ExtractUrls {
        /// Sitemap XML to read `<loc>` entries from
        #[arg(long, default_value = "data/sitemap-source.xml")]
        input: PathBuf,
        /// JSON manifest to write
        #[arg(long, default_value = "data/urls.json")]
        output: PathBuf,
    },
    /// Report URL and chunk counts for the configured manifest
    SitemapStats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::run(settings).await,
        Command::ExtractUrls { input, output } => {
            tracing::info!(input = %input.display(), "extracting sitemap URLs");
            let count = manifest::convert_xml_to_json(&input, &output)
                .await
                .with_context(|| format!("failed to extract URLs from {}", input.display()))?;
            tracing::info!(count, output = %output.display(), "manifest written");
            println!("extracted {} URLs into {}", count, output.display());
            Ok(())
        }
        Command::SitemapStats => {
            let service = SitemapService::new(&settings)?;
            println!(
                "manifest: {}\nurls: {}\nchunk size: {}\nchunks: {}",
                settings.sitemap.manifest_path.display(),
                service.total_urls().await,
                settings.sitemap.chunk_size,
                service.chunk_count().await
            );
            Ok(())
        }
    }
}
