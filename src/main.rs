use clap::{Parser, Subcommand};
use leafpress::pipeline::{self, RunOptions};
use leafpress::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "leafpress")]
#[command(about = "Prepare a markdown vault for a leaf-bundle static site")]
#[command(long_about = "\
Prepare a markdown vault for a leaf-bundle static site

Your vault stays the source of truth. Every document gets a slug derived from
its path; old slugs are kept as aliases and turned into redirects. A rewritten
copy of each document lands in the site's content tree, one directory per page.

Layout:

  content_src/                     # Vault (source_directory)
  ├── _index.md                    # → content/_index.md          URI /
  ├── about.md                     # → content/about/index.md     URI /about/
  └── blog/
      ├── _assets/                 # Copied file by file, newer wins
      ├── my-post/
      │   └── my-post.md           # → content/blog/my-post/index.md
      └── guide.md                 # → content/blog/guide/index.md

  static/_redirects                # */<alias> <uri> 301, then _redirects_base.txt

Frontmatter fixes (slug, aliases, tags, cleanup) are written back into the
vault. Body rewrites (links, YouTube embeds, hashtags, highlights) only go into
the destination copy.

Set RUST_LOG=leafpress=debug to see every rule that fires.
Run 'leafpress gen-config' to generate a documented leafpress.toml.")]
#[command(version)]
struct Cli {
    /// Config file; relative paths inside it resolve against its directory
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline: normalize sources, write destination and redirects
    Build {
        /// Also write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compute everything and show what would change, without writing
    Check,
    /// Print a stock leafpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build { report } => {
            let config = config::load_config(&cli.config)?;
            println!(
                "==> Building {} → {}",
                config.source_directory.display(),
                config.destination_directory.display()
            );
            let run_report = run_with_printer(&config, RunOptions::default())?;
            output::print_run_summary(&run_report);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&run_report)?;
                std::fs::write(&path, json)?;
                println!("==> Report written to {}", path.display());
            }
            println!("==> Build complete");
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            println!("==> Checking {}", config.source_directory.display());
            let run_report = run_with_printer(&config, RunOptions { dry_run: true })?;
            output::print_run_summary(&run_report);
            println!("==> Nothing written");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the pipeline with progress printed from a separate thread.
fn run_with_printer(
    config: &config::PipelineConfig,
    options: RunOptions,
) -> Result<pipeline::RunReport, pipeline::PipelineError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_pipeline_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = pipeline::run(config, options, Some(tx));
    printer.join().ok();
    result
}

/// Log to stderr, filtered by `RUST_LOG` (default: info for this crate).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "leafpress=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
