use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thumbworks::imaging::{RustBackend, supported_input_extensions};
use thumbworks::process::Pipeline;
use thumbworks::storage::FsStorage;
use thumbworks::{config, output};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "thumbworks")]
#[command(about = "Crop, resize and sharpen images into named thumbnail variants")]
#[command(long_about = "\
Crop, resize and sharpen images into named thumbnail variants

Every source image is optionally processed itself, then rendered once per
variant declared in the config file. Variants are aspect-filled: when both
sides of `size` are set the image is center-cropped to that frame first.

Output layout (dirname = \"thumbs\"):

  dist/
  └── images/
      ├── photo.jpg                # source (processed or copied)
      └── thumbs/
          ├── photo.small.jpg      # [variants.small]
          └── photo.large.png      # [variants.large], format = \"PNG\"

Run 'thumbworks gen-config' to generate a documented thumbworks.toml.")]
#[command(version)]
struct Cli {
    /// Directory source images are read from
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Directory processed images are written to
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Config file (stock defaults are used when it does not exist)
    #[arg(long, default_value = "thumbworks.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of the text report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process source images (all supported images under --source by default)
    Process {
        /// Image names relative to --source
        names: Vec<String>,
    },
    /// Print the output paths for an image name without processing
    Paths {
        /// Image name relative to --source
        name: String,
    },
    /// Validate the config file and list the configured variants
    Check,
    /// Print a stock thumbworks.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process { names } => {
            let config = config::load_config(&cli.config)?;
            let set = config.thumbnail_set()?;
            init_thread_pool(&config.processing);

            let names = if names.is_empty() {
                discover_images(&cli.source)
            } else {
                names
            };

            let backend = RustBackend::new();
            let pipeline = Pipeline::new(&backend, &config.thumbnails);
            let input = FsStorage::new(&cli.source);
            let output_storage = FsStorage::new(&cli.output);

            let mut reports = Vec::new();
            let mut failed_images = 0;
            let mut failed_variants = 0;
            for (i, name) in names.iter().enumerate() {
                match set.save(&pipeline, &input, &output_storage, name) {
                    Ok(report) => {
                        failed_variants += report.failures();
                        if !cli.json {
                            output::print_save_report(i + 1, &report);
                        }
                        reports.push(report);
                    }
                    Err(e) => {
                        failed_images += 1;
                        tracing::warn!(image = %name, error = %e, "image failed");
                        if !cli.json {
                            output::print_image_error(i + 1, name, &e);
                        }
                    }
                }
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                println!(
                    "{}",
                    output::format_batch_summary(names.len(), failed_images, failed_variants)
                );
            }
            if failed_images > 0 || failed_variants > 0 {
                std::process::exit(1);
            }
        }
        Command::Paths { name } => {
            let config = config::load_config(&cli.config)?;
            let set = config.thumbnail_set()?;
            let paths = set.paths(&name, &config.thumbnails)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                output::print_paths(&name, &paths);
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            let config = config::load_config(&cli.config)?;
            let set = config.thumbnail_set()?;
            output::print_config_summary(&config.thumbnails, &set);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "thumbworks=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Size the global rayon pool from `[processing] max_processes`.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Every decodable image under `root`, as `/`-separated names relative to it.
fn discover_images(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    supported_input_extensions().iter().any(|e| *e == ext)
                })
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect();
    names.sort();
    names
}
