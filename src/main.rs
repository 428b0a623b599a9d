use clap::{Parser, Subcommand};
use exif_frame::processor_config::{Category, ProcessorConfig};
use exif_frame::store::ConfigStore;
use exif_frame::{batch, config, output, processor};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "exif-frame")]
#[command(about = "Frame photos with borders, blurs and EXIF watermarks")]
#[command(long_about = "\
Frame photos with borders, blurs and EXIF watermarks

Every image of the input runs through a chain of processors, in order, and
is written to the output directory under its original name. Orientation,
pixel density and EXIF data are preserved.

A chain entry is either a built-in processor id (see 'exif-frame builtins')
or the id of a stored processor config (see 'exif-frame processors').

  exif-frame process photos/ --chain square watermark_left_logo
  exif-frame processors new watermark --name \"Studio strip\"
  exif-frame processors compose --name Framed square watermark_20240501103000

Run 'exif-frame gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the processor chain over an image or a directory of images
    Process {
        /// Image file or directory
        input: PathBuf,
        /// Output directory (overrides output.dir)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Processor ids to apply, in order (overrides processing.chain)
        #[arg(long, num_args = 1..)]
        chain: Vec<String>,
        /// Encoding quality 1-100 (overrides output.quality)
        #[arg(long)]
        quality: Option<u32>,
        /// Skip the remaining images after the first failure
        #[arg(long)]
        fail_fast: bool,
        /// Include sub-directories of the input
        #[arg(long)]
        recursive: bool,
    },
    /// Manage stored processor configs
    #[command(subcommand)]
    Processors(ProcessorsCommand),
    /// List built-in processor ids
    Builtins,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum ProcessorsCommand {
    /// List stored configs
    List,
    /// Store a config with default parameters for a category
    New {
        /// border, blur, transform or watermark
        category: Category,
        /// Display name (defaults to "<Category> <timestamp>")
        #[arg(long)]
        name: Option<String>,
    },
    /// Store a composite of built-in and stored processors, in order
    Compose {
        /// Processor ids, in the order they run
        #[arg(required = true)]
        ids: Vec<String>,
        /// Display name (defaults to "Composite <timestamp>")
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a stored config as JSON
    Show { id: String },
    /// Copy a config JSON file into the store
    Import { file: PathBuf },
    /// Write a stored config to a JSON file
    Export { id: String, file: PathBuf },
    /// Remove a stored config
    Delete { id: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Process {
            input,
            output: output_dir,
            chain,
            quality,
            fail_fast,
            recursive,
        } => {
            let mut app_config = config::load_config(&cli.config)?;
            if let Some(dir) = output_dir {
                app_config.output.dir = dir.to_string_lossy().into_owned();
            }
            if let Some(q) = quality {
                app_config.output.quality = q;
            }
            app_config.processing.fail_fast |= fail_fast;
            app_config.processing.recursive |= recursive;
            app_config.validate()?;

            let chain_ids = if chain.is_empty() {
                app_config.processing.chain.clone()
            } else {
                chain
            };

            init_thread_pool(&app_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = batch::run(&app_config, &input, &chain_ids, Some(tx))?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_batch_summary(&report);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Processors(command) => {
            let app_config = config::load_config(&cli.config)?;
            let store = ConfigStore::open(&app_config.processing.processor_store)?;
            match command {
                ProcessorsCommand::List => {
                    output::print_processor_list(&store.list()?);
                }
                ProcessorsCommand::New { category, name } => {
                    let config = ProcessorConfig::default_for(category, name.as_deref());
                    let path = store.save(&config)?;
                    println!("Created {} ({})", config.id, path.display());
                }
                ProcessorsCommand::Compose { ids, name } => {
                    let composite = processor::compose(&store, name.as_deref(), &ids)?;
                    let path = store.save_composite(&composite)?;
                    println!("Created {} ({})", composite.id, path.display());
                }
                ProcessorsCommand::Show { id } => {
                    println!("{}", store.load(&id)?.to_json()?);
                }
                ProcessorsCommand::Import { file } => {
                    let config = store.import(&file)?;
                    println!("Imported {} [{}]", config.id(), config.kind());
                }
                ProcessorsCommand::Export { id, file } => {
                    store.export(&id, &file)?;
                    println!("Exported {} to {}", id, file.display());
                }
                ProcessorsCommand::Delete { id } => {
                    store.delete(&id)?;
                    println!("Deleted {}", id);
                }
            }
        }
        Command::Builtins => {
            output::print_builtins();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
