//! Cloudmark command line front end.
//!
//! Loads point clouds through the same model the annotation tool uses:
//! - `info` prints the load summary and per-class label counts
//! - `convert` re-saves a cloud through the handler of another format
//! - `render` draws one frame offscreen and writes it as PNG

mod headless;
mod logging;

use clap::{Parser, Subcommand};
use cloudmark_core::PointCloud;
use cloudmark_data::{CloudConfig, HandlerRegistry};
use cloudmark_gpu::Renderer;
use headless::FrameSize;
use logging::LoggingConfig;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

/// Cloudmark - point cloud annotation model
#[derive(Parser, Debug)]
#[command(name = "cloudmark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Stream spans to Tracy (requires the `tracy` feature)
    #[arg(long, global = true)]
    tracy: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the summary and label counts of a point cloud
    Info { file: PathBuf },
    /// Load a point cloud and save it in the format of `output`
    Convert { input: PathBuf, output: PathBuf },
    /// Render one frame offscreen to a PNG file
    Render {
        file: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1280, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        #[arg(long, default_value_t = 720, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
        /// Colour points by their segmentation label
        #[arg(long)]
        label_colors: bool,
    },
}

fn main() {
    let args = Args::parse();
    LoggingConfig::default()
        .with_level(args.log_level.clone())
        .with_tracy(args.tracy)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => CloudConfig::from_file(path)?,
        None => CloudConfig::default(),
    };
    let handlers = HandlerRegistry::default();

    match args.command {
        Command::Info { file } => {
            let cloud = PointCloud::from_file(&file, None, &handlers, &config)?;
            println!("{}", cloud.summary());
            if let Some(counts) = cloud.label_counts() {
                println!("Label counts:");
                for (name, count) in counts {
                    println!("  {name}: {count}");
                }
            }
        }
        Command::Convert { input, output } => {
            let cloud = PointCloud::from_file(&input, None, &handlers, &config)?;
            cloud.save(Some(&output), &handlers)?;
            info!("Converted {} to {}", input.display(), output.display());
        }
        Command::Render {
            file,
            output,
            width,
            height,
            label_colors,
        } => {
            config.pointcloud.color_with_label = label_colors;
            render(&file, &output, FrameSize { width, height }, &handlers, &config)?;
        }
    }
    Ok(())
}

fn render(
    file: &Path,
    output: &Path,
    size: FrameSize,
    handlers: &HandlerRegistry,
    config: &CloudConfig,
) -> Result<(), Box<dyn Error>> {
    let renderer = pollster::block_on(Renderer::new())?;
    let mut cloud = PointCloud::from_file(file, None, handlers, config)?;
    headless::render_to_png(&renderer, &mut cloud, config, size, output)?;
    println!("Rendered {} to {}", file.display(), output.display());
    Ok(())
}
