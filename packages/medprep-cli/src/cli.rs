use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "medprep",
    version,
    about = "Prepare ECG records and chest X-ray images for machine learning",
    long_about = "Load WFDB ECG records, filter and resample them and extract heart-rate\n\
                  features; group labelled images into folders, split them into\n\
                  train/validation/test sets and resize them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preprocess WFDB records and print their features as JSON
    Ecg(EcgArgs),
    /// Move images into one folder per label
    Organize(OrganizeArgs),
    /// Copy a label-organized tree into stratified train/val/test folders
    Split(SplitArgs),
    /// Resize every image in a folder
    Resize(ResizeArgs),
    /// Run the pipelines described by a JSON config file
    Run(RunArgs),
}

#[derive(Args)]
pub struct EcgArgs {
    /// Record paths without extension (e.g. data/100)
    #[arg(long, num_args = 1.., conflicts_with = "glob")]
    pub record: Option<Vec<String>>,

    /// Glob pattern matching header files (e.g. "data/*.hea")
    #[arg(long)]
    pub glob: Option<String>,

    /// Annotation file extension
    #[arg(long, default_value = "atr")]
    pub annotations: String,

    /// Do not read annotation files
    #[arg(long)]
    pub no_annotations: bool,

    /// Channel index to analyse
    #[arg(long, default_value_t = 0)]
    pub channel: usize,

    /// High-pass cutoff in Hz (0 disables)
    #[arg(long, default_value_t = 0.5)]
    pub highpass: f64,

    /// Low-pass cutoff in Hz (0 disables)
    #[arg(long, default_value_t = 40.0)]
    pub lowpass: f64,

    /// Butterworth filter order
    #[arg(long, default_value_t = medprep::signal::DEFAULT_FILTER_ORDER)]
    pub order: usize,

    /// Resample to this rate in Hz
    #[arg(long)]
    pub target_fs: Option<f64>,

    /// Skip min-max normalization
    #[arg(long)]
    pub no_normalize: bool,

    /// Keep going after a record fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// One compact JSON object per line
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct OrganizeArgs {
    /// Label table (CSV)
    #[arg(long)]
    pub labels: String,

    /// Folder holding the raw images
    #[arg(long)]
    pub images: String,

    /// Root folder receiving one subfolder per label
    #[arg(long)]
    pub output: String,

    /// Column holding the image file name
    #[arg(long, default_value = "Image Index")]
    pub image_column: String,

    /// Column holding the label
    #[arg(long, default_value = "Finding Labels")]
    pub label_column: String,

    /// Fail when the table lists an image that is not present
    #[arg(long)]
    pub strict: bool,

    /// Print the planned moves as JSON without touching any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Label-organized root folder
    #[arg(long)]
    pub organized: String,

    #[arg(long)]
    pub train: String,

    #[arg(long)]
    pub val: String,

    #[arg(long)]
    pub test: String,

    /// Fraction of all files held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Fraction of the remaining files held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_size: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print the planned copies as JSON without touching any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ResizeArgs {
    #[arg(long)]
    pub input: String,

    #[arg(long)]
    pub output: String,

    #[arg(long, default_value_t = medprep::resize::DEFAULT_SIZE.0)]
    pub width: u32,

    #[arg(long, default_value_t = medprep::resize::DEFAULT_SIZE.1)]
    pub height: u32,

    /// Compact JSON report
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config (JSON)
    #[arg(long)]
    pub config: String,

    /// Write the JSON summary to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,

    #[arg(long)]
    pub compact: bool,
}
