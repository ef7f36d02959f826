#![deny(missing_docs)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use cli::args::{OutputFormatArg, ShipmentTypeArg};
use stores::products::ProductsSource;

#[derive(Parser, Debug)]
#[command(name = "autolink_cli")]
#[command(bin_name = "autolink_cli")]
#[command(version, about, long_about = None)]
pub(crate) struct Opts {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Trace log file
    #[arg(long, num_args = 0..=1, default_missing_value = "trace.log")]
    pub(crate) trace: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Link catalog products to unlinked shipments
    Link(LinkArgs),

    /// Report unlinked shipments and per-product link counts
    Report(ReportArgs),

    /// Classify a list of control descriptors, printing which are product-linking controls
    Classify(ClassifyArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StoreArgs {
    /// Directory of the durable store, shipments are kept in 'shipments.json'
    #[arg(long, value_name = "DIRECTORY")]
    pub(crate) store_dir: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct LinkArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,

    /// Configuration file (JSON), omitted values take their defaults
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Product catalog feed (CSV), tried before the catalog in the durable store
    #[arg(long, value_name = "SOURCE")]
    pub(crate) catalog: Option<ProductsSource>,

    /// Generate this many sample products if no other catalog source has any
    #[arg(long, value_name = "COUNT", default_value_t = 0)]
    pub(crate) sample_products: usize,

    /// Seed for product selection and sample generation
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Only link these shipments, e.g. '--shipment S-1 --shipment S-2'
    #[arg(long, value_name = "SHIPMENT_ID", action = clap::ArgAction::Append)]
    pub(crate) shipment: Vec<String>,

    /// Plan items applied before the longer pause between batches
    #[arg(long)]
    pub(crate) batch_size: Option<usize>,

    /// Maximum number of products linked to each shipment
    #[arg(long)]
    pub(crate) max_products: Option<usize>,

    /// Do not pause between items, batches and phases
    #[arg(long, default_value_t = false)]
    pub(crate) no_delays: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ReportArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,

    /// Only report shipments of this type
    #[arg(long = "type", value_enum, value_name = "TYPE")]
    pub(crate) shipment_type: Option<ShipmentTypeArg>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormatArg::Text)]
    pub(crate) format: OutputFormatArg,
}

#[derive(Debug, Args)]
pub(crate) struct ClassifyArgs {
    /// Control descriptors (JSON array)
    #[arg(long, value_name = "FILE")]
    pub(crate) controls: PathBuf,

    /// Configuration file (JSON), only the 'monitor' section is used
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormatArg::Text)]
    pub(crate) format: OutputFormatArg,
}
