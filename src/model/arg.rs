use clap::Parser;

/// Store credit admin API server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data file path (customers, regions and store credits)
    #[arg(long)]
    pub data: Option<String>,
}
