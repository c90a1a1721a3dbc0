use anyhow::Result;
use clap::Parser;
use git_heatmap::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
