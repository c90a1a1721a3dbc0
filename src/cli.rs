use crate::classify::DepthOverrides;
use crate::config::HeatmapConfig;
use crate::git::WalkOptions;
use crate::heat::{ColorRamp, Normalization, DEFAULT_SCALE};
use crate::period::PeriodPolicy;
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "git-heatmap")]
#[command(about = "Render git history as a directory-by-period activity heatmap")]
#[command(version)]
pub struct Cli {
    #[arg(required = true, help = "One or more repositories to visualise")]
    pub paths: Vec<PathBuf>,

    #[arg(
        long,
        env = "GIT_HEATMAP_PERIOD",
        default_value = "weekly",
        value_parser = parse_period,
        help = "Bucket size: hourly, daily, weekly, monthly, quarterly or yearly"
    )]
    pub period: PeriodPolicy,

    #[arg(
        long,
        env = "GIT_HEATMAP_DEPTH",
        default_value_t = 2,
        help = "Number of leading directories used to group changes"
    )]
    pub depth: usize,

    #[arg(
        long,
        value_parser = parse_overrides,
        help = "Per-subtree depth as path:depth[,path:depth...], 0 excludes the subtree"
    )]
    pub filter: Option<DepthOverrides>,

    #[arg(long, default_value_t = DEFAULT_SCALE, help = "Compression constant; lower values flatten bursts")]
    pub scale: f64,

    #[arg(long, help = "Normalize each directory against its own busiest period")]
    pub relative: bool,

    #[arg(long, value_parser = parse_ramp, help = "Color ramp as comma separated #rrggbb anchors")]
    pub colors: Option<ColorRamp>,

    #[arg(long, help = "HTML template with {{title}}, {{period}}, {{summary}} and {{heatmap}}")]
    pub template: Option<PathBuf>,

    #[arg(short, long, help = "Output path (default: \"<title> <period>.html\")")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Print the heatmap as JSON instead of writing HTML")]
    pub json: bool,

    #[arg(long, help = "Skip merge commits")]
    pub exclude_merges: bool,

    #[arg(long, help = "Include binary files (counted as zero lines)")]
    pub binary: bool,

    #[arg(short, long, conflicts_with = "quiet", help = "Verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Only log warnings and errors")]
    pub quiet: bool,
}

fn parse_period(s: &str) -> std::result::Result<PeriodPolicy, String> {
    s.parse().map_err(|e: crate::error::HeatmapError| e.to_string())
}

fn parse_overrides(s: &str) -> std::result::Result<DepthOverrides, String> {
    s.parse().map_err(|e: crate::error::HeatmapError| e.to_string())
}

fn parse_ramp(s: &str) -> std::result::Result<ColorRamp, String> {
    s.parse().map_err(|e: crate::error::HeatmapError| e.to_string())
}

impl Cli {
    pub fn config(&self) -> HeatmapConfig {
        HeatmapConfig {
            paths: self.paths.clone(),
            period: self.period,
            depth: self.depth,
            overrides: self.filter.clone().unwrap_or_default(),
            scale: self.scale,
            normalization: if self.relative {
                Normalization::Directory
            } else {
                Normalization::Global
            },
            ramp: self.colors.clone().unwrap_or_default(),
            template: self.template.clone(),
            output: self.output.clone(),
            json: self.json,
            walk: WalkOptions {
                include_merges: !self.exclude_merges,
                binary: self.binary,
                progress: !self.json && !self.quiet,
            },
        }
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);
        crate::heat::exec(self.config())
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
