use super::index::CommitIndex;
use super::output::{build_report, load_template, output_json, output_summary, write_html};
use crate::config::HeatmapConfig;
use crate::git::GitRepo;
use anyhow::Context;
use log::warn;

pub fn exec(config: HeatmapConfig) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;
    let model = config.model().context("Invalid magnitude settings")?;

    let mut index = CommitIndex::new(config.period, config.classifier());
    for path in &config.paths {
        let repo = GitRepo::open(path)
            .with_context(|| format!("Failed to open git repository at {}", path.display()))?;
        index
            .add_repository(&repo, &config.walk)
            .with_context(|| format!("Failed to read history of {}", repo.path().display()))?;
    }
    if index.is_empty() {
        warn!("No changes matched any directory bucket");
    }

    let report = build_report(&index, &model, &config.title());

    if config.json {
        output_json(&report).context("Failed to serialize heatmap")?;
    } else {
        let template = load_template(config.template.as_deref())
            .context("Failed to load template")?;
        let output = config.output_path();
        write_html(&report, &template, &output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        output_summary(&report, &output);
    }

    Ok(())
}
