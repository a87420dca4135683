use std::sync::OnceLock;

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) const COMPOSER_REJECTIONS: &str = "qpaper_composer_rejections_total";
pub(crate) const PAPERS_FINALIZED: &str = "qpaper_papers_finalized_total";
pub(crate) const QUESTIONS_GENERATED: &str = "qpaper_questions_generated_total";

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Writes the rendered snapshot to the configured node-exporter textfile, if any.
pub(crate) async fn write_textfile(settings: &Settings) -> anyhow::Result<()> {
    let (Some(path), Some(rendered)) = (settings.telemetry().prometheus_textfile.as_ref(), render())
    else {
        return Ok(());
    };

    tokio::fs::write(path, rendered)
        .await
        .with_context(|| format!("failed to write metrics textfile {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Metrics snapshot written");
    Ok(())
}
