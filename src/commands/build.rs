//! Build the site

use anyhow::Result;

use crate::content::loader;
use crate::pipeline::{self, BuildReport};
use crate::Site;

/// Run the pipeline and write the output
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    let report = inspect(site)?;
    report.output.write_to(&site.public_dir, &site.config)?;

    let duration = start.elapsed();
    tracing::info!("Built in {:.2}s", duration.as_secs_f64());

    Ok(report)
}

/// Run the pipeline without writing anything
pub fn inspect(site: &Site) -> Result<BuildReport> {
    let collections = loader::discover(&site.source_dir)?;
    let report = pipeline::run(collections.published, collections.drafts, &site.config)?;
    Ok(report)
}
