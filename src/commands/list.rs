//! List site content

use anyhow::Result;

use crate::pipeline::BuildReport;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let report = site.inspect()?;
    print!("{}", format_listing(&report, content_type)?);
    Ok(())
}

/// Render a listing of `content_type` for the terminal
pub fn format_listing(report: &BuildReport, content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "document" | "documents" | "post" | "posts" => {
            out.push_str(&format!("Documents ({}):\n", report.store.len()));
            for doc in report.store.iter() {
                let date = doc
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                let marker = if doc.canonical { ' ' } else { '~' };
                out.push_str(&format!(
                    "  {}{} - {} [{}, {}]\n",
                    marker,
                    date,
                    doc.display_title(),
                    doc.id,
                    doc.status
                ));
            }
        }
        "cluster" | "clusters" => {
            let revised: Vec<_> = report
                .clusters
                .iter()
                .filter(|c| !c.is_singleton())
                .collect();
            out.push_str(&format!("Revision clusters ({}):\n", revised.len()));
            for cluster in revised {
                out.push_str(&format!(
                    "  {} (similarity {:.2})\n",
                    cluster.group, cluster.similarity
                ));
                for member in &cluster.members {
                    let marker = if *member == cluster.canonical { '*' } else { ' ' };
                    out.push_str(&format!("    {} {}\n", marker, member));
                }
            }
        }
        "failure" | "failures" => {
            let summary = report.summary();
            out.push_str(&format!("Failures ({}):\n", summary.failures.len()));
            for failure in summary.failures {
                out.push_str(&format!("  {}\n", failure));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: documents, clusters, failures",
                content_type
            );
        }
    }

    Ok(out)
}
