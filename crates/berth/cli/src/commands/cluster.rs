//! Cluster creation

use crate::error::CliResult;
use crate::output::{print_single, print_success, OutputFormat};
use berth_provider::SchedulingApi;
use tracing::info;

/// Create a cluster directly on the scheduler, outside any stack
pub async fn execute(scheduling: &dyn SchedulingApi, name: &str, format: OutputFormat) -> CliResult<()> {
    info!(cluster = %name, provider = %scheduling.name(), "Creating cluster");
    let cluster = scheduling.create_cluster(name).await?;

    match format {
        OutputFormat::Table => print_success(&format!(
            "Cluster {} created{}",
            cluster.cluster_name,
            cluster
                .cluster_arn
                .as_deref()
                .map(|arn| format!(" ({arn})"))
                .unwrap_or_default()
        )),
        _ => print_single(&cluster, format)?,
    }
    Ok(())
}
