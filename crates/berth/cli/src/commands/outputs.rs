//! Stack outputs inspection

use crate::error::CliResult;
use crate::output::{print_output, print_single, KeyValueRow, OutputFormat};
use berth_provider::StackApi;
use berth_stack::ClusterLookup;
use std::sync::Arc;

pub async fn execute(stacks: Arc<dyn StackApi>, stack: &str, format: OutputFormat) -> CliResult<()> {
    let outputs = ClusterLookup::new(stacks).lookup(stack).await?;

    match format {
        OutputFormat::Table => print_output(
            outputs
                .iter()
                .map(|(key, value)| KeyValueRow::new(key, value))
                .collect(),
            format,
        ),
        _ => print_single(&outputs, format),
    }
}
