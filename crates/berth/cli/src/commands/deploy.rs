//! Application deployment

use crate::config::{BerthConfig, Providers};
use crate::error::CliResult;
use crate::output::{print_output, print_single, print_success, KeyValueRow, OutputFormat};
use berth_deployment::{DeployRequest, DeploymentEvent, DeploymentOrchestrator, DeploymentReport};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub async fn execute(
    config: &BerthConfig,
    providers: Providers,
    request: DeployRequest,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> CliResult<()> {
    let orchestrator = DeploymentOrchestrator::new(
        config.catalog.clone(),
        providers.stacks,
        providers.scheduling,
        config.poll,
    );

    let mut events = orchestrator.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    let terminal = envelope.event.is_terminal();
                    log_event(&envelope.event);
                    if terminal {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dropped deployment events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = orchestrator.deploy(&request, cancel).await;
    drop(orchestrator);
    let _ = progress.await;

    let report = result?;
    print_report(&report, format)
}

fn log_event(event: &DeploymentEvent) {
    match event {
        DeploymentEvent::Started { image, .. } => info!(image = %image, "Deploying"),
        DeploymentEvent::ClusterResolved { cluster, .. } => info!(cluster = %cluster, "Cluster resolved"),
        DeploymentEvent::ExistingStackFound { stack, .. } => info!(stack = %stack, "Redeploying existing stack"),
        DeploymentEvent::TaskDefinitionRegistered { task_definition } => {
            info!(task_definition = %task_definition, "Task definition registered")
        }
        DeploymentEvent::StackReconciled { stack, action } => {
            info!(stack = %stack, action = %action, "Stack settled")
        }
        DeploymentEvent::ServicePublished { service, action } => {
            info!(service = %service, action = %action, "Service published")
        }
        DeploymentEvent::Completed { duration_ms } => debug!(duration_ms, "Deployment completed"),
        DeploymentEvent::Failed { error } => debug!(error = %error, "Deployment failed"),
    }
}

fn print_report(report: &DeploymentReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            print_success(&format!(
                "{} deployed to {} as {}",
                report.application, report.environment, report.task_definition
            ));
            let mut rows = vec![
                KeyValueRow::new("deployment", report.deployment_id),
                KeyValueRow::new("stack", &report.stack_name),
                KeyValueRow::new("image", &report.image),
                KeyValueRow::new("task definition", &report.task_definition),
                KeyValueRow::new("stack action", report.stack_action),
                KeyValueRow::new("service action", report.service_action),
            ];
            rows.extend(
                report
                    .outputs
                    .iter()
                    .map(|(key, value)| KeyValueRow::new(format!("output {key}"), value)),
            );
            print_output(rows, format)
        }
        _ => print_single(report, format),
    }
}
