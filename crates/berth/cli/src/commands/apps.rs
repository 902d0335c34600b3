//! Catalog listing

use crate::error::CliResult;
use crate::output::{print_output, OutputFormat};
use berth_deployment::AppCatalog;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct AppRow {
    #[tabled(rename = "APPLICATION")]
    application: String,
    #[tabled(rename = "ENVIRONMENT")]
    environment: String,
    #[tabled(rename = "STACK")]
    stack: String,
    #[tabled(rename = "CLUSTER STACK")]
    cluster_stack: String,
    #[tabled(rename = "DNS")]
    dns: String,
}

pub fn execute(catalog: &AppCatalog, format: OutputFormat) -> CliResult<()> {
    let mut rows = Vec::new();
    for (application, app) in &catalog.apps {
        for environment in app.environments.keys() {
            let target = catalog.resolve(application, environment)?;
            rows.push(AppRow {
                application: application.clone(),
                environment: environment.clone(),
                stack: target.stack_name(),
                cluster_stack: target.env.cluster_stack.clone(),
                dns: target.dns_name(),
            });
        }
    }
    print_output(rows, format)
}
