//! CLI tests against the simulated providers.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn config(pending_polls: u32) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("temp file");
    write!(
        file,
        r#"
provider:
  kind: memory
  pending_polls: {pending_polls}
  stacks:
    - name: EC2ContainerService-testCluster
      outputs:
        - key: ECSClusterName
          value: test-cluster
        - key: ElbSecurityGroupName
          value: sg-elb
  declared_outputs:
    - stack: currency-service-dev
      outputs:
        - key: AppElbName
          value: elb1
        - key: EcsServiceRoleName
          value: role1
poll:
  interval_secs: 0
catalog:
  domain: example.com
  hosted_zone_id: Z1
  apps:
    currency:
      stack_name: currency-service
      dns_service_name: currency
      main_container_name: CurrencyService
      container_port: 8000
      container_image: registry/currency
      environments:
        dev:
          cluster_stack: EC2ContainerService-testCluster
          host_port: 8000
          dns_suffix: -dev
          health_check_target: HTTP:8000/api/check
          application_environment: dev
          log_environment: Development
"#
    )
    .expect("write config");
    file
}

fn berth(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("berth").expect("binary");
    cmd.arg("--config").arg(config.path()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn apps_lists_catalog() {
    let config = config(0);
    berth(&config)
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("currency-service-dev"))
        .stdout(predicate::str::contains("currency-dev.example.com"));
}

#[test]
fn deploy_creates_service() {
    let config = config(2);
    berth(&config)
        .args(["deploy", "dev", "currency", "1.2.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CurrencyService-dev:1"))
        .stdout(predicate::str::contains("registry/currency:1.2.3"))
        .stdout(predicate::str::contains("elb1"));
}

#[test]
fn deploy_resolves_application_regardless_of_case() {
    let config = config(0);
    berth(&config)
        .args(["deploy", "dev", "Currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("currency-service-dev"));
}

#[test]
fn deploy_report_as_json() {
    let config = config(0);
    let output = berth(&config)
        .args(["--output", "json", "deploy", "dev", "currency"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["image"], "registry/currency:latest");
    assert_eq!(report["stack_action"], "created");
    assert_eq!(report["service_action"], "created");
    assert_eq!(report["outputs"]["AppElbName"], "elb1");
}

#[test]
fn deploy_unknown_application_fails() {
    let config = config(0);
    berth(&config)
        .args(["deploy", "dev", "billing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("billing"));
}

#[test]
fn deploy_times_out_with_budget_from_environment() {
    let config = config(10);
    berth(&config)
        .env("BERTH_POLL__MAX_RETRIES", "2")
        .args(["deploy", "dev", "currency"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timed out"));
}

#[test]
fn outputs_of_cluster_stack() {
    let config = config(0);
    berth(&config)
        .args(["outputs", "EC2ContainerService-testCluster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("test-cluster"))
        .stdout(predicate::str::contains("sg-elb"));
}

#[test]
fn outputs_of_missing_stack_fails() {
    let config = config(0);
    berth(&config)
        .args(["outputs", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn create_cluster_reports_arn() {
    let config = config(0);
    berth(&config)
        .args(["--output", "json", "create-cluster", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arn:memory:cluster/demo"));
}
