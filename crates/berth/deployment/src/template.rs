//! Application stack template
//!
//! The stack holds everything about an application that the scheduler does
//! not: a DNS alias, an internal load balancer, the service role the
//! scheduler uses to register containers with it, and the task role the
//! containers run as. The service and task definition live outside it.

use crate::catalog::Target;
use berth_types::{Capability, StackRequest};
use serde_json::{json, Map, Value};

/// Output of the role the scheduler manages the load balancer with
pub const SERVICE_ROLE_OUTPUT: &str = "EcsServiceRoleName";
/// Output of the role assumed by running containers
pub const TASK_ROLE_OUTPUT: &str = "EcsTaskRoleArn";
pub const SERVICE_URL_OUTPUT: &str = "ServiceURL";
pub const LOAD_BALANCER_OUTPUT: &str = "AppElbName";

const PUBLIC_SUBNETS: &str = "PublicSubnets";
const IDLE_TIMEOUT_SECS: u32 = 115;

/// Build the stack request for `target`.
///
/// `elb_security_group` comes from the cluster stack. The request carries
/// no parameters; every template parameter has a default.
pub fn application_stack(target: &Target, elb_security_group: &str) -> StackRequest {
    StackRequest::new(target.stack_name(), application_template(target, elb_security_group))
        .with_capability(Capability::Iam)
}

pub fn application_template(target: &Target, elb_security_group: &str) -> Value {
    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": format!(
            "Deploys the {} container service to an existing cluster.",
            target.app.main_container_name
        ),
        "Parameters": parameters(target),
        "Resources": {
            "ServiceRoute53": {
                "Type": "AWS::Route53::RecordSet",
                "Properties": {
                    "HostedZoneId": target.hosted_zone_id,
                    "Comment": "DNS name for accessing the service",
                    "Name": target.dns_name(),
                    "Type": "A",
                    "AliasTarget": {
                        "DNSName": {"Fn::GetAtt": ["EcsElasticLoadBalancer", "DNSName"]},
                        "HostedZoneId": {
                            "Fn::GetAtt": ["EcsElasticLoadBalancer", "CanonicalHostedZoneNameID"]
                        }
                    }
                }
            },
            "EcsElasticLoadBalancer": load_balancer(target, elb_security_group),
            "ECSServiceRole": service_role(),
            "ECSTaskRole": {
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": assume_role("ecs-tasks.amazonaws.com"),
                    "Path": "/"
                }
            }
        },
        "Outputs": {
            SERVICE_ROLE_OUTPUT: {
                "Description": "Created ECSServiceRole",
                "Value": {"Ref": "ECSServiceRole"}
            },
            TASK_ROLE_OUTPUT: {
                "Description": "Created ECSTaskRole",
                "Value": {"Fn::GetAtt": ["ECSTaskRole", "Arn"]}
            },
            SERVICE_URL_OUTPUT: {
                "Description": "Service URL",
                "Value": {"Fn::Join": ["", ["http://", {"Ref": "ServiceRoute53"}, "/"]]}
            },
            LOAD_BALANCER_OUTPUT: {
                "Description": "Per application load balancer",
                "Value": {"Ref": "EcsElasticLoadBalancer"}
            }
        }
    })
}

fn parameters(target: &Target) -> Value {
    let subnets = json!({
        "Description": "Subnets the load balancer is placed in",
        "Type": "CommaDelimitedList",
        "Default": target.public_subnets.join(",")
    });

    let mut params = Map::new();
    params.insert(PUBLIC_SUBNETS.to_string(), subnets.clone());
    // The load balancer refers to the environment's subnet parameter by name.
    if target.env.subnets != PUBLIC_SUBNETS {
        params.insert(target.env.subnets.clone(), subnets);
    }

    for (name, description, kind, default) in [
        ("CrossZone", "Cross-Zone Load Balancing", "String", "true"),
        ("HealthyTreshold", "Healthy Threshold for Health Check", "Number", "2"),
        ("UnHealthyTreshold", "Unhealthy Threshold for Health Check", "Number", "5"),
        ("HCInterval", "Health Check Interval", "Number", "60"),
        ("HCTimeout", "Health Check Timeout", "Number", "59"),
    ] {
        params.insert(
            name.to_string(),
            json!({"Description": description, "Type": kind, "Default": default}),
        );
    }

    Value::Object(params)
}

fn load_balancer(target: &Target, elb_security_group: &str) -> Value {
    let tags: Vec<Value> = target
        .tags
        .iter()
        .map(|tag| json!({"Key": tag.key, "Value": tag.value}))
        .collect();

    json!({
        "Type": "AWS::ElasticLoadBalancing::LoadBalancer",
        "Properties": {
            "Subnets": {"Ref": target.env.subnets},
            "SecurityGroups": [elb_security_group],
            "CrossZone": {"Ref": "CrossZone"},
            "Scheme": "internal",
            "Listeners": [{
                "LoadBalancerPort": target.env.elb_port,
                "InstancePort": target.env.host_port,
                "Protocol": target.app.lb_protocol
            }],
            "ConnectionSettings": {"IdleTimeout": IDLE_TIMEOUT_SECS},
            "HealthCheck": {
                "Target": target.env.health_check_target,
                "HealthyThreshold": {"Ref": "HealthyTreshold"},
                "UnhealthyThreshold": {"Ref": "UnHealthyTreshold"},
                "Interval": {"Ref": "HCInterval"},
                "Timeout": {"Ref": "HCTimeout"}
            },
            "Tags": tags
        }
    })
}

fn service_role() -> Value {
    json!({
        "Type": "AWS::IAM::Role",
        "Properties": {
            "AssumeRolePolicyDocument": assume_role("ecs.amazonaws.com"),
            "Path": "/",
            "Policies": [{
                "PolicyName": "ecs-service",
                "PolicyDocument": {
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": [
                            "elasticloadbalancing:Describe*",
                            "elasticloadbalancing:DeregisterInstancesFromLoadBalancer",
                            "elasticloadbalancing:RegisterInstancesWithLoadBalancer",
                            "ec2:Describe*",
                            "ec2:AuthorizeSecurityGroupIngress"
                        ],
                        "Resource": "*"
                    }]
                }
            }]
        }
    })
}

fn assume_role(principal: &str) -> Value {
    json!({
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"Service": [principal]},
            "Action": ["sts:AssumeRole"]
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AppConfig, EnvironmentConfig, ResourceTag};
    use std::collections::BTreeMap;

    fn target(subnets: &str) -> Target {
        Target {
            application: "CurrencyService".into(),
            environment: "dev".into(),
            domain: "example.com".into(),
            hosted_zone_id: "Z1".into(),
            public_subnets: vec!["subnet-a".into(), "subnet-b".into()],
            tags: vec![ResourceTag::new("Owner", "Platform")],
            app: AppConfig {
                stack_name: "currency-service".into(),
                dns_service_name: "currency".into(),
                main_container_name: "CurrencyService".into(),
                container_port: 8000,
                container_image: "registry/currency".into(),
                lb_protocol: "TCP".into(),
                desired_count: 2,
                cpu: 10,
                memory: 750,
                memory_reservation: 600,
                log_type: None,
                environments: BTreeMap::new(),
            },
            env: EnvironmentConfig {
                cluster_stack: "cluster".into(),
                service_stack_suffix: String::new(),
                host_port: 8110,
                elb_port: 80,
                dns_suffix: "-dev".into(),
                subnets: subnets.into(),
                health_check_target: "HTTP:8110/api/check".into(),
                application_environment: "dev".into(),
                log_environment: "Development".into(),
                minimum_healthy_percent: 50,
                maximum_percent: 100,
            },
        }
    }

    #[test]
    fn test_template_wires_target_into_resources() {
        let template = application_template(&target("PublicSubnets"), "sg-123");
        let elb = &template["Resources"]["EcsElasticLoadBalancer"]["Properties"];

        assert_eq!(elb["SecurityGroups"], json!(["sg-123"]));
        assert_eq!(elb["Listeners"][0]["InstancePort"], 8110);
        assert_eq!(elb["Listeners"][0]["LoadBalancerPort"], 80);
        assert_eq!(elb["ConnectionSettings"]["IdleTimeout"], 115);
        assert_eq!(elb["Tags"], json!([{"Key": "Owner", "Value": "Platform"}]));
        assert_eq!(
            template["Resources"]["ServiceRoute53"]["Properties"]["Name"],
            "currency-dev.example.com"
        );
        assert_eq!(template["Parameters"]["PublicSubnets"]["Default"], "subnet-a,subnet-b");
    }

    #[test]
    fn test_template_declares_every_output_the_deployment_reads() {
        let template = application_template(&target("PublicSubnets"), "sg-123");
        let outputs = template["Outputs"].as_object().unwrap();
        for key in [
            SERVICE_ROLE_OUTPUT,
            TASK_ROLE_OUTPUT,
            SERVICE_URL_OUTPUT,
            LOAD_BALANCER_OUTPUT,
        ] {
            assert!(outputs.contains_key(key), "missing output {key}");
        }
    }

    #[test]
    fn test_referenced_subnet_parameter_is_declared() {
        let template = application_template(&target("PrivateSubnets"), "sg-123");
        assert_eq!(
            template["Resources"]["EcsElasticLoadBalancer"]["Properties"]["Subnets"],
            json!({"Ref": "PrivateSubnets"})
        );
        assert!(template["Parameters"].get("PrivateSubnets").is_some());
    }

    #[test]
    fn test_request_acknowledges_iam() {
        let request = application_stack(&target("PublicSubnets"), "sg-123");
        assert_eq!(request.name(), "currency-service-dev");
        assert_eq!(request.capabilities(), &[Capability::Iam]);
        assert!(request.parameters().is_empty());
    }
}
