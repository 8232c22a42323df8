//! ECS cluster, task definition, and service.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::intrinsics::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cluster {
    pub cluster_name: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDefinition {
    pub container_definitions: Vec<ContainerDefinition>,
    pub family: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVariable>,

    pub essential: bool,
    pub image: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,

    /// Hard memory limit in MiB, kept as the string form the pipeline emits.
    pub memory: String,

    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
}

/// A container environment entry; values are routinely references to
/// template parameters (including `NoEcho` secrets, which stay symbolic
/// here and are only resolved at deploy time).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: Value,
}

impl EnvironmentVariable {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    pub container_port: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    pub options: BTreeMap<String, Value>,
}

impl LogConfiguration {
    /// The awslogs driver wired to a log group, region, and stream prefix.
    pub fn awslogs(group: Value, region: Value, stream_prefix: &str) -> Self {
        let mut options = BTreeMap::new();
        options.insert("awslogs-group".to_string(), group);
        options.insert("awslogs-region".to_string(), region);
        options.insert(
            "awslogs-stream-prefix".to_string(),
            Value::from(stream_prefix),
        );
        Self {
            log_driver: "awslogs".to_string(),
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    pub cluster: Value,
    pub desired_count: Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<ServiceLoadBalancer>,

    pub role: Value,
    pub task_definition: Value,
}

/// Binds one container port of the service to a load-balancer target group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLoadBalancer {
    pub container_name: String,
    pub container_port: String,
    pub target_group_arn: Value,
}

#[cfg(test)]
mod tests {
    use super::{
        ContainerDefinition, EnvironmentVariable, LogConfiguration, PortMapping, Service,
        ServiceLoadBalancer,
    };
    use crate::intrinsics::{pseudo, Value};
    use serde_json::json;

    #[test]
    fn container_environment_keeps_parameter_references() {
        let container = ContainerDefinition {
            environment: vec![
                EnvironmentVariable::new("PARSE_SERVER_MASTER_KEY", Value::reference("MasterKey")),
                EnvironmentVariable::new("PARSE_SERVER_LOGS_FOLDER", "null"),
            ],
            essential: true,
            image: Value::reference("ParseDockerImage"),
            log_configuration: None,
            memory: "256".to_string(),
            name: "parse-service".to_string(),
            port_mappings: vec![PortMapping {
                container_port: 1337,
            }],
        };
        let rendered = serde_json::to_value(container).unwrap();
        assert_eq!(
            rendered["Environment"][0],
            json!({"Name": "PARSE_SERVER_MASTER_KEY", "Value": {"Ref": "MasterKey"}})
        );
        assert_eq!(rendered["PortMappings"], json!([{"ContainerPort": 1337}]));
    }

    #[test]
    fn awslogs_configuration_wires_group_and_region() {
        let config = LogConfiguration::awslogs(
            Value::reference(pseudo::STACK_NAME),
            Value::reference(pseudo::REGION),
            "parse-service",
        );
        let rendered = serde_json::to_value(config).unwrap();
        assert_eq!(
            rendered,
            json!({
                "LogDriver": "awslogs",
                "Options": {
                    "awslogs-group": {"Ref": "AWS::StackName"},
                    "awslogs-region": {"Ref": "AWS::Region"},
                    "awslogs-stream-prefix": "parse-service",
                },
            })
        );
    }

    #[test]
    fn service_binds_container_to_target_group() {
        let service = Service {
            cluster: Value::reference("Cluster"),
            desired_count: Value::reference("DesiredCount"),
            load_balancers: vec![ServiceLoadBalancer {
                container_name: "parse-service".to_string(),
                container_port: "1337".to_string(),
                target_group_arn: Value::reference("TargetGroup"),
            }],
            role: Value::reference("ServiceRole"),
            task_definition: Value::reference("TaskDefinition"),
        };
        let rendered = serde_json::to_value(service).unwrap();
        assert_eq!(
            rendered["LoadBalancers"][0]["TargetGroupArn"],
            json!({"Ref": "TargetGroup"})
        );
    }
}
