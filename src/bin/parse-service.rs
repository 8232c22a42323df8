//! Generates the template that deploys a Docker image of the parse-server
//! as an ECS service behind the shared Application Load Balancer.

use anyhow::Result;
use cfn_templates::policy::{assume_role_policy, PolicyDocument, Statement};
use cfn_templates::resources::{ecs, elb, iam, logs, Resource};
use cfn_templates::template::Error;
use cfn_templates::{pseudo, Parameter, ParameterType, Template, Value};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let template = build()?;
    info!(
        resources = template.resource_count(),
        "rendered the parse-service template"
    );
    println!("{}", template.to_json()?);
    Ok(())
}

fn service_role_policy() -> PolicyDocument {
    PolicyDocument::new(vec![Statement::allow()
        .action("ec2", "AuthorizeSecurityGroupIngress")
        .action("ec2", "Describe*")
        .action("elasticloadbalancing", "DeregisterInstancesFromLoadBalancer")
        .action("elasticloadbalancing", "Describe*")
        .action("elasticloadbalancing", "RegisterInstancesWithLoadBalancer")
        .action("elasticloadbalancing", "DeregisterTargets")
        .action("elasticloadbalancing", "DescribeTargetGroups")
        .action("elasticloadbalancing", "DescribeTargetHealth")
        .action("elasticloadbalancing", "RegisterTargets")
        .resource(["*"])])
}

fn build() -> Result<Template, Error> {
    let mut template = Template::new();
    template.set_version("2010-09-09");
    template.set_description(
        "This template deploys a Docker image of the parse-server as an ECS serivce",
    );

    let vpc = template.add_parameter(
        "VPC",
        Parameter::new(ParameterType::VpcId)
            .description("The VPC that the ECS cluster is deployed to"),
    )?;
    let cluster = template.add_parameter(
        "Cluster",
        Parameter::string()
            .description("Please provide the ECS Cluster ID that this service should run on"),
    )?;
    let desired_count = template.add_parameter(
        "DesiredCount",
        Parameter::number()
            .description("How many instances of this task should we run across our cluster?")
            .default("2"),
    )?;
    let listener = template.add_parameter(
        "Listener",
        Parameter::string()
            .description("The Application Load Balancer listener to register with"),
    )?;
    let docker_image = template.add_parameter(
        "ParseDockerImage",
        Parameter::string().description("The Parse Server docker image"),
    )?;
    template.add_parameter(
        "Path",
        Parameter::string()
            .description("The path to register with the Application Load Balancer")
            .default("/parse")
            .allowed_pattern(r"[\/][a-zA-Z0-9\/]{0,}(?<!\/)"),
    )?;
    let app_name = template.add_parameter(
        "AppName",
        Parameter::string().description("Sets the app name"),
    )?;
    let application_id = template.add_parameter(
        "ApplicationID",
        Parameter::string().description("Your Parse Application ID"),
    )?;
    let master_key = template.add_parameter(
        "MasterKey",
        Parameter::string()
            .description("Your Parse Master Key")
            .no_echo(),
    )?;
    let javascript_key = template.add_parameter(
        "JavascriptKey",
        Parameter::string().description("The Javascript key for the Javascript SDK"),
    )?;
    let client_key = template.add_parameter(
        "ClientKey",
        Parameter::string().description("Key for iOS, MacOS, tvOS clients"),
    )?;
    let rest_key = template.add_parameter(
        "RestKey",
        Parameter::string().description("Key for REST calls"),
    )?;
    let dotnet_key = template.add_parameter(
        "DotNetKey",
        Parameter::string().description("Key for Unity and .Net SDK"),
    )?;
    let webhook_key = template.add_parameter(
        "WebhookKey",
        Parameter::string().description("Key sent with outgoing webhook calls"),
    )?;
    let verbose = template.add_parameter(
        "Verbose",
        Parameter::number()
            .description("Set the logging to verbose")
            .default("0")
            .min_value("0")
            .max_value("1"),
    )?;
    template.add_parameter(
        "MongoDBUsername",
        Parameter::string().description("The Username for MonogDB"),
    )?;
    template.add_parameter(
        "MongoDBPassword",
        Parameter::string()
            .description("The password for MongoDB")
            .no_echo(),
    )?;
    template.add_parameter(
        "MongoDBURI",
        Parameter::string().description("The MonogoDB driver URI after the @ symbol."),
    )?;

    let task_definition = template.add_resource(
        "TaskDefinition",
        Resource::new(ecs::TaskDefinition {
            container_definitions: vec![ecs::ContainerDefinition {
                environment: vec![
                    ecs::EnvironmentVariable::new("VERBOSE", verbose.reference()),
                    ecs::EnvironmentVariable::new("PARSE_SERVER_LOGS_FOLDER", "null"),
                    ecs::EnvironmentVariable::new("PARSE_SERVER_APP_NAME", app_name.reference()),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_APPLICATION_ID",
                        application_id.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_MASTER_KEY",
                        master_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_JAVASCRIPT_KEY",
                        javascript_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_CLIENT_KEY",
                        client_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_REST_API_KEY",
                        rest_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_DOT_NET_KEY",
                        dotnet_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_WEBHOOK_KEY",
                        webhook_key.reference(),
                    ),
                    ecs::EnvironmentVariable::new("PARSE_SERVER_MOUNT_PATH", "/parse"),
                    ecs::EnvironmentVariable::new(
                        "PARSE_SERVER_DATABASE_URI",
                        Value::sub("mongodb://${MongoDBUsername}:${MongoDBPassword}@${MongoDBURI}"),
                    ),
                ],
                essential: true,
                image: docker_image.reference(),
                log_configuration: Some(ecs::LogConfiguration::awslogs(
                    Value::reference(pseudo::STACK_NAME),
                    Value::reference(pseudo::REGION),
                    "parse-service",
                )),
                memory: "256".to_string(),
                name: "parse-service".to_string(),
                port_mappings: vec![ecs::PortMapping {
                    container_port: 1337,
                }],
            }],
            family: "parse-service".to_string(),
        }),
    )?;

    template.add_resource(
        "CloudWatchLogsGroup",
        Resource::new(logs::LogGroup {
            log_group_name: Value::reference(pseudo::STACK_NAME),
            retention_in_days: 5,
        }),
    )?;

    let service_role = template.add_resource(
        "ServiceRole",
        Resource::new(iam::Role {
            assume_role_policy_document: assume_role_policy("ecs.amazonaws.com"),
            path: None,
            policies: vec![iam::RolePolicy {
                policy_document: service_role_policy(),
                policy_name: "ecs-service".to_string(),
            }],
            role_name: Some(Value::sub("ecs-service-${AWS::StackName}")),
        }),
    )?;

    let target_group = template.add_resource(
        "TargetGroup",
        Resource::new(elb::TargetGroup {
            health_check_interval_seconds: Some("10".to_string()),
            health_check_path: Some(Value::sub("/parse/health")),
            health_check_protocol: Some("HTTP".to_string()),
            health_check_timeout_seconds: Some("5".to_string()),
            healthy_threshold_count: Some("2".to_string()),
            matcher: Some(elb::Matcher {
                http_code: "200-299".to_string(),
            }),
            name: None,
            port: "80".to_string(),
            protocol: "HTTP".to_string(),
            vpc_id: vpc.reference(),
        }),
    )?;

    template.add_resource(
        "ListenerRule",
        Resource::new(elb::ListenerRule {
            actions: vec![elb::Action::forward(target_group.reference())],
            conditions: vec![elb::RuleCondition::path_pattern(Value::sub("${Path}/*"))],
            listener_arn: listener.reference(),
            priority: "2".to_string(),
        }),
    )?;

    template.add_resource(
        "Service",
        Resource::new(ecs::Service {
            cluster: cluster.reference(),
            desired_count: desired_count.reference(),
            load_balancers: vec![ecs::ServiceLoadBalancer {
                container_name: "parse-service".to_string(),
                container_port: "1337".to_string(),
                target_group_arn: target_group.reference(),
            }],
            role: service_role.reference(),
            task_definition: task_definition.reference(),
        })
        .depends_on("ListenerRule"),
    )?;

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::build;

    #[test]
    fn every_reference_is_declared() {
        let template = build().unwrap();
        assert_eq!(template.undeclared_refs().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn renders_deterministically() {
        let first = build().unwrap().to_json().unwrap();
        let second = build().unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn secret_parameters_never_echo() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(document["Parameters"]["MasterKey"]["NoEcho"], true);
        assert_eq!(document["Parameters"]["MongoDBPassword"]["NoEcho"], true);
        assert!(document["Parameters"]["ApplicationID"].get("NoEcho").is_none());
    }

    #[test]
    fn database_uri_keeps_its_interpolation() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        let environment = &document["Resources"]["TaskDefinition"]["Properties"]
            ["ContainerDefinitions"][0]["Environment"];
        let uri = environment
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["Name"] == "PARSE_SERVER_DATABASE_URI")
            .unwrap();
        assert_eq!(
            uri["Value"],
            serde_json::json!({
                "Fn::Sub": "mongodb://${MongoDBUsername}:${MongoDBPassword}@${MongoDBURI}"
            })
        );
    }

    #[test]
    fn service_starts_only_after_the_listener_rule() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(document["Resources"]["Service"]["DependsOn"], "ListenerRule");
        assert_eq!(
            document["Resources"]["ListenerRule"]["Properties"]["Priority"],
            "2"
        );
    }
}
