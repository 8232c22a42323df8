//! Generates the ECS cluster template: an Auto Scaling Group of container
//! hosts in the provided VPC and subnets, joined to the cluster through
//! cfn-init bootstrap metadata.

use std::collections::BTreeMap;

use anyhow::Result;
use cfn_templates::init::{InitConfig, InitFile, InitService, Metadata};
use cfn_templates::policies::{AutoScalingRollingUpdate, CreationPolicy, UpdatePolicy};
use cfn_templates::policy::{assume_role_policy, PolicyDocument, Statement};
use cfn_templates::resources::{autoscaling, ecs, iam, Resource};
use cfn_templates::template::Error;
use cfn_templates::{pseudo, MappingTable, Output, Parameter, ParameterType, Template, Value};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let template = build()?;
    info!(
        resources = template.resource_count(),
        "rendered the ECS cluster template"
    );
    println!("{}", template.to_json()?);
    Ok(())
}

/// The ECS-optimized AMI per region. Resolved at deploy time through an
/// `Fn::FindInMap` against `AWS::Region`, never by the generator.
fn region_to_ami() -> MappingTable {
    let amis = [
        ("us-east-1", "ami-a58760b3"),
        ("us-east-2", "ami-a6e4bec3"),
        ("us-west-1", "ami-74cb9b14"),
        ("us-west-2", "ami-5b6dde3b"),
        ("eu-west-1", "ami-e3fbd290"),
        ("eu-west-2", "ami-77f6fc13"),
        ("eu-central-1", "ami-38dc1157"),
        ("ap-northeast-1", "ami-30bdce57"),
        ("ap-southeast-1", "ami-9f75ddfc"),
        ("ap-southeast-2", "ami-cf393cac"),
        ("ca-central-1", "ami-1b01b37f"),
    ];

    amis.iter()
        .map(|(region, ami)| {
            let mut inner = BTreeMap::new();
            inner.insert("AMI".to_string(), ami.to_string());
            (region.to_string(), inner)
        })
        .collect()
}

fn ecs_service_policy() -> PolicyDocument {
    PolicyDocument::new(vec![Statement::allow()
        .action("ecs", "CreateCluster")
        .action("ecs", "DeregisterContainerInstance")
        .action("ecs", "DiscoverPollEndpoint")
        .action("ecs", "Poll")
        .action("ecs", "RegisterContainerInstance")
        .action("ecs", "StartTelemetrySession")
        .action("ecs", "Submit*")
        .action("logs", "CreateLogStream")
        .action("ecr", "BatchCheckLayerAvailability")
        .action("ecr", "BatchGetImage")
        .action("ecr", "GetDownloadUrlForLayer")
        .action("ecr", "GetAuthorizationToken")
        .resource(["*"])])
}

fn build() -> Result<Template, Error> {
    let mut template = Template::new();
    template.set_version("2010-09-09");
    template.set_description(
        "This template deploys an ECS cluster to the provided VPC and subnets \
         using an Auto Scaling Group",
    );

    let env = template.add_parameter(
        "EnvironmentName",
        Parameter::string()
            .description("An environment name that will be prefixed to resource names"),
    )?;
    let instance_type = template.add_parameter(
        "InstanceType",
        Parameter::string()
            .default("t2.nano")
            .description("Which instance type should we use to build the ECS cluster?")
            .allowed_values([
                "t2.nano",
                "t2.micro",
                "t2.small",
                "t2.medium",
                "t2.large",
                "t2.xlarge",
                "t2.2xlarge",
            ]),
    )?;
    let cluster_size = template.add_parameter(
        "ClusterSize",
        Parameter::number()
            .description("How many ECS hosts do you want to initially deploy?")
            .default("1"),
    )?;
    template.add_parameter(
        "VPC",
        Parameter::new(ParameterType::VpcId)
            .description("Choose which VPC this ECS cluster should be deployed to"),
    )?;
    let subnets = template.add_parameter(
        "Subnets",
        Parameter::new(ParameterType::SubnetIdList)
            .description("Choose which subnets this ECS cluster should be deployed to"),
    )?;
    let security_group = template.add_parameter(
        "SecurityGroup",
        Parameter::new(ParameterType::SecurityGroupId)
            .description("Select the Security Group to use for the ECS cluster hosts"),
    )?;

    let ami_mapping = template.add_mapping("AWSRegionToAMI", region_to_ami())?;

    let ecs_role = template.add_resource(
        "ECSRole",
        Resource::new(iam::Role {
            assume_role_policy_document: assume_role_policy("ec2.amazonaws.com"),
            path: Some("/".to_string()),
            policies: vec![iam::RolePolicy {
                policy_document: ecs_service_policy(),
                policy_name: "ecs-service".to_string(),
            }],
            role_name: Some(Value::sub("${EnvironmentName}-ECSRole-${AWS::Region}")),
        }),
    )?;

    let instance_profile = template.add_resource(
        "ECSInstanceProfile",
        Resource::new(iam::InstanceProfile {
            path: Some("/".to_string()),
            roles: vec![ecs_role.reference()],
        }),
    )?;

    let cluster = template.add_resource(
        "ECSCluster",
        Resource::new(ecs::Cluster {
            cluster_name: env.reference(),
        }),
    )?;

    // cfn-hup watches the launch configuration's metadata and reruns
    // cfn-init on stack updates, so host config changes roll out without
    // replacing instances.
    let instance_metadata = Metadata::init(
        InitConfig::new()
            .command(
                "01_add_instance_to_cluster",
                Value::join(
                    "",
                    vec![
                        Value::from("#!/bin/bash\n"),
                        Value::from("echo ECS_CLUSTER="),
                        cluster.reference(),
                        Value::from(" >> /etc/ecs/ecs.config"),
                    ],
                ),
            )
            .file(
                "/etc/cfn/cfn-hup.conf",
                InitFile::new(
                    "000400",
                    "root",
                    "root",
                    Value::join(
                        "",
                        vec![
                            Value::from("[main]\n"),
                            Value::from("stack="),
                            Value::reference(pseudo::STACK_ID),
                            Value::from("\n"),
                            Value::from("region="),
                            Value::reference(pseudo::REGION),
                            Value::from("\n"),
                        ],
                    ),
                ),
            )
            .file(
                "/etc/cfn/hooks.d/cfn-auto-reloader.conf",
                InitFile::new(
                    "000400",
                    "root",
                    "root",
                    Value::join(
                        "",
                        vec![
                            Value::from("[cfn-auto-reloader-hook]\n"),
                            Value::from("triggers=post.update\n"),
                            Value::from(
                                "path=Resources.ContainerInstances.Metadata.AWS::CloudFormation::Init\n\
                                 action=/opt/aws/bin/cfn-init -v --region ",
                            ),
                            Value::reference(pseudo::REGION),
                            Value::from(" --stack "),
                            Value::reference(pseudo::STACK_ID),
                            Value::from(" --resource ECSLaunchConfiguration\n"),
                        ],
                    ),
                ),
            )
            .service(
                "cfn-hup",
                InitService::enabled([
                    "/etc/cfn/cfn-hup.conf",
                    "/etc/cfn/hooks.d/cfn-auto-reloader.conf",
                ]),
            ),
    );

    let launch_configuration = template.add_resource(
        "ECSLaunchConfiguration",
        Resource::new(autoscaling::LaunchConfiguration {
            iam_instance_profile: instance_profile.reference(),
            image_id: ami_mapping.lookup(Value::reference(pseudo::REGION), "AMI"),
            instance_type: instance_type.reference(),
            security_groups: vec![security_group.reference()],
            user_data: Value::base64(Value::join(
                "",
                vec![
                    Value::from("#!/bin/bash\n"),
                    Value::from("yum install -y aws-cfn-bootstrap\n"),
                    Value::from("/opt/aws/bin/cfn-init -v --region "),
                    Value::reference(pseudo::REGION),
                    Value::from(" --stack "),
                    Value::reference(pseudo::STACK_NAME),
                    Value::from(" --resource ECSLaunchConfiguration\n"),
                    Value::from("/opt/aws/bin/cfn-signal -e $? --region "),
                    Value::reference(pseudo::REGION),
                    Value::from(" --stack "),
                    Value::reference(pseudo::STACK_NAME),
                    Value::from(" --resource ECSAutoScalingGroup\n"),
                ],
            )),
        })
        .metadata(instance_metadata),
    )?;

    template.add_resource(
        "ECSAutoScalingGroup",
        Resource::new(autoscaling::AutoScalingGroup {
            desired_capacity: cluster_size.reference(),
            launch_configuration_name: launch_configuration.reference(),
            max_size: cluster_size.reference(),
            min_size: cluster_size.reference(),
            tags: autoscaling::GroupTags::name(Value::sub("${EnvironmentName} ECS host"), true),
            vpc_zone_identifier: subnets.reference(),
        })
        .creation_policy(CreationPolicy::resource_signal("PT15M"))
        .update_policy(UpdatePolicy::rolling_update(AutoScalingRollingUpdate::new(
            "1", "1", "PT15M",
        ))),
    )?;

    template.add_output(
        "Cluster",
        Output::new("A reference to the ECS cluster", cluster.reference()),
    )?;

    Ok(template)
}
