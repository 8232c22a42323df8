//! Generates the security-groups template. The groups live in their own
//! nested template so every other nested template can reference them.

use anyhow::Result;
use cfn_templates::resources::{ec2, Resource, Tags};
use cfn_templates::template::Error;
use cfn_templates::{Output, Parameter, ParameterType, Template, Value};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let template = build()?;
    info!(
        resources = template.resource_count(),
        "rendered the security-groups template"
    );
    println!("{}", template.to_json()?);
    Ok(())
}

fn build() -> Result<Template, Error> {
    let mut template = Template::new();
    template.set_version("2010-09-09");
    template.set_description(
        "This template contains the security groups required by our entire stack. \
         We create them in a seperate nested template, so they can be referenced \
         by all of the other nested templates",
    );

    template.add_parameter(
        "EnvironmentName",
        Parameter::string()
            .description("An environment name that will be prefixed to resource names"),
    )?;
    let vpc = template.add_parameter(
        "VPC",
        Parameter::new(ParameterType::VpcId)
            .description("Choose which VPC this ECS cluster should be deployed to"),
    )?;

    // Anything on the internet may reach the load balancer; the hosts behind
    // it only accept traffic arriving through it.
    let load_balancer_group = template.add_resource(
        "LoadBalancerSecurityGroup",
        Resource::new(ec2::SecurityGroup {
            group_description: "Access to the load balancer that sits in front of ECS"
                .to_string(),
            security_group_ingress: vec![ec2::SecurityGroupRule {
                cidr_ip: Some("0.0.0.0/0".to_string()),
                ip_protocol: "-1".to_string(),
                source_security_group_id: None,
            }],
            tags: Some(Tags::name(Value::sub("${EnvironmentName}-LoadBalancers"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    let ecs_host_group = template.add_resource(
        "ECSHostSecurityGroup",
        Resource::new(ec2::SecurityGroup {
            group_description:
                "Access to the ECS hosts and the tasks/containers that run on them".to_string(),
            security_group_ingress: vec![ec2::SecurityGroupRule {
                cidr_ip: None,
                ip_protocol: "-1".to_string(),
                source_security_group_id: Some(load_balancer_group.reference()),
            }],
            tags: Some(Tags::name(Value::sub("${EnvironmentName}-ECS-Hosts"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    template.add_output(
        "ECSHostSecurityGroup",
        Output::new(
            "A reference to the security group for ECS hosts",
            ecs_host_group.reference(),
        ),
    )?;
    template.add_output(
        "LoadBalancerSecurityGroup",
        Output::new(
            "A reference to the security group for load balancers",
            load_balancer_group.reference(),
        ),
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
    fn host_group_admits_only_the_load_balancer_group() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        let ingress =
            &document["Resources"]["ECSHostSecurityGroup"]["Properties"]["SecurityGroupIngress"];
        assert_eq!(
            ingress[0]["SourceSecurityGroupId"],
            serde_json::json!({"Ref": "LoadBalancerSecurityGroup"})
        );
        assert!(ingress[0].get("CidrIp").is_none());
    }
}
