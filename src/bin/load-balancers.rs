//! Generates the Application Load Balancer template. The ALB lives in its
//! own nested template so every ECS service template can register against
//! its listener.

use anyhow::Result;
use cfn_templates::resources::{elb, Resource, Tags};
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
        "rendered the load-balancers template"
    );
    println!("{}", template.to_json()?);
    Ok(())
}

fn build() -> Result<Template, Error> {
    let mut template = Template::new();
    template.set_version("2010-09-09");

    let env = template.add_parameter(
        "EnvironmentName",
        Parameter::string()
            .description("An environment name that will be prefixed to resource names"),
    )?;
    let vpc = template.add_parameter(
        "VPC",
        Parameter::new(ParameterType::VpcId)
            .description("Choose which VPC this ECS cluster should be deployed to"),
    )?;
    let subnets = template.add_parameter(
        "Subnets",
        Parameter::new(ParameterType::SubnetIdList).description(
            "Choose which subnets the Applicaion Load Balancer should be deployed to",
        ),
    )?;
    let security_group = template.add_parameter(
        "SecurityGroup",
        Parameter::new(ParameterType::SecurityGroupId).description(
            "Select the Security Group to apply to the Applicaion Load Balancer",
        ),
    )?;

    let load_balancer = template.add_resource(
        "LoadBalancer",
        Resource::new(elb::LoadBalancer {
            name: env.reference(),
            security_groups: vec![security_group.reference()],
            subnets: subnets.reference(),
            tags: Some(Tags::name(Value::sub("${EnvironmentName}"))),
        }),
    )?;

    // Listeners require a default target group even though every service
    // registers its own.
    let default_target_group = template.add_resource(
        "DefaultTargetGroup",
        Resource::new(elb::TargetGroup::http(Some("default"), "80", vpc.reference())),
    )?;

    let listener = template.add_resource(
        "LoadBalancerListener",
        Resource::new(elb::Listener {
            default_actions: vec![elb::Action::forward(default_target_group.reference())],
            load_balancer_arn: load_balancer.reference(),
            port: "80".to_string(),
            protocol: "HTTP".to_string(),
        }),
    )?;

    template.add_output(
        "LoadBalancer",
        Output::new(
            "A reference to the Application Load Balancer",
            load_balancer.reference(),
        ),
    )?;
    template.add_output(
        "LoadBalancerUrl",
        Output::new(
            "The URL of the ALB",
            Value::join(
                "",
                vec![
                    Value::from("http://"),
                    load_balancer.attribute("DNSName"),
                ],
            ),
        ),
    )?;
    template.add_output(
        "Listener",
        Output::new("A reference to a port 80 listener", listener.reference()),
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
    fn url_output_joins_a_literal_with_the_dns_attribute() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(
            document["Outputs"]["LoadBalancerUrl"]["Value"],
            serde_json::json!({
                "Fn::Join": ["", ["http://", {"Fn::GetAtt": ["LoadBalancer", "DNSName"]}]]
            })
        );
    }
}
