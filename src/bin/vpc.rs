//! Generates the networking template: a VPC with a pair of public and
//! private subnets spread across two Availability Zones, an Internet
//! Gateway with a default route on the public subnets, and a pair of NAT
//! Gateways (one per AZ) with default routes in the private subnets.

use anyhow::Result;
use cfn_templates::resources::{ec2, Resource, Tags};
use cfn_templates::template::Error;
use cfn_templates::{Output, Parameter, Template, Value};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let template = build()?;
    info!(
        resources = template.resource_count(),
        outputs = template.output_count(),
        "rendered the VPC template"
    );
    println!("{}", template.to_json()?);
    Ok(())
}

fn build() -> Result<Template, Error> {
    let mut template = Template::new();
    template.set_version("2010-09-09");
    template.set_description(
        "This template deploys a VPC, with a pair of public and private subnets spread \
         across two Availabilty Zones. It deploys an Internet Gateway, with a default \
         route on the public subnets. It deploys a pair of NAT Gateways (one in each AZ), \
         and default routes for them in the private subnets.",
    );

    let env = template.add_parameter(
        "EnvironmentName",
        Parameter::string()
            .description("An environment name that will be prefixed to resource names"),
    )?;
    let vpc_cidr = template.add_parameter(
        "VpcCIDR",
        Parameter::string()
            .description("Please enter the IP range (CIDR notation) for this VPC")
            .default("10.192.0.0/16"),
    )?;
    let public_subnet_1_cidr = template.add_parameter(
        "PublicSubnet1CIDR",
        Parameter::string()
            .description(
                "Please enter the IP range (CIDR notation) for the public subnet \
                 in the first Availability Zone",
            )
            .default("10.192.10.0/24"),
    )?;
    let public_subnet_2_cidr = template.add_parameter(
        "PublicSubnet2CIDR",
        Parameter::string()
            .description(
                "Please enter the IP range (CIDR notation) for the public subnet \
                 in the second Availability Zone",
            )
            .default("10.192.11.0/24"),
    )?;
    let private_subnet_1_cidr = template.add_parameter(
        "PrivateSubnet1CIDR",
        Parameter::string()
            .description(
                "Please enter the IP range (CIDR notation) for the private subnet \
                 in the first Availability Zone",
            )
            .default("10.192.20.0/24"),
    )?;
    let private_subnet_2_cidr = template.add_parameter(
        "PrivateSubnet2CIDR",
        Parameter::string()
            .description(
                "Please enter the IP range (CIDR notation) for the private subnet \
                 in the second Availability Zone",
            )
            .default("10.192.21.0/24"),
    )?;

    let vpc = template.add_resource(
        "VPC",
        Resource::new(ec2::Vpc {
            cidr_block: vpc_cidr.reference(),
            tags: Some(Tags::name(env.reference())),
        }),
    )?;

    let internet_gateway = template.add_resource(
        "InternetGateway",
        Resource::new(ec2::InternetGateway {
            tags: Some(Tags::name(env.reference())),
        }),
    )?;

    template.add_resource(
        "InternetGatewayAttachment",
        Resource::new(ec2::VpcGatewayAttachment {
            internet_gateway_id: internet_gateway.reference(),
            vpc_id: vpc.reference(),
        }),
    )?;

    let public_subnet_1 = template.add_resource(
        "PublicSubnet1",
        Resource::new(ec2::Subnet {
            availability_zone: Value::select(0, Value::azs("")),
            cidr_block: public_subnet_1_cidr.reference(),
            map_public_ip_on_launch: false,
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Public Subnet (AZ1)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    let public_subnet_2 = template.add_resource(
        "PublicSubnet2",
        Resource::new(ec2::Subnet {
            availability_zone: Value::select(1, Value::azs("")),
            cidr_block: public_subnet_2_cidr.reference(),
            map_public_ip_on_launch: false,
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Public Subnet (AZ2)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    let private_subnet_1 = template.add_resource(
        "PrivateSubnet1",
        Resource::new(ec2::Subnet {
            availability_zone: Value::select(0, Value::azs("")),
            cidr_block: private_subnet_1_cidr.reference(),
            map_public_ip_on_launch: false,
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Private Subnet (AZ1)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    let private_subnet_2 = template.add_resource(
        "PrivateSubnet2",
        Resource::new(ec2::Subnet {
            availability_zone: Value::select(1, Value::azs("")),
            cidr_block: private_subnet_2_cidr.reference(),
            map_public_ip_on_launch: false,
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Private Subnet (AZ2)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    // The EIPs must not allocate before the gateway is attached, and nothing
    // in their properties expresses that, hence the explicit ordering.
    let nat_gateway_1_eip = template.add_resource(
        "NatGateway1EIP",
        Resource::new(ec2::Eip {
            domain: "vpc".to_string(),
        })
        .depends_on("InternetGatewayAttachment"),
    )?;

    let nat_gateway_2_eip = template.add_resource(
        "NatGateway2EIP",
        Resource::new(ec2::Eip {
            domain: "vpc".to_string(),
        })
        .depends_on("InternetGatewayAttachment"),
    )?;

    let nat_gateway_1 = template.add_resource(
        "NatGateway1",
        Resource::new(ec2::NatGateway {
            allocation_id: nat_gateway_1_eip.attribute("AllocationId"),
            subnet_id: public_subnet_1.reference(),
        }),
    )?;

    let nat_gateway_2 = template.add_resource(
        "NatGateway2",
        Resource::new(ec2::NatGateway {
            allocation_id: nat_gateway_2_eip.attribute("AllocationId"),
            subnet_id: public_subnet_2.reference(),
        }),
    )?;

    let public_route_table = template.add_resource(
        "PublicRouteTable",
        Resource::new(ec2::RouteTable {
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Public Routes"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    template.add_resource(
        "DefaultPublicRoute",
        Resource::new(ec2::Route {
            destination_cidr_block: "0.0.0.0/0".to_string(),
            gateway_id: Some(internet_gateway.reference()),
            nat_gateway_id: None,
            route_table_id: public_route_table.reference(),
        }),
    )?;

    template.add_resource(
        "PublicSubnet1RouteTableAssociation",
        Resource::new(ec2::SubnetRouteTableAssociation {
            route_table_id: public_route_table.reference(),
            subnet_id: public_subnet_1.reference(),
        }),
    )?;

    template.add_resource(
        "PublicSubnet2RouteTableAssociation",
        Resource::new(ec2::SubnetRouteTableAssociation {
            route_table_id: public_route_table.reference(),
            subnet_id: public_subnet_2.reference(),
        }),
    )?;

    let private_route_table_1 = template.add_resource(
        "PrivateRouteTable1",
        Resource::new(ec2::RouteTable {
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Private Routes (AZ1)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    template.add_resource(
        "DefaultPrivateRoute1",
        Resource::new(ec2::Route {
            destination_cidr_block: "0.0.0.0/0".to_string(),
            gateway_id: None,
            nat_gateway_id: Some(nat_gateway_1.reference()),
            route_table_id: private_route_table_1.reference(),
        }),
    )?;

    template.add_resource(
        "PrivateSubnet1RouteTableAssociation",
        Resource::new(ec2::SubnetRouteTableAssociation {
            route_table_id: private_route_table_1.reference(),
            subnet_id: private_subnet_1.reference(),
        }),
    )?;

    let private_route_table_2 = template.add_resource(
        "PrivateRouteTable2",
        Resource::new(ec2::RouteTable {
            tags: Some(Tags::name(Value::sub("${EnvironmentName} Private Routes (AZ2)"))),
            vpc_id: vpc.reference(),
        }),
    )?;

    template.add_resource(
        "DefaultPrivateRoute2",
        Resource::new(ec2::Route {
            destination_cidr_block: "0.0.0.0/0".to_string(),
            gateway_id: None,
            nat_gateway_id: Some(nat_gateway_2.reference()),
            route_table_id: private_route_table_2.reference(),
        }),
    )?;

    template.add_resource(
        "PrivateSubnet2RouteTableAssociation",
        Resource::new(ec2::SubnetRouteTableAssociation {
            route_table_id: private_route_table_2.reference(),
            subnet_id: private_subnet_2.reference(),
        }),
    )?;

    template.add_output(
        "VPC",
        Output::new("A reference to the created VPC", vpc.reference()),
    )?;
    template.add_output(
        "PublicSubnets",
        Output::new(
            "A list of the public subnets",
            Value::join(
                ",",
                vec![public_subnet_1.reference(), public_subnet_2.reference()],
            ),
        ),
    )?;
    template.add_output(
        "PrivateSubnets",
        Output::new(
            "A list of the private subnets",
            Value::join(
                ",",
                vec![private_subnet_1.reference(), private_subnet_2.reference()],
            ),
        ),
    )?;
    template.add_output(
        "PublicSubnet1",
        Output::new(
            "A reference to the public subnet in the 1st Availability Zone",
            public_subnet_1.reference(),
        ),
    )?;
    template.add_output(
        "PublicSubnet2",
        Output::new(
            "A reference to the public subnet in the 2nd Availability Zone",
            public_subnet_2.reference(),
        ),
    )?;
    template.add_output(
        "PrivateSubnet1",
        Output::new(
            "A reference to the private  subnet in the 1st Availability Zone",
            private_subnet_1.reference(),
        ),
    )?;
    template.add_output(
        "PrivateSubnet2",
        Output::new(
            "A reference to the private  subnet in the 2nd Availability Zone",
            private_subnet_2.reference(),
        ),
    )?;

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::build;

    #[test]
    fn declares_the_full_network() {
        let template = build().unwrap();
        assert_eq!(template.parameter_count(), 6);
        assert_eq!(template.resource_count(), 21);
        assert_eq!(template.output_count(), 7);
    }

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
    fn public_subnets_sit_in_distinct_zones() {
        let template = build().unwrap();
        let document: serde_json::Value =
            serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(
            document["Resources"]["PublicSubnet1"]["Properties"]["AvailabilityZone"],
            serde_json::json!({"Fn::Select": ["0", {"Fn::GetAZs": ""}]})
        );
        assert_eq!(
            document["Resources"]["PublicSubnet2"]["Properties"]["AvailabilityZone"],
            serde_json::json!({"Fn::Select": ["1", {"Fn::GetAZs": ""}]})
        );
    }
}
