//! EC2 networking: VPC, subnets, gateways, routing, security groups.

use serde::Serialize;

use super::Tags;
use crate::intrinsics::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub cidr_block: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    pub internet_gateway_id: Value,
    pub vpc_id: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub availability_zone: Value,
    pub cidr_block: Value,
    pub map_public_ip_on_launch: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,

    pub vpc_id: Value,
}

/// An Elastic IP; `domain` is always `vpc` in these templates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Eip {
    pub domain: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGateway {
    pub allocation_id: Value,
    pub subnet_id: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,

    pub vpc_id: Value,
}

/// A route out of a table; exactly one of the gateway fields is set
/// depending on whether the route egresses via the IGW or a NAT gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub destination_cidr_block: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Value>,

    pub route_table_id: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociation {
    pub route_table_id: Value,
    pub subnet_id: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_description: String,
    pub security_group_ingress: Vec<SecurityGroupRule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,

    pub vpc_id: Value,
}

/// An ingress rule; sources are either a CIDR block or another security
/// group, and `ip_protocol` of `-1` means all traffic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<String>,

    pub ip_protocol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_security_group_id: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::{SecurityGroup, SecurityGroupRule, Subnet};
    use crate::intrinsics::Value;
    use serde_json::json;

    #[test]
    fn subnet_availability_zone_keeps_the_select_expression() {
        let subnet = Subnet {
            availability_zone: Value::select(1, Value::azs("")),
            cidr_block: Value::reference("PublicSubnet2CIDR"),
            map_public_ip_on_launch: false,
            tags: None,
            vpc_id: Value::reference("VPC"),
        };
        let rendered = serde_json::to_value(subnet).unwrap();
        assert_eq!(
            rendered["AvailabilityZone"],
            json!({"Fn::Select": ["1", {"Fn::GetAZs": ""}]})
        );
        assert_eq!(rendered["MapPublicIpOnLaunch"], json!(false));
    }

    #[test]
    fn ingress_rule_sources_render_distinctly() {
        let open = SecurityGroupRule {
            cidr_ip: Some("0.0.0.0/0".to_string()),
            ip_protocol: "-1".to_string(),
            source_security_group_id: None,
        };
        assert_eq!(
            serde_json::to_value(open).unwrap(),
            json!({"CidrIp": "0.0.0.0/0", "IpProtocol": "-1"})
        );

        let group = SecurityGroup {
            group_description: "Access to the ECS hosts".to_string(),
            security_group_ingress: vec![SecurityGroupRule {
                cidr_ip: None,
                ip_protocol: "-1".to_string(),
                source_security_group_id: Some(Value::reference("LoadBalancerSecurityGroup")),
            }],
            tags: None,
            vpc_id: Value::reference("VPC"),
        };
        let rendered = serde_json::to_value(group).unwrap();
        assert_eq!(
            rendered["SecurityGroupIngress"],
            json!([{
                "IpProtocol": "-1",
                "SourceSecurityGroupId": {"Ref": "LoadBalancerSecurityGroup"},
            }])
        );
    }
}
