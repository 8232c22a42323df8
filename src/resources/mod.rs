//! Declared infrastructure objects.
//!
//! One variant per resource kind, each carrying its own typed property
//! struct, grouped by service the way the property schemas group them.

pub mod autoscaling;
pub mod ec2;
pub mod ecs;
pub mod elb;
pub mod iam;
pub mod logs;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::init::Metadata;
use crate::intrinsics::Value;
use crate::policies::{CreationPolicy, UpdatePolicy};

/// A resource tag, `{"Key": ..., "Value": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    key: String,

    #[serde(rename = "Value")]
    value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// The single `Name` tag every tagged resource in this stack carries.
    pub fn name(value: impl Into<Value>) -> Self {
        Self(vec![Tag {
            key: "Name".to_string(),
            value: value.into(),
        }])
    }
}

macro_rules! resource_kinds {
    ($( $variant:ident($properties:ty) => $type_name:literal, )+) => {
        #[derive(Debug, Clone)]
        pub enum ResourceKind {
            $( $variant($properties), )+
        }

        impl ResourceKind {
            /// The CloudFormation type identifier, e.g. `AWS::EC2::VPC`.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $( ResourceKind::$variant(_) => $type_name, )+
                }
            }

            fn serialize_properties<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
                match self {
                    $(
                        ResourceKind::$variant(properties) => {
                            map.serialize_entry("Properties", properties)
                        }
                    )+
                }
            }
        }

        $(
            impl From<$properties> for ResourceKind {
                fn from(properties: $properties) -> Self {
                    ResourceKind::$variant(properties)
                }
            }
        )+
    };
}

resource_kinds! {
    Vpc(ec2::Vpc) => "AWS::EC2::VPC",
    InternetGateway(ec2::InternetGateway) => "AWS::EC2::InternetGateway",
    VpcGatewayAttachment(ec2::VpcGatewayAttachment) => "AWS::EC2::VPCGatewayAttachment",
    Subnet(ec2::Subnet) => "AWS::EC2::Subnet",
    Eip(ec2::Eip) => "AWS::EC2::EIP",
    NatGateway(ec2::NatGateway) => "AWS::EC2::NatGateway",
    RouteTable(ec2::RouteTable) => "AWS::EC2::RouteTable",
    Route(ec2::Route) => "AWS::EC2::Route",
    SubnetRouteTableAssociation(ec2::SubnetRouteTableAssociation) => "AWS::EC2::SubnetRouteTableAssociation",
    SecurityGroup(ec2::SecurityGroup) => "AWS::EC2::SecurityGroup",
    Role(iam::Role) => "AWS::IAM::Role",
    InstanceProfile(iam::InstanceProfile) => "AWS::IAM::InstanceProfile",
    Cluster(ecs::Cluster) => "AWS::ECS::Cluster",
    TaskDefinition(ecs::TaskDefinition) => "AWS::ECS::TaskDefinition",
    Service(ecs::Service) => "AWS::ECS::Service",
    LoadBalancer(elb::LoadBalancer) => "AWS::ElasticLoadBalancingV2::LoadBalancer",
    TargetGroup(elb::TargetGroup) => "AWS::ElasticLoadBalancingV2::TargetGroup",
    Listener(elb::Listener) => "AWS::ElasticLoadBalancingV2::Listener",
    ListenerRule(elb::ListenerRule) => "AWS::ElasticLoadBalancingV2::ListenerRule",
    LaunchConfiguration(autoscaling::LaunchConfiguration) => "AWS::AutoScaling::LaunchConfiguration",
    AutoScalingGroup(autoscaling::AutoScalingGroup) => "AWS::AutoScaling::AutoScalingGroup",
    LogGroup(logs::LogGroup) => "AWS::Logs::LogGroup",
}

/// A declared resource: its kind plus the optional attachments the stack
/// templates use (explicit ordering, bootstrap metadata, creation and update
/// policies).
#[derive(Debug, Clone)]
pub struct Resource {
    kind: ResourceKind,
    depends_on: Option<String>,
    metadata: Option<Metadata>,
    creation_policy: Option<CreationPolicy>,
    update_policy: Option<UpdatePolicy>,
}

impl Resource {
    pub fn new(kind: impl Into<ResourceKind>) -> Self {
        Self {
            kind: kind.into(),
            depends_on: None,
            metadata: None,
            creation_policy: None,
            update_policy: None,
        }
    }

    /// Forces creation ordering on a resource the properties do not already
    /// reference (e.g. an EIP waiting on the gateway attachment). The target
    /// is a logical name; nothing checks that it is declared.
    pub fn depends_on(mut self, logical_name: impl Into<String>) -> Self {
        self.depends_on = Some(logical_name.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn creation_policy(mut self, policy: CreationPolicy) -> Self {
        self.creation_policy = Some(policy);
        self
    }

    pub fn update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = Some(policy);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(policy) = &self.creation_policy {
            map.serialize_entry("CreationPolicy", policy)?;
        }
        if let Some(logical_name) = &self.depends_on {
            map.serialize_entry("DependsOn", logical_name)?;
        }
        if let Some(metadata) = &self.metadata {
            map.serialize_entry("Metadata", metadata)?;
        }
        self.kind.serialize_properties(&mut map)?;
        map.serialize_entry("Type", self.kind.type_name())?;
        if let Some(policy) = &self.update_policy {
            map.serialize_entry("UpdatePolicy", policy)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{ec2, Resource, Tags};
    use crate::intrinsics::Value;
    use serde_json::json;

    #[test]
    fn renders_type_and_properties() {
        let resource = Resource::new(ec2::Vpc {
            cidr_block: Value::reference("VpcCIDR"),
            tags: Some(Tags::name(Value::reference("EnvironmentName"))),
        });
        assert_eq!(resource.type_name(), "AWS::EC2::VPC");
        let rendered = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            rendered,
            json!({
                "Type": "AWS::EC2::VPC",
                "Properties": {
                    "CidrBlock": {"Ref": "VpcCIDR"},
                    "Tags": [{"Key": "Name", "Value": {"Ref": "EnvironmentName"}}],
                },
            })
        );
    }

    #[test]
    fn depends_on_is_a_single_logical_name() {
        let resource = Resource::new(ec2::Eip {
            domain: "vpc".to_string(),
        })
        .depends_on("InternetGatewayAttachment");
        let rendered = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            rendered,
            json!({
                "DependsOn": "InternetGatewayAttachment",
                "Type": "AWS::EC2::EIP",
                "Properties": {"Domain": "vpc"},
            })
        );
    }
}
