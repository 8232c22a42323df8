//! Launch configuration and Auto Scaling group.

use serde::Serialize;

use crate::intrinsics::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LaunchConfiguration {
    pub iam_instance_profile: Value,

    /// Typically a mapping lookup (region to AMI), left unevaluated.
    pub image_id: Value,

    pub instance_type: Value,
    pub security_groups: Vec<Value>,

    /// Base64-wrapped bootstrap script with embedded references.
    pub user_data: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AutoScalingGroup {
    pub desired_capacity: Value,
    pub launch_configuration_name: Value,
    pub max_size: Value,
    pub min_size: Value,
    pub tags: GroupTags,

    #[serde(rename = "VPCZoneIdentifier")]
    pub vpc_zone_identifier: Value,
}

/// Auto Scaling tags carry a propagate-at-launch flag the plain resource
/// tags do not.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupTags(Vec<GroupTag>);

impl GroupTags {
    pub fn name(value: impl Into<Value>, propagate_at_launch: bool) -> Self {
        Self(vec![GroupTag {
            key: "Name".to_string(),
            propagate_at_launch,
            value: value.into(),
        }])
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupTag {
    pub key: String,
    pub propagate_at_launch: bool,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::{AutoScalingGroup, GroupTags, LaunchConfiguration};
    use crate::intrinsics::{pseudo, Value};
    use serde_json::json;

    #[test]
    fn launch_configuration_keeps_the_ami_lookup_unevaluated() {
        let config = LaunchConfiguration {
            iam_instance_profile: Value::reference("ECSInstanceProfile"),
            image_id: Value::find_in_map(
                "AWSRegionToAMI",
                Value::reference(pseudo::REGION),
                "AMI",
            ),
            instance_type: Value::reference("InstanceType"),
            security_groups: vec![Value::reference("SecurityGroup")],
            user_data: Value::base64(Value::join("", vec![Value::from("#!/bin/bash\n")])),
        };
        let rendered = serde_json::to_value(config).unwrap();
        assert_eq!(
            rendered["ImageId"],
            json!({"Fn::FindInMap": ["AWSRegionToAMI", {"Ref": "AWS::Region"}, "AMI"]})
        );
        assert_eq!(
            rendered["UserData"],
            json!({"Fn::Base64": {"Fn::Join": ["", ["#!/bin/bash\n"]]}})
        );
    }

    #[test]
    fn group_tags_carry_the_propagate_flag() {
        let group = AutoScalingGroup {
            desired_capacity: Value::reference("ClusterSize"),
            launch_configuration_name: Value::reference("ECSLaunchConfiguration"),
            max_size: Value::reference("ClusterSize"),
            min_size: Value::reference("ClusterSize"),
            tags: GroupTags::name(Value::sub("${EnvironmentName} ECS host"), true),
            vpc_zone_identifier: Value::reference("Subnets"),
        };
        let rendered = serde_json::to_value(group).unwrap();
        assert_eq!(
            rendered["Tags"],
            json!([{
                "Key": "Name",
                "PropagateAtLaunch": true,
                "Value": {"Fn::Sub": "${EnvironmentName} ECS host"},
            }])
        );
        assert!(rendered.get("VPCZoneIdentifier").is_some());
    }
}
