//! IAM roles and instance profiles.

use serde::Serialize;

use crate::intrinsics::Value;
use crate::policy::PolicyDocument;

/// A role built from a trust policy (who may assume it) plus zero or more
/// named inline policies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub assume_role_policy_document: PolicyDocument,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<RolePolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RolePolicy {
    pub policy_document: PolicyDocument,
    pub policy_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub roles: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::{InstanceProfile, Role, RolePolicy};
    use crate::intrinsics::Value;
    use crate::policy::{assume_role_policy, PolicyDocument, Statement};
    use serde_json::json;

    #[test]
    fn role_nests_trust_and_inline_policies() {
        let role = Role {
            assume_role_policy_document: assume_role_policy("ec2.amazonaws.com"),
            path: Some("/".to_string()),
            policies: vec![RolePolicy {
                policy_document: PolicyDocument::new(vec![Statement::allow()
                    .action("ecs", "Poll")
                    .resource(["*"])]),
                policy_name: "ecs-service".to_string(),
            }],
            role_name: Some(Value::sub("${EnvironmentName}-ECSRole-${AWS::Region}")),
        };
        let rendered = serde_json::to_value(role).unwrap();
        assert_eq!(
            rendered["AssumeRolePolicyDocument"]["Statement"][0]["Principal"],
            json!({"Service": ["ec2.amazonaws.com"]})
        );
        assert_eq!(rendered["Policies"][0]["PolicyName"], json!("ecs-service"));
        assert_eq!(
            rendered["RoleName"],
            json!({"Fn::Sub": "${EnvironmentName}-ECSRole-${AWS::Region}"})
        );
    }

    #[test]
    fn instance_profile_references_its_roles() {
        let profile = InstanceProfile {
            path: Some("/".to_string()),
            roles: vec![Value::reference("ECSRole")],
        };
        let rendered = serde_json::to_value(profile).unwrap();
        assert_eq!(
            rendered,
            json!({"Path": "/", "Roles": [{"Ref": "ECSRole"}]})
        );
    }
}
