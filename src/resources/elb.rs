//! Application Load Balancer, target groups, listeners, and listener rules.

use serde::Serialize;

use super::Tags;
use crate::intrinsics::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancer {
    pub name: Value,
    pub security_groups: Vec<Value>,
    pub subnets: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_interval_seconds: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_timeout_seconds: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy_threshold_count: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<Matcher>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub port: String,
    pub protocol: String,
    pub vpc_id: Value,
}

impl TargetGroup {
    /// A bare HTTP target group; health-check fields stay unset.
    pub fn http(name: Option<&str>, port: &str, vpc_id: Value) -> Self {
        Self {
            health_check_interval_seconds: None,
            health_check_path: None,
            health_check_protocol: None,
            health_check_timeout_seconds: None,
            healthy_threshold_count: None,
            matcher: None,
            name: name.map(str::to_string),
            port: port.to_string(),
            protocol: "HTTP".to_string(),
            vpc_id,
        }
    }
}

/// HTTP codes counted as healthy, e.g. `200-299`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Matcher {
    pub http_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
    pub default_actions: Vec<Action>,
    pub load_balancer_arn: Value,
    pub port: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Action {
    #[serde(rename = "Type")]
    pub action_type: String,

    pub target_group_arn: Value,
}

impl Action {
    pub fn forward(target_group_arn: Value) -> Self {
        Self {
            action_type: "forward".to_string(),
            target_group_arn,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerRule {
    pub actions: Vec<Action>,
    pub conditions: Vec<RuleCondition>,
    pub listener_arn: Value,
    pub priority: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleCondition {
    pub field: String,
    pub values: Vec<Value>,
}

impl RuleCondition {
    pub fn path_pattern(pattern: Value) -> Self {
        Self {
            field: "path-pattern".to_string(),
            values: vec![pattern],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Listener, ListenerRule, RuleCondition, TargetGroup};
    use crate::intrinsics::Value;
    use serde_json::json;

    #[test]
    fn listener_forwards_to_the_default_target_group() {
        let listener = Listener {
            default_actions: vec![Action::forward(Value::reference("DefaultTargetGroup"))],
            load_balancer_arn: Value::reference("LoadBalancer"),
            port: "80".to_string(),
            protocol: "HTTP".to_string(),
        };
        let rendered = serde_json::to_value(listener).unwrap();
        assert_eq!(
            rendered["DefaultActions"],
            json!([{"Type": "forward", "TargetGroupArn": {"Ref": "DefaultTargetGroup"}}])
        );
    }

    #[test]
    fn bare_http_target_group_omits_health_checks() {
        let group = TargetGroup::http(Some("default"), "80", Value::reference("VPC"));
        let rendered = serde_json::to_value(group).unwrap();
        assert_eq!(
            rendered,
            json!({
                "Name": "default",
                "Port": "80",
                "Protocol": "HTTP",
                "VpcId": {"Ref": "VPC"},
            })
        );
    }

    #[test]
    fn listener_rule_matches_on_path_pattern() {
        let rule = ListenerRule {
            actions: vec![Action::forward(Value::reference("TargetGroup"))],
            conditions: vec![RuleCondition::path_pattern(Value::sub("${Path}/*"))],
            listener_arn: Value::reference("Listener"),
            priority: "2".to_string(),
        };
        let rendered = serde_json::to_value(rule).unwrap();
        assert_eq!(
            rendered["Conditions"],
            json!([{"Field": "path-pattern", "Values": [{"Fn::Sub": "${Path}/*"}]}])
        );
    }
}
