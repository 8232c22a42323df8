//! CloudWatch Logs.

use serde::Serialize;

use crate::intrinsics::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogGroup {
    pub log_group_name: Value,
    pub retention_in_days: i64,
}

#[cfg(test)]
mod tests {
    use super::LogGroup;
    use crate::intrinsics::{pseudo, Value};
    use serde_json::json;

    #[test]
    fn log_group_named_after_the_stack() {
        let group = LogGroup {
            log_group_name: Value::reference(pseudo::STACK_NAME),
            retention_in_days: 5,
        };
        assert_eq!(
            serde_json::to_value(group).unwrap(),
            json!({"LogGroupName": {"Ref": "AWS::StackName"}, "RetentionInDays": 5})
        );
    }
}
