//! IAM policy documents: trust policies and inline allow/deny statements.
//!
//! Pure data construction — actions are `service:Operation` strings, nothing
//! is evaluated. IAM interprets the document at deploy time.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// The `Principal` clause of a trust statement, e.g.
/// `{"Service": ["ec2.amazonaws.com"]}`.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    #[serde(rename = "Service")]
    service: Vec<String>,
}

impl Principal {
    pub fn service<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service: services.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    #[serde(rename = "Effect")]
    effect: Effect,

    #[serde(rename = "Action")]
    action: Vec<String>,

    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none")]
    principal: Option<Principal>,

    #[serde(rename = "Resource", skip_serializing_if = "Option::is_none")]
    resource: Option<Vec<String>>,
}

impl Statement {
    pub fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            action: Vec::new(),
            principal: None,
            resource: None,
        }
    }

    pub fn deny() -> Self {
        Self {
            effect: Effect::Deny,
            action: Vec::new(),
            principal: None,
            resource: None,
        }
    }

    /// Appends a `service:Operation` action. Wildcards like `Submit*` pass
    /// through untouched.
    pub fn action(mut self, service: &str, operation: &str) -> Self {
        self.action.push(format!("{}:{}", service, operation));
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn resource<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = Some(resources.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Statement")]
    statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self { statement }
    }
}

/// The trust policy letting `service` assume the role carrying it.
pub fn assume_role_policy(service: &str) -> PolicyDocument {
    PolicyDocument::new(vec![Statement::allow()
        .action("sts", "AssumeRole")
        .principal(Principal::service([service]))])
}

#[cfg(test)]
mod tests {
    use super::{assume_role_policy, PolicyDocument, Statement};
    use serde_json::json;

    #[test]
    fn trust_policy_names_the_assuming_service() {
        let rendered = serde_json::to_value(assume_role_policy("ec2.amazonaws.com")).unwrap();
        assert_eq!(
            rendered,
            json!({
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["sts:AssumeRole"],
                    "Principal": {"Service": ["ec2.amazonaws.com"]},
                }]
            })
        );
    }

    #[test]
    fn deny_statements_render_their_effect() {
        let rendered =
            serde_json::to_value(Statement::deny().action("s3", "DeleteBucket").resource(["*"]))
                .unwrap();
        assert_eq!(rendered["Effect"], json!("Deny"));
    }

    #[test]
    fn inline_statement_collects_actions_and_resources() {
        let document = PolicyDocument::new(vec![Statement::allow()
            .action("ecs", "Poll")
            .action("ecs", "Submit*")
            .resource(["*"])]);
        let rendered = serde_json::to_value(document).unwrap();
        assert_eq!(
            rendered,
            json!({
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["ecs:Poll", "ecs:Submit*"],
                    "Resource": ["*"],
                }]
            })
        );
    }
}
