//! Template input parameters.

use serde::Serialize;

use crate::intrinsics::Value;

/// The declared type of a parameter, including the AWS-specific ones the
/// stack templates use for cross-template wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    #[serde(rename = "String")]
    String,
    #[serde(rename = "Number")]
    Number,
    #[serde(rename = "AWS::EC2::VPC::Id")]
    VpcId,
    #[serde(rename = "List<AWS::EC2::Subnet::Id>")]
    SubnetIdList,
    #[serde(rename = "AWS::EC2::SecurityGroup::Id")]
    SecurityGroupId,
}

/// A named template input. Constraints are recorded verbatim for the
/// deploying platform to enforce; the generator never checks provided values.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    parameter_type: ParameterType,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(rename = "Default", skip_serializing_if = "Option::is_none")]
    default: Option<Value>,

    #[serde(rename = "AllowedValues", skip_serializing_if = "Option::is_none")]
    allowed_values: Option<Vec<String>>,

    #[serde(rename = "AllowedPattern", skip_serializing_if = "Option::is_none")]
    allowed_pattern: Option<String>,

    #[serde(rename = "MinValue", skip_serializing_if = "Option::is_none")]
    min_value: Option<String>,

    #[serde(rename = "MaxValue", skip_serializing_if = "Option::is_none")]
    max_value: Option<String>,

    /// Marks secrets; the deploying platform must never echo the value back.
    #[serde(rename = "NoEcho", skip_serializing_if = "Option::is_none")]
    no_echo: Option<bool>,
}

impl Parameter {
    pub fn new(parameter_type: ParameterType) -> Self {
        Self {
            parameter_type,
            description: None,
            default: None,
            allowed_values: None,
            allowed_pattern: None,
            min_value: None,
            max_value: None,
            no_echo: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ParameterType::String)
    }

    pub fn number() -> Self {
        Self::new(ParameterType::Number)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn allowed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn min_value(mut self, min: impl Into<String>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn max_value(mut self, max: impl Into<String>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn no_echo(mut self) -> Self {
        self.no_echo = Some(true);
        self
    }
}
