//! Reference expressions and intrinsic functions.
//!
//! Every property value in a template is a [`Value`]: either a literal or a
//! symbolic expression (`Ref`, `Fn::GetAtt`, `Fn::FindInMap`, ...) that the
//! deploying platform resolves. The generator never evaluates these — it only
//! emits them in the encoding CloudFormation expects.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Pseudo parameters resolved by CloudFormation at deploy time.
pub mod pseudo {
    pub const REGION: &str = "AWS::Region";
    pub const STACK_NAME: &str = "AWS::StackName";
    pub const STACK_ID: &str = "AWS::StackId";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<Value>),
    /// `{"Ref": name}` — the identity of a parameter or resource.
    Ref(String),
    /// `{"Fn::GetAtt": [logical_name, attribute]}`.
    GetAtt(String, String),
    /// `{"Fn::FindInMap": [mapping, top_key, inner_key]}` — the three-part
    /// lookup is preserved as-is, never pre-resolved.
    FindInMap(String, Box<Value>, String),
    /// `{"Fn::Join": [separator, parts]}`.
    Join(String, Vec<Value>),
    /// `{"Fn::Sub": template}` with `${Name}` placeholders.
    Sub(String),
    /// `{"Fn::Select": [index, list]}`.
    Select(u32, Box<Value>),
    /// `{"Fn::GetAZs": region}`; an empty region means "the current one".
    GetAZs(String),
    /// `{"Fn::Base64": value}`.
    Base64(Box<Value>),
}

impl Value {
    pub fn reference(name: impl Into<String>) -> Self {
        Value::Ref(name.into())
    }

    pub fn get_att(logical_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::GetAtt(logical_name.into(), attribute.into())
    }

    pub fn find_in_map(
        mapping: impl Into<String>,
        top_key: Value,
        inner_key: impl Into<String>,
    ) -> Self {
        Value::FindInMap(mapping.into(), Box::new(top_key), inner_key.into())
    }

    pub fn join(separator: impl Into<String>, parts: Vec<Value>) -> Self {
        Value::Join(separator.into(), parts)
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Value::Sub(template.into())
    }

    pub fn select(index: u32, list: Value) -> Self {
        Value::Select(index, Box::new(list))
    }

    pub fn azs(region: impl Into<String>) -> Self {
        Value::GetAZs(region.into())
    }

    pub fn base64(value: Value) -> Self {
        Value::Base64(Box::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(value) => serializer.serialize_str(value),
            Value::Number(value) => serializer.serialize_i64(*value),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::List(items) => items.serialize(serializer),
            Value::Ref(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", name)?;
                map.end()
            }
            Value::GetAtt(logical_name, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &(logical_name, attribute))?;
                map.end()
            }
            Value::FindInMap(mapping, top_key, inner_key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::FindInMap", &(mapping, top_key, inner_key))?;
                map.end()
            }
            Value::Join(separator, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &(separator, parts))?;
                map.end()
            }
            Value::Sub(template) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", template)?;
                map.end()
            }
            // The index goes out as a string, the way the consuming pipeline
            // has always received it.
            Value::Select(index, list) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Select", &(index.to_string(), list))?;
                map.end()
            }
            Value::GetAZs(region) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAZs", region)?;
                map.end()
            }
            Value::Base64(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Base64", value)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use serde_json::json;

    #[test]
    fn encodes_ref() {
        let value = serde_json::to_value(Value::reference("VPC")).unwrap();
        assert_eq!(value, json!({"Ref": "VPC"}));
    }

    #[test]
    fn encodes_get_att() {
        let value = serde_json::to_value(Value::get_att("LoadBalancer", "DNSName")).unwrap();
        assert_eq!(value, json!({"Fn::GetAtt": ["LoadBalancer", "DNSName"]}));
    }

    #[test]
    fn find_in_map_keeps_all_three_parts() {
        let lookup = Value::find_in_map(
            "AWSRegionToAMI",
            Value::reference(super::pseudo::REGION),
            "AMI",
        );
        let value = serde_json::to_value(lookup).unwrap();
        assert_eq!(
            value,
            json!({"Fn::FindInMap": ["AWSRegionToAMI", {"Ref": "AWS::Region"}, "AMI"]})
        );
    }

    #[test]
    fn encodes_join_with_nested_expressions() {
        let joined = Value::join(
            "",
            vec![
                Value::from("http://"),
                Value::get_att("LoadBalancer", "DNSName"),
            ],
        );
        let value = serde_json::to_value(joined).unwrap();
        assert_eq!(
            value,
            json!({"Fn::Join": ["", ["http://", {"Fn::GetAtt": ["LoadBalancer", "DNSName"]}]]})
        );
    }

    #[test]
    fn select_index_is_a_string() {
        let value = serde_json::to_value(Value::select(0, Value::azs(""))).unwrap();
        assert_eq!(value, json!({"Fn::Select": ["0", {"Fn::GetAZs": ""}]}));
    }

    #[test]
    fn literal_lists_stay_plain_arrays() {
        let value: Value = vec![Value::from("a"), Value::from(2), Value::from(true)].into();
        assert_eq!(serde_json::to_value(value).unwrap(), json!(["a", 2, true]));
    }

    #[test]
    fn encodes_base64_and_sub() {
        let value = serde_json::to_value(Value::base64(Value::sub("${EnvironmentName}"))).unwrap();
        assert_eq!(value, json!({"Fn::Base64": {"Fn::Sub": "${EnvironmentName}"}}));
    }
}
