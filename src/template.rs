//! The template under construction and its renderer.
//!
//! A [`Template`] exclusively owns everything declared into it. Declaration
//! is the only lifecycle step — entities are write-once, and the only
//! failures are duplicate names, reported immediately. Rendering is a pure
//! function of the declared graph: the same graph always produces the same
//! bytes, because downstream tooling diffs the documents between runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::intrinsics::Value;
use crate::parameter::Parameter;
use crate::resources::Resource;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Parameter `{0}` is already declared")]
    DuplicateParameter(String),

    #[error("Mapping `{0}` is already declared")]
    DuplicateMapping(String),

    #[error("Resource `{0}` is already declared")]
    DuplicateResource(String),

    #[error("Output `{0}` is already declared")]
    DuplicateOutput(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// A static two-level lookup table, top key (usually a region) to inner
/// key/value pairs. Consulted only through `Fn::FindInMap` expressions.
pub type MappingTable = BTreeMap<String, BTreeMap<String, String>>;

/// A named value re-exposed for dependent templates.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    #[serde(rename = "Description")]
    description: String,

    #[serde(rename = "Value")]
    value: Value,
}

impl Output {
    pub fn new(description: impl Into<String>, value: Value) -> Self {
        Self {
            description: description.into(),
            value,
        }
    }
}

/// Proof that a parameter was declared; produces `Ref` expressions.
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    name: String,
}

impl ParameterHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> Value {
        Value::reference(&self.name)
    }
}

/// Proof that a resource was declared; produces `Ref` and `Fn::GetAtt`
/// expressions against its logical name.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    logical_name: String,
}

impl ResourceHandle {
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn reference(&self) -> Value {
        Value::reference(&self.logical_name)
    }

    pub fn attribute(&self, name: &str) -> Value {
        Value::get_att(&self.logical_name, name)
    }
}

#[derive(Debug, Clone)]
pub struct MappingHandle {
    name: String,
}

impl MappingHandle {
    /// An unevaluated three-part lookup: mapping name, top-key expression,
    /// inner key.
    pub fn lookup(&self, top_key: Value, inner_key: &str) -> Value {
        Value::find_in_map(&self.name, top_key, inner_key)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Template {
    #[serde(
        rename = "AWSTemplateFormatVersion",
        skip_serializing_if = "Option::is_none"
    )]
    version: Option<String>,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Parameter>,

    #[serde(rename = "Mappings", skip_serializing_if = "BTreeMap::is_empty")]
    mappings: BTreeMap<String, MappingTable>,

    #[serde(rename = "Resources")]
    resources: BTreeMap<String, Resource>,

    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn add_parameter(
        &mut self,
        name: &str,
        parameter: Parameter,
    ) -> Result<ParameterHandle, Error> {
        if self.parameters.contains_key(name) {
            return Err(Error::DuplicateParameter(name.to_string()));
        }
        self.parameters.insert(name.to_string(), parameter);
        Ok(ParameterHandle {
            name: name.to_string(),
        })
    }

    pub fn add_mapping(&mut self, name: &str, table: MappingTable) -> Result<MappingHandle, Error> {
        if self.mappings.contains_key(name) {
            return Err(Error::DuplicateMapping(name.to_string()));
        }
        self.mappings.insert(name.to_string(), table);
        Ok(MappingHandle {
            name: name.to_string(),
        })
    }

    /// Registers a resource under its logical name. No cross-resource
    /// validation happens here — a route may point at a gateway that is
    /// never declared, and only the deploying platform will complain.
    pub fn add_resource(
        &mut self,
        logical_name: &str,
        resource: Resource,
    ) -> Result<ResourceHandle, Error> {
        if self.resources.contains_key(logical_name) {
            return Err(Error::DuplicateResource(logical_name.to_string()));
        }
        self.resources.insert(logical_name.to_string(), resource);
        Ok(ResourceHandle {
            logical_name: logical_name.to_string(),
        })
    }

    pub fn add_output(&mut self, name: &str, output: Output) -> Result<(), Error> {
        if self.outputs.contains_key(name) {
            return Err(Error::DuplicateOutput(name.to_string()));
        }
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Renders the template as CloudFormation JSON. Keys are sorted
    /// alphabetically at every level and the indent is four spaces, matching
    /// the documents the deployment pipeline already consumes.
    pub fn to_json(&self) -> Result<String, Error> {
        // Round-tripping through a serde_json::Value sorts every object's
        // keys, so struct field order never leaks into the output.
        let document = self.to_document()?;
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|error| Error::Render(error.to_string()))?;
        String::from_utf8(buffer).map_err(|error| Error::Render(error.to_string()))
    }

    /// The same graph rendered as YAML; key order matches [`to_json`].
    ///
    /// [`to_json`]: Template::to_json
    pub fn to_yaml(&self) -> Result<String, Error> {
        let document = self.to_document()?;
        serde_yaml::to_string(&document).map_err(|error| Error::Render(error.to_string()))
    }

    fn to_document(&self) -> Result<serde_json::Value, Error> {
        serde_json::to_value(self).map_err(|error| Error::Render(error.to_string()))
    }

    /// Reference-expression targets that are not declared in this template.
    /// Pseudo parameters (`AWS::*`) are exempt. This is an opt-in structural
    /// check; declaration never enforces it.
    pub fn undeclared_refs(&self) -> Result<Vec<String>, Error> {
        let document = self.to_document()?;
        let mut names = BTreeSet::new();
        let mut mapping_names = BTreeSet::new();
        collect_refs(&document, &mut names, &mut mapping_names);

        let mut undeclared: Vec<String> = names
            .into_iter()
            .filter(|name| !name.starts_with("AWS::"))
            .filter(|name| {
                !self.parameters.contains_key(name) && !self.resources.contains_key(name)
            })
            .collect();
        undeclared.extend(
            mapping_names
                .into_iter()
                .filter(|name| !self.mappings.contains_key(name)),
        );
        Ok(undeclared)
    }
}

fn collect_refs(
    node: &serde_json::Value,
    names: &mut BTreeSet<String>,
    mapping_names: &mut BTreeSet<String>,
) {
    match node {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("Ref", serde_json::Value::String(name)) => {
                        names.insert(name.clone());
                    }
                    ("Fn::GetAtt", serde_json::Value::Array(parts)) => {
                        if let Some(serde_json::Value::String(name)) = parts.first() {
                            names.insert(name.clone());
                        }
                    }
                    ("Fn::FindInMap", serde_json::Value::Array(parts)) => {
                        if let Some(serde_json::Value::String(name)) = parts.first() {
                            mapping_names.insert(name.clone());
                        }
                        for part in parts.iter().skip(1) {
                            collect_refs(part, names, mapping_names);
                        }
                    }
                    ("Fn::Sub", serde_json::Value::String(template)) => {
                        sub_placeholders(template, names);
                    }
                    _ => collect_refs(value, names, mapping_names),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_refs(item, names, mapping_names);
            }
        }
        _ => {}
    }
}

/// Extracts `${Name}` placeholders; `${!...}` literals are skipped and
/// `${Name.Attr}` counts as a reference to `Name`.
fn sub_placeholders(template: &str, names: &mut BTreeSet<String>) {
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let end = match after.find('}') {
            Some(end) => end,
            None => break,
        };
        let placeholder = &after[..end];
        if !placeholder.starts_with('!') {
            let name = placeholder.split('.').next().unwrap_or(placeholder);
            names.insert(name.to_string());
        }
        rest = &after[end + 1..];
    }
}
