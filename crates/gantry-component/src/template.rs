//! Packaging template assembly
//!
//! Collects parameter declarations and desired objects from a set of
//! components into a `template.openshift.io/v1` Template, and renders plain
//! multi-document manifests for direct application.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use gantry_common::{Error, KubeObject};

use crate::component::Component;
use crate::parameters::ParameterDeclaration;

/// Template API version
pub const TEMPLATE_API_VERSION: &str = "template.openshift.io/v1";

/// Template metadata
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateMetadata {
    /// Template name
    pub name: String,
}

/// A parameterized bundle of objects
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Always `template.openshift.io/v1`
    pub api_version: String,
    /// Always `Template`
    pub kind: String,
    /// Template metadata
    pub metadata: TemplateMetadata,
    /// Declared parameters, first declaration of a name wins
    pub parameters: Vec<ParameterDeclaration>,
    /// Serialized objects, in component order
    pub objects: Vec<serde_json::Value>,
}

impl Template {
    /// Create an empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: TEMPLATE_API_VERSION.to_string(),
            kind: "Template".to_string(),
            metadata: TemplateMetadata { name: name.into() },
            parameters: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Add parameters, skipping names that are already declared.
    ///
    /// Several components share parameters such as `APP_LABEL`.
    pub fn add_parameters(&mut self, parameters: impl IntoIterator<Item = ParameterDeclaration>) {
        let mut seen: BTreeSet<String> = self.parameters.iter().map(|p| p.name.clone()).collect();
        for param in parameters {
            if seen.insert(param.name.clone()) {
                self.parameters.push(param);
            }
        }
    }

    /// Append serialized objects
    pub fn add_objects(&mut self, objects: &[KubeObject]) -> Result<(), Error> {
        for object in objects {
            self.objects.push(object.to_json()?);
        }
        Ok(())
    }

    /// Assemble every component into this template, then run post-processing.
    pub fn assemble(&mut self, components: &[&dyn Component]) -> Result<(), Error> {
        for component in components {
            self.add_parameters(component.declare_parameters());
            let objects = component.assemble();
            debug!(
                component = component.name(),
                objects = objects.len(),
                "assembled component into template"
            );
            self.add_objects(&objects)?;
        }

        for (i, component) in components.iter().enumerate() {
            let others: Vec<&dyn Component> = components
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, c)| *c)
                .collect();
            component.post_process(self, &others);
        }
        Ok(())
    }

    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Render objects as a multi-document YAML stream
pub fn render_manifests(objects: &[KubeObject]) -> Result<String, Error> {
    let docs = objects
        .iter()
        .map(|o| Ok(serde_yaml::to_string(&o.to_json()?)?))
        .collect::<Result<Vec<String>, Error>>()?;
    Ok(docs.join("---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::{Redis, RedisOptionsBuilder, TemplateOptionsProvider};
    use crate::component::OptionsProvider;

    fn redis() -> Redis {
        let options = RedisOptionsBuilder::new()
            .app_label("api")
            .image("redis:7")
            .build()
            .unwrap();
        Redis::new(options)
    }

    #[test]
    fn duplicate_parameters_keep_first() {
        let mut template = Template::new("amp");
        template.add_parameters(vec![
            ParameterDeclaration::required("APP_LABEL", "first", "a"),
            ParameterDeclaration::required("APP_LABEL", "second", "b"),
        ]);
        assert_eq!(template.parameters.len(), 1);
        assert_eq!(template.parameters[0].description, "first");
    }

    #[test]
    fn assemble_collects_parameters_and_objects() {
        let redis = redis();
        let mut template = Template::new("amp");
        template.assemble(&[&redis]).unwrap();

        assert!(template.parameter("REDIS_IMAGE").unwrap().required);
        assert_eq!(template.objects.len(), redis.assemble().len());
        assert_eq!(template.objects[0]["kind"], "Deployment");
        assert_eq!(template.objects[0]["metadata"]["name"], "backend-redis");
    }

    #[test]
    fn placeholder_template_yaml_references_parameters() {
        let options = TemplateOptionsProvider.provide().unwrap();
        let redis = Redis::new(options);
        let mut template = Template::new("amp");
        template.assemble(&[&redis]).unwrap();

        let yaml = template.to_yaml().unwrap();
        assert!(yaml.contains("apiVersion: template.openshift.io/v1"));
        assert!(yaml.contains("${REDIS_IMAGE}"));
        assert!(yaml.contains("${APP_LABEL}"));
    }

    #[test]
    fn manifests_are_separated_documents() {
        let objects = redis().assemble();
        let rendered = render_manifests(&objects).unwrap();
        assert_eq!(rendered.matches("---\n").count(), objects.len() - 1);
        assert!(rendered.contains("kind: PersistentVolumeClaim"));
    }
}
