//! Template command - print a parameterized packaging Template

use clap::Args;
use tracing::info;

use gantry_component::redis::TemplateOptionsProvider;
use gantry_component::{OptionsProvider, Redis, Template};

use crate::Result;

/// Template command arguments
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Template name
    #[arg(long, default_value = "3scale-api-management")]
    pub name: String,
}

/// Build the Template with placeholder values
pub fn build(args: &TemplateArgs) -> Result<Template> {
    let options = TemplateOptionsProvider.provide()?;
    let redis = Redis::new(options);

    let mut template = Template::new(args.name.as_str());
    template.assemble(&[&redis])?;
    info!(
        name = %args.name,
        parameters = template.parameters.len(),
        objects = template.objects.len(),
        "template assembled"
    );
    Ok(template)
}

pub fn run(args: TemplateArgs) -> Result<()> {
    print!("{}", build(&args)?.to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_uses_placeholders() {
        let template = build(&TemplateArgs {
            name: "amp".to_string(),
        })
        .unwrap();
        let yaml = template.to_yaml().unwrap();

        assert!(yaml.contains("kind: Template"));
        assert!(yaml.contains("${REDIS_IMAGE}"));
        assert!(template.parameter("APP_LABEL").is_some());
    }
}
