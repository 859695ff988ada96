use chrono::NaiveDate;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::path::Path;

use super::types::{Template, MINIMUM_TEMPLATE_VERSION};

/// Template loading errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Template has no heat_template_version")]
    MissingVersion,
    #[error("Unsupported template version: {0}")]
    UnsupportedVersion(String),
}

/// Accept date versions on or after the minimum supported one
pub fn check_version(version: &str) -> std::result::Result<(), TemplateError> {
    let minimum = NaiveDate::parse_from_str(MINIMUM_TEMPLATE_VERSION, "%Y-%m-%d")
        .map_err(|_| TemplateError::UnsupportedVersion(MINIMUM_TEMPLATE_VERSION.to_string()))?;

    match NaiveDate::parse_from_str(version.trim(), "%Y-%m-%d") {
        Ok(date) if date >= minimum => Ok(()),
        _ => Err(TemplateError::UnsupportedVersion(version.to_string())),
    }
}

/// Parse template text and check its version
pub fn parse_template(input: &str) -> std::result::Result<Template, TemplateError> {
    let template: Template = serde_yaml::from_str(input)?;

    let version = template.version().ok_or(TemplateError::MissingVersion)?;
    check_version(&version)?;

    if template.description.is_none() {
        debug!("No description found.");
    }
    if template.parameter_groups.is_none() {
        debug!("No parameter_groups found.");
    }
    if template.parameters.is_none() {
        debug!("No parameters found.");
    }
    if template.resources.is_none() {
        debug!("No resources found.");
    }
    if template.outputs.is_none() {
        debug!("No outputs found.");
    }

    Ok(template)
}

/// Load and parse a template from a YAML file
pub fn load_template(template_path: &Path) -> Result<Template> {
    info!("Loading template from: {:?}", template_path);

    let content = std::fs::read_to_string(template_path)
        .wrap_err_with(|| format!("Failed to read template '{}'", template_path.display()))?;

    let template = parse_template(&content)
        .wrap_err_with(|| format!("Invalid template '{}'", template_path.display()))?;

    info!(
        "Template version {} with {} resources",
        template.version().unwrap_or_default(),
        template.resources.as_ref().map_or(0, |r| r.len())
    );

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_check_version() {
        assert!(check_version("2015-04-30").is_ok());
        assert!(check_version("2018-08-31").is_ok());
        assert!(check_version("2013-05-23").is_err());
        assert!(check_version("newton").is_err());
        assert!(check_version("").is_err());
    }

    #[test]
    fn test_parse_template() {
        let yaml = r#"
heat_template_version: 2015-04-30
description: Simple network
resources:
  net:
    type: OS::Neutron::Net
    properties:
      name: net
"#;
        let template = parse_template(yaml).unwrap();
        assert_eq!(template.description.as_deref(), Some("Simple network"));
        assert_eq!(template.declarations().len(), 1);
    }

    #[test]
    fn test_parse_template_errors() {
        assert!(matches!(
            parse_template("description: no version\n"),
            Err(TemplateError::MissingVersion)
        ));
        assert!(matches!(
            parse_template("heat_template_version: 2013-05-23\n"),
            Err(TemplateError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_template("heat_template_version: [\n"),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn test_template_without_resources() {
        let template = parse_template("heat_template_version: 2016-10-14\n").unwrap();
        assert!(template.declarations().is_empty());
    }

    #[test]
    fn test_load_template() {
        let yaml = r#"
heat_template_version: 2015-04-30
resources:
  router:
    type: OS::Neutron::Router
    properties:
      name: router
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let template = load_template(temp_file.path()).unwrap();
        assert_eq!(template.declarations()[0].resource_type, "OS::Neutron::Router");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_template(Path::new("/nonexistent/template.yaml")).is_err());
    }
}
