//! Convergence settings.
//!
//! `ConvergeOptions` deserializes from the caller's configuration, e.g.
//!
//! ```json
//! { "topology": "multi-org", "organization": "foo", "fail_fast": false }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AclError;
use crate::namespace::{Topology, is_valid_name};
use crate::resolver::PathResolver;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvergeOptions {
    pub topology: Topology,
    /// Organization that relative paths refer to on a multi-org server.
    pub organization: Option<String>,
    /// Stop at the first failing target instead of reporting all of them.
    pub fail_fast: bool,
    /// Compute and report changes without writing them.
    pub dry_run: bool,
}

impl ConvergeOptions {
    pub fn new(topology: Topology) -> Self {
        ConvergeOptions {
            topology,
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn from_json(text: &str) -> Result<Self, AclError> {
        let options: ConvergeOptions = serde_json::from_str(text)
            .map_err(|e| AclError::InvalidConfig(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), AclError> {
        match (&self.organization, self.topology) {
            (Some(org), _) if !is_valid_name(org) => Err(AclError::InvalidConfig(format!(
                "invalid organization name '{org}'"
            ))),
            (Some(org), Topology::SingleOrg) => Err(AclError::InvalidConfig(format!(
                "organization '{org}' given for a single-org server"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn resolver(&self) -> PathResolver {
        let resolver = PathResolver::new(self.topology);
        match &self.organization {
            Some(org) => resolver.with_current_organization(org.clone()),
            None => resolver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[test]
    fn test_defaults() {
        let options = ConvergeOptions::from_json("{}").unwrap();
        assert_eq!(options.topology, Topology::MultiOrg);
        assert!(options.organization.is_none());
        assert!(!options.fail_fast);
        assert!(!options.dry_run);
    }

    #[test]
    fn test_from_json() {
        let options = ConvergeOptions::from_json(
            r#"{"topology": "multi-org", "organization": "foo", "dry_run": true}"#,
        )
        .unwrap();
        assert_eq!(
            options,
            ConvergeOptions::new(Topology::MultiOrg)
                .with_organization("foo")
                .with_dry_run(true)
        );
        assert_eq!(options.resolver().current_organization(), Some("foo"));
    }

    #[parameterized(
        bad_org_name = { r#"{"organization": "foo bar"}"# },
        org_on_single_org = { r#"{"topology": "single-org", "organization": "foo"}"# },
        unknown_topology = { r#"{"topology": "federated"}"# },
        unknown_field = { r#"{"retries": 3}"# },
    )]
    fn test_invalid_config(text: &str) {
        assert!(matches!(
            ConvergeOptions::from_json(text),
            Err(AclError::InvalidConfig(_))
        ));
    }
}
