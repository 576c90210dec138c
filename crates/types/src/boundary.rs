//! Credential access boundary: the policy a downscoped token is bounded by.
//!
//! The types serialize to the exact wire shape the security token service
//! expects in the `options` form field:
//!
//! ```json
//! {"accessBoundary": {"accessBoundaryRules": [
//!   {"availableResource": "//storage.googleapis.com/projects/_/buckets/b",
//!    "availablePermissions": ["inRole:roles/storage.objectViewer"],
//!    "availabilityCondition": {"title": "...", "expression": "..."}}
//! ]}}
//! ```

use crate::{DownscopeError, traits::Result};
use serde::{Deserialize, Serialize};

/// An expression restricting when a rule applies (e.g. an object-name prefix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub expression: String,
}

impl AvailabilityCondition {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            title: None,
            expression: expression.into(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// One resource together with the permissions available on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessBoundaryRule {
    /// Fully-qualified resource name, e.g.
    /// `//storage.googleapis.com/projects/_/buckets/my-bucket`.
    pub available_resource: String,
    /// Permission identifiers such as `inRole:roles/storage.objectViewer`.
    /// Order is preserved on the wire.
    #[serde(default)]
    pub available_permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_condition: Option<AvailabilityCondition>,
}

impl AccessBoundaryRule {
    /// Create a rule for `resource` with no permissions yet.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            available_resource: resource.into(),
            available_permissions: Vec::new(),
            availability_condition: None,
        }
    }

    /// Append a permission to the rule.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.available_permissions.push(permission.into());
        self
    }

    /// Restrict the rule with an availability condition.
    #[must_use]
    pub fn with_condition(mut self, condition: AvailabilityCondition) -> Self {
        self.availability_condition = Some(condition);
        self
    }

    fn validate(&self, index: usize) -> Result<()> {
        if self.available_resource.is_empty() {
            return Err(DownscopeError::InvalidPolicy(format!(
                "rule {index}: availableResource must not be empty"
            )));
        }
        if self.available_permissions.is_empty() {
            return Err(DownscopeError::InvalidPolicy(format!(
                "rule {index} ({}): availablePermissions must not be empty",
                self.available_resource
            )));
        }
        Ok(())
    }
}

/// The ordered list of rules bounding a token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessBoundary {
    #[serde(default)]
    pub access_boundary_rules: Vec<AccessBoundaryRule>,
}

impl AccessBoundary {
    #[must_use]
    pub fn new(rules: Vec<AccessBoundaryRule>) -> Self {
        Self {
            access_boundary_rules: rules,
        }
    }

    /// Check that the boundary has at least one rule and that every rule names
    /// a resource and at least one permission.
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::InvalidPolicy`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.access_boundary_rules.is_empty() {
            return Err(DownscopeError::InvalidPolicy(
                "accessBoundaryRules must contain at least one rule".into(),
            ));
        }
        self.access_boundary_rules
            .iter()
            .enumerate()
            .try_for_each(|(i, rule)| rule.validate(i))
    }
}

/// The payload sent as the `options` field of a token-exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownscopedOptions {
    pub access_boundary: AccessBoundary,
}

impl DownscopedOptions {
    #[must_use]
    pub fn new(access_boundary: AccessBoundary) -> Self {
        Self { access_boundary }
    }

    /// Validate the wrapped [`AccessBoundary`].
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::InvalidPolicy`] if the boundary is invalid.
    pub fn validate(&self) -> Result<()> {
        self.access_boundary.validate()
    }

    /// Validate, then render the canonical JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DownscopeError::InvalidPolicy`] if validation fails; nothing
    /// is rendered for an invalid policy.
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

impl From<AccessBoundary> for DownscopedOptions {
    fn from(access_boundary: AccessBoundary) -> Self {
        Self::new(access_boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const BUCKET: &str = "//storage.googleapis.com/projects/_/buckets/bucket-a";
    const VIEWER: &str = "inRole:roles/storage.objectViewer";

    fn viewer_rule() -> AccessBoundaryRule {
        AccessBoundaryRule::new(BUCKET).with_permission(VIEWER)
    }

    #[test]
    fn test_validate_ok() {
        let opts = DownscopedOptions::new(AccessBoundary::new(vec![viewer_rule()]));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_rules() {
        let err = AccessBoundary::default().validate().unwrap_err();
        assert!(matches!(err, DownscopeError::InvalidPolicy(_)));
    }

    #[test]
    fn test_validate_empty_resource() {
        let rule = AccessBoundaryRule::new("").with_permission(VIEWER);
        let err = AccessBoundary::new(vec![rule]).validate().unwrap_err();
        assert!(err.to_string().contains("availableResource"));
    }

    #[test]
    fn test_validate_no_permissions() {
        let boundary = AccessBoundary::new(vec![viewer_rule(), AccessBoundaryRule::new(BUCKET)]);
        let err = boundary.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("rule 1"), "unexpected message: {msg}");
        assert!(msg.contains("availablePermissions"));
    }

    #[test]
    fn test_to_json_shape() {
        let opts = DownscopedOptions::new(AccessBoundary::new(vec![viewer_rule()]));
        let v: Value = serde_json::from_str(&opts.to_json().unwrap()).unwrap();
        assert_eq!(
            v,
            json!({
                "accessBoundary": {
                    "accessBoundaryRules": [{
                        "availableResource": BUCKET,
                        "availablePermissions": [VIEWER]
                    }]
                }
            })
        );
    }

    #[test]
    fn test_to_json_omits_absent_condition() {
        let opts = DownscopedOptions::new(AccessBoundary::new(vec![viewer_rule()]));
        let s = opts.to_json().unwrap();
        assert!(!s.contains("availabilityCondition"));
    }

    #[test]
    fn test_to_json_preserves_order_and_condition() {
        let perms = [
            "inRole:roles/storage.objectViewer",
            "inRole:roles/storage.objectCreator",
            "inRole:roles/storage.legacyBucketReader",
        ];
        let cond = AvailabilityCondition::new(
            "resource.name.startsWith('projects/_/buckets/bucket-a/objects/foo')",
        )
        .with_title("foo prefix");
        let first = perms
            .iter()
            .fold(AccessBoundaryRule::new(BUCKET), |r, p| r.with_permission(*p))
            .with_condition(cond.clone());
        let second = AccessBoundaryRule::new("//storage.googleapis.com/projects/_/buckets/b")
            .with_permission(VIEWER);
        let opts = DownscopedOptions::new(AccessBoundary::new(vec![first, second]));

        let back: DownscopedOptions = serde_json::from_str(&opts.to_json().unwrap()).unwrap();
        let rules = &back.access_boundary.access_boundary_rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].available_permissions, perms);
        assert_eq!(rules[0].availability_condition.as_ref(), Some(&cond));
        assert!(rules[1].availability_condition.is_none());
        assert_eq!(back, opts);
    }

    #[test]
    fn test_condition_without_title() {
        let cond = AvailabilityCondition::new("resource.name.startsWith('x')");
        let v = serde_json::to_value(&cond).unwrap();
        assert_eq!(v, json!({"expression": "resource.name.startsWith('x')"}));
    }

    #[test]
    fn test_to_json_rejects_invalid() {
        let opts = DownscopedOptions::default();
        assert!(matches!(
            opts.to_json().unwrap_err(),
            DownscopeError::InvalidPolicy(_)
        ));
    }

    #[test]
    fn test_deserialize_wire_document() {
        let doc = r#"{"accessBoundary":{"accessBoundaryRules":[
            {"availableResource":"//cloudresourcemanager.googleapis.com/folders/123",
             "availablePermissions":["inRole:roles/resourcemanager.folderViewer"]}]}}"#;
        let opts: DownscopedOptions = serde_json::from_str(doc).unwrap();
        assert!(opts.validate().is_ok());
        assert_eq!(
            opts.access_boundary.access_boundary_rules[0].available_resource,
            "//cloudresourcemanager.googleapis.com/folders/123"
        );
    }
}
