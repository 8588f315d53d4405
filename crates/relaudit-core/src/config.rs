//! ci-operator configuration document.
//!
//! Only `tests` and `zz_generated_metadata` are modelled in detail; the rest
//! of the document is kept as opaque YAML. Every level denies unknown keys so
//! that a typo or schema drift fails the parse instead of silently dropping
//! data.
//!
//! The accepted key set follows the ci-tools `api` package of the 4.8 era
//! (`ReleaseBuildConfiguration`, `TestStepConfiguration`, `Metadata`),
//! including the legacy `openshift_ansible*` and `openshift_installer*`
//! test templates.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Identity block generated into every ci-operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigMetadata {
    pub org: String,
    pub repo: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// One entry of the `tests` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestStepConfiguration {
    /// Test name, unique within a document.
    #[serde(rename = "as")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_steps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_ansible: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_ansible_src: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_ansible_custom: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_installer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_installer_upi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_installer_upi_src: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_installer_src: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_installer_custom_test_image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_claim: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_controller: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postsubmit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if_only_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_run_if_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_skip_if_only_changed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict_network_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_config: Option<Value>,
}

/// Top-level ci-operator configuration for one repository and branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseBuildConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zz_generated_metadata: Option<ConfigMetadata>,

    #[serde(default)]
    pub tests: Vec<TestStepConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_images: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rpm_images: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_root: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_build_commands: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_binary_build_commands: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_build_commands: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_build_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_go_repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_steps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_specification: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_images: Option<Value>,
}

impl ReleaseBuildConfiguration {
    /// Strictly parse a YAML document.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// Names of all declared tests, in document order.
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
base_images:
  base:
    name: "4.8"
    namespace: ocp
    tag: base
build_root:
  image_stream_tag:
    name: release
    namespace: openshift
    tag: golang-1.16
images:
- from: base
  to: cli
resources:
  '*':
    requests:
      cpu: 100m
tests:
- as: unit
  commands: make test
  container:
    from: src
- as: e2e-aws
  steps:
    cluster_profile: aws
    workflow: openshift-e2e-aws
- as: e2e-aws-upgrade
  optional: true
  steps:
    workflow: openshift-upgrade-aws
zz_generated_metadata:
  branch: master
  org: openshift
  repo: oc
"#;

    #[test]
    fn test_parse_tests_and_metadata() {
        let config = ReleaseBuildConfiguration::from_yaml(CONFIG.as_bytes()).expect("parse failed");
        let names: Vec<&str> = config.test_names().collect();
        assert_eq!(names, vec!["unit", "e2e-aws", "e2e-aws-upgrade"]);
        assert_eq!(config.tests[2].optional, Some(true));

        let meta = config.zz_generated_metadata.expect("metadata missing");
        assert_eq!(meta.org, "openshift");
        assert_eq!(meta.repo, "oc");
        assert_eq!(meta.branch, "master");
        assert!(meta.variant.is_none());
    }

    #[test]
    fn test_legacy_test_templates_are_accepted() {
        let yaml = br#"
tests:
- as: e2e-vsphere-upi
  artifact_dir: /tmp/artifacts
  openshift_installer_upi:
    cluster_profile: vsphere
- as: e2e-aws-upi-src
  openshift_installer_upi_src:
    cluster_profile: aws
- as: e2e-ansible
  openshift_ansible:
    cluster_profile: gcp
- as: e2e-ansible-src
  openshift_ansible_src:
    cluster_profile: gcp
- as: e2e-ansible-custom
  openshift_ansible_custom:
    cluster_profile: gcp
"#;
        let config = ReleaseBuildConfiguration::from_yaml(yaml).expect("parse failed");
        assert_eq!(config.tests.len(), 5);
        assert_eq!(config.tests[0].artifact_dir.as_deref(), Some("/tmp/artifacts"));
        assert!(config.tests[1].openshift_installer_upi_src.is_some());
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let err = ReleaseBuildConfiguration::from_yaml(b"tests: []\nnot_a_field: 1\n").unwrap_err();
        assert!(err.to_string().contains("not_a_field"));
    }

    #[test]
    fn test_unknown_test_key_is_rejected() {
        let yaml = b"tests:\n- as: e2e-aws\n  workflow: typo\n";
        let err = ReleaseBuildConfiguration::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("workflow"));
    }

    #[test]
    fn test_test_without_name_is_rejected() {
        let yaml = b"tests:\n- commands: make test\n";
        assert!(ReleaseBuildConfiguration::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_document_without_tests_has_none() {
        let config = ReleaseBuildConfiguration::from_yaml(b"images: []\n").expect("parse failed");
        assert_eq!(config.test_names().count(), 0);
    }
}
