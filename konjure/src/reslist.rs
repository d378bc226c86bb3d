use serde::{Deserialize, Serialize};

use crate::{
    manifest::{apiversion, kind},
    resmap::ResourceMap,
    resource::Resource,
};

/// The KRM function wire format: the resources to transform plus the
/// configuration of the function transforming them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_version: Option<apiversion::ConfigV1>,
    kind: kind::ResourceList,
    #[serde(default)]
    items: Box<[Resource]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_config: Option<serde_json::Value>,
}

impl ResourceList {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            api_version: Some(apiversion::ConfigV1),
            kind: kind::ResourceList,
            items: resources.into_iter().collect(),
            function_config: None,
        }
    }

    pub fn with_function_config(mut self, config: serde_json::Value) -> Self {
        self.function_config = Some(config);
        self
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn function_config(&self) -> Option<&serde_json::Value> {
        self.function_config.as_ref()
    }
}

impl From<ResourceMap> for ResourceList {
    fn from(resources: ResourceMap) -> Self {
        ResourceList::new(resources)
    }
}

impl IntoIterator for ResourceList {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_vec().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_and_function_config() -> anyhow::Result<()> {
        let list = serde_yaml::from_str::<ResourceList>(
            r#"
apiVersion: config.kubernetes.io/v1
kind: ResourceList
functionConfig:
  generateSecrets: true
items:
- apiVersion: v1
  kind: ConfigMap
  metadata:
    name: settings
"#,
        )?;

        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].name(), "settings");
        assert_eq!(
            list.function_config(),
            Some(&serde_json::json!({ "generateSecrets": true }))
        );
        Ok(())
    }

    #[test]
    fn rejects_other_kinds() {
        let err = serde_yaml::from_str::<ResourceList>("kind: List\nitems: []\n").unwrap_err();
        assert!(err.to_string().contains("expected `ResourceList`"), "{err}");
    }
}
