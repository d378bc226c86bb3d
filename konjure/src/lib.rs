pub mod codec;
pub mod config;
pub mod edit;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod mutator;
pub mod reslist;
pub mod resmap;
pub mod resource;
pub mod schema;
pub mod sink;
pub mod transform;

use anyhow::Context;

pub use self::config::SecretTransformerConfig;
pub use self::error::TransformError;
pub use self::mutator::{Mutator, SecretRefMutator, SecretResolver, StaticResolver};
pub use self::reslist::ResourceList;
pub use self::resmap::ResourceMap;
pub use self::resource::{Gvk, ResId, Resource};
pub use self::transform::{PodTemplateTransformer, Transformer};

/// Runs the secret transformer over a KRM `ResourceList`, configured by its
/// `functionConfig`.
pub fn transform<R: SecretResolver>(list: ResourceList, resolver: R) -> anyhow::Result<ResourceMap> {
    let config = SecretTransformerConfig::from_function_config(list.function_config())?;
    let mut resources =
        ResourceMap::from_resources(list).context("duplicate resource in input")?;
    config.transformer(resolver).transform(&mut resources)?;
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn deployment() -> Resource {
        serde_yaml::from_str(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector: {}
  template:
    spec:
      containers:
      - name: app
        env:
        - name: TOKEN
          value: berglas://bucket/token
"#,
        )
        .unwrap()
    }

    fn resolver() -> StaticResolver {
        StaticResolver::from_iter([("berglas://bucket/token", "t0k3n")])
    }

    #[test]
    fn transforms_resource_list() -> anyhow::Result<()> {
        let list = ResourceList::new([deployment()]).with_function_config(json!({
            "generateSecrets": true,
            "generatorOptions": { "disableNameSuffixHash": true },
        }));

        let resources = transform(list, resolver())?;
        let out = ResourceList::from(resources);
        let names = out.items().iter().map(|r| r.id().to_string()).collect::<Vec<_>>();
        assert_eq!(names, ["Deployment.v1.apps/web", "Secret.v1/app-token"]);

        let yaml = serde_yaml::to_string(&out)?;
        assert!(yaml.starts_with("apiVersion: config.kubernetes.io/v1\nkind: ResourceList\nitems:\n"), "{yaml}");
        Ok(())
    }

    #[test]
    fn rejects_duplicate_input_resources() {
        let list = ResourceList::new([deployment(), deployment()]);
        let err = transform(list, resolver()).unwrap_err();
        assert_eq!(err.to_string(), "duplicate resource in input");
    }

    #[test]
    fn transform_errors_can_be_recovered() {
        let list = ResourceList::new([deployment()]);
        let err = transform(list, StaticResolver::default()).unwrap_err();
        let err = err.downcast_ref::<TransformError>().expect("transform error");
        assert_eq!(err.id().to_string(), "Deployment.v1.apps/web");
    }
}
