use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    manifest::GeneratorOptions,
    mutator::{SecretRefMutator, SecretResolver},
    transform::PodTemplateTransformer,
};

/// Configuration of the secret injecting transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretTransformerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_options: Option<GeneratorOptions>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub generate_secrets: bool,
}

impl SecretTransformerConfig {
    /// Reads the configuration from a KRM `functionConfig`. A missing
    /// config is the default configuration.
    pub fn from_function_config(config: Option<&serde_json::Value>) -> anyhow::Result<Self> {
        match config {
            Some(config) => Self::deserialize(config).context("invalid transformer configuration"),
            None => Ok(Self::default()),
        }
    }

    /// The options secrets are generated with, or `None` if values are
    /// substituted in place.
    pub fn effective_generator_options(&self) -> Option<GeneratorOptions> {
        if !self.generate_secrets {
            return None;
        }

        Some(self.generator_options.clone().unwrap_or_default())
    }

    pub fn transformer<R: SecretResolver>(
        &self,
        resolver: R,
    ) -> PodTemplateTransformer<SecretRefMutator<R>> {
        PodTemplateTransformer::new(SecretRefMutator::new(
            resolver,
            self.effective_generator_options(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn effective_options() {
        let options = GeneratorOptions {
            disable_name_suffix_hash: Some(true),
            ..Default::default()
        };

        for (generate_secrets, generator_options, expected) in [
            (false, None, None),
            (false, Some(options.clone()), None),
            (true, None, Some(GeneratorOptions::default())),
            (true, Some(options.clone()), Some(options.clone())),
        ] {
            let config = SecretTransformerConfig {
                generator_options,
                generate_secrets,
            };
            assert_eq!(config.effective_generator_options(), expected, "{config:?}");
        }
    }

    #[test]
    fn reads_function_config() -> anyhow::Result<()> {
        let config = SecretTransformerConfig::from_function_config(Some(&json!({
            "apiVersion": "konjure.dev/v1",
            "kind": "SecretTransformer",
            "metadata": { "name": "berglas" },
            "generateSecrets": true,
            "generatorOptions": { "labels": { "team": "payments" } },
        })))?;
        assert!(config.generate_secrets);
        let options = config.effective_generator_options().unwrap();
        assert_eq!(options.labels.get("team").map(|v| v.as_str()), Some("payments"));

        assert_eq!(
            SecretTransformerConfig::from_function_config(None)?,
            SecretTransformerConfig::default()
        );
        Ok(())
    }

    #[test]
    fn transformer_uses_effective_options() {
        let config = SecretTransformerConfig {
            generator_options: Some(GeneratorOptions {
                immutable: true,
                ..Default::default()
            }),
            generate_secrets: false,
        };
        let resolver = crate::StaticResolver::default();
        assert!(config.transformer(&resolver).mutator().options().is_none());

        let config = SecretTransformerConfig {
            generate_secrets: true,
            ..config
        };
        let transformer = config.transformer(&resolver);
        assert!(transformer.mutator().options().is_some_and(|options| options.immutable));
    }

    #[test]
    fn rejects_malformed_config() {
        let err = SecretTransformerConfig::from_function_config(Some(&json!({
            "generateSecrets": "yes",
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid transformer configuration");
    }
}
