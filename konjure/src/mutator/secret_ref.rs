use anyhow::{Context, bail};
use compact_str::format_compact;
use indexmap::IndexMap;
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, PodTemplateSpec, SecretKeySelector,
};
use serde::{Deserialize, Serialize};

use crate::{
    generator::SecretGenerator,
    manifest::{GeneratorOptions, KeyValuePair, Str},
    resource::Resource,
};

use super::Mutator;

/// Env values starting with this prefix are secret references,
/// `berglas://<bucket>/<object>[#generation]`.
pub const REFERENCE_PREFIX: &str = "berglas://";

pub trait SecretResolver {
    fn resolve(&self, reference: &str) -> anyhow::Result<String>;
}

impl<R: SecretResolver + ?Sized> SecretResolver for &R {
    fn resolve(&self, reference: &str) -> anyhow::Result<String> {
        (**self).resolve(reference)
    }
}

/// Resolves references from a fixed table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StaticResolver(IndexMap<Str, Str>);

impl<K: Into<Str>, V: Into<Str>> FromIterator<(K, V)> for StaticResolver {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl SecretResolver for StaticResolver {
    fn resolve(&self, reference: &str) -> anyhow::Result<String> {
        match self.0.get(reference) {
            Some(value) => Ok(value.to_string()),
            None => bail!("no value for secret reference `{reference}`"),
        }
    }
}

/// Replaces secret references in container environments.
///
/// Without generator options the resolved value is substituted in place.
/// With them, each value is moved into a generated `Secret` and the env var
/// is rewritten to a `secretKeyRef`.
pub struct SecretRefMutator<R> {
    resolver: R,
    options: Option<GeneratorOptions>,
}

impl<R: SecretResolver> SecretRefMutator<R> {
    pub fn new(resolver: R, options: Option<GeneratorOptions>) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> Option<&GeneratorOptions> {
        self.options.as_ref()
    }

    fn mutate_env(
        &self,
        container: &str,
        env: &mut EnvVar,
        artifacts: &mut Vec<Resource>,
    ) -> anyhow::Result<bool> {
        let Some(reference) = env
            .value
            .as_deref()
            .filter(|value| value.starts_with(REFERENCE_PREFIX))
        else {
            return Ok(false);
        };

        let value = self.resolver.resolve(reference).with_context(|| {
            format!("failed to resolve `{}` of container `{container}`", env.name)
        })?;

        let Some(options) = &self.options else {
            env.value = Some(value);
            return Ok(true);
        };

        let secret = SecretGenerator::new(options)
            .generate(
                secret_name(container, &env.name),
                [KeyValuePair {
                    key: env.name.as_str().into(),
                    value: value.into(),
                }],
            )
            .with_context(|| {
                format!("failed to generate secret for `{}` of container `{container}`", env.name)
            })?;

        env.value = None;
        env.value_from = Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret.name().to_string()),
                key: env.name.clone(),
                optional: None,
            }),
            ..Default::default()
        });
        artifacts.push(secret);

        Ok(true)
    }

    fn mutate_container(
        &self,
        container: &mut Container,
        artifacts: &mut Vec<Resource>,
    ) -> anyhow::Result<bool> {
        let mut changed = false;
        for env in container.env.iter_mut().flatten() {
            changed |= self.mutate_env(&container.name, env, artifacts)?;
        }
        Ok(changed)
    }
}

impl<R: SecretResolver> Mutator for SecretRefMutator<R> {
    fn mutate(
        &mut self,
        template: &mut PodTemplateSpec,
        artifacts: &mut Vec<Resource>,
    ) -> anyhow::Result<bool> {
        let Some(spec) = template.spec.as_mut() else {
            return Ok(false);
        };

        let mut changed = false;
        for container in spec
            .init_containers
            .iter_mut()
            .flatten()
            .chain(spec.containers.iter_mut())
        {
            changed |= self.mutate_container(container, artifacts)?;
        }

        Ok(changed)
    }
}

/// `<container>-<env>` as a DNS-1123 subdomain.
fn secret_name(container: &str, env: &str) -> Str {
    let name = format_compact!("{container}-{env}").to_lowercase();
    let name = name
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '-',
        })
        .collect::<Str>();
    name.trim_matches(|c| c == '-' || c == '.').into()
}
