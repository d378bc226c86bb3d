use anyhow::bail;
use serde_json::Value;

use crate::{
    manifest::{GeneratorOptions, KeyValuePair, SecretType, Str},
    resource::{Gvk, Metadata, Object, ResId, Resource},
};

/// Builds `v1/Secret` resources from literal key/value pairs, applying the
/// given generator options.
pub struct SecretGenerator<'a> {
    options: &'a GeneratorOptions,
}

impl<'a> SecretGenerator<'a> {
    pub fn new(options: &'a GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn generate(
        &self,
        name: impl Into<Str>,
        literals: impl IntoIterator<Item = KeyValuePair>,
    ) -> anyhow::Result<Resource> {
        let GeneratorOptions {
            labels,
            annotations,
            immutable,
            ..
        } = self.options;

        let name = name.into();
        let mut data = Object::new();
        for KeyValuePair { key, value } in literals {
            let encoded =
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, value.as_bytes());
            if data.insert(key.to_string(), Value::String(encoded)).is_some() {
                bail!("duplicate key `{key}` in Secret `{name}`");
            }
        }

        let mut root = Object::from_iter([("data".into(), Value::Object(data))]);
        if *immutable {
            root.insert("immutable".into(), Value::Bool(true));
        }
        root.insert(
            "type".into(),
            Value::String(SecretType::Opaque.to_string()),
        );

        let secret = Resource::new(
            ResId {
                gvk: Gvk::new("", "v1", "Secret"),
                name: name.clone(),
                namespace: None,
            },
            Metadata {
                name,
                labels: labels.clone(),
                annotations: annotations.clone(),
                ..Default::default()
            },
            root,
        )?;

        if self.options.suffix_hash() {
            secret.with_name_suffix_hash()
        } else {
            Ok(secret)
        }
    }
}
