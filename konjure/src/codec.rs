//! Conversion between untyped resources and their typed shapes.
//!
//! Typed decoding is lossy: fields a shape does not model are dropped, and
//! values are normalized (empty collections may appear or disappear).
//! Encoding therefore reconciles three documents, the original raw form,
//! the typed baseline taken right after decoding, and the typed encoding
//! after mutation, so that only what the mutation actually changed differs
//! from the original.

use k8s_openapi::api::core::v1::PodTemplateSpec;
use serde_json::Value;

use crate::{
    error::{DecodeError, EncodeError},
    resource::{Gvk, Object, ResId, Resource},
    schema::{Shape, TypedObject},
};

pub struct TypedView {
    id: ResId,
    object: Box<dyn TypedObject>,
    raw: Value,
    baseline: Value,
}

impl TypedView {
    pub fn decode(resource: &Resource, shape: &dyn Shape) -> Result<Self, DecodeError> {
        let id = resource.id().clone();
        let error = |gvk: Gvk, source| DecodeError {
            id: id.clone(),
            gvk,
            source,
        };

        let raw = resource.to_json().map_err(|err| error(shape.gvk(), err))?;
        let mut input = raw.clone();
        quantities_as_strings(&mut input);
        let object = shape
            .decode(input)
            .map_err(|err| error(shape.gvk(), err))?;
        let baseline = object.to_json().map_err(|err| error(shape.gvk(), err))?;

        Ok(Self {
            id,
            object,
            raw,
            baseline,
        })
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
        self.object.pod_template_mut()
    }

    /// The raw document with the changes made through this view applied.
    pub fn encode(&self) -> Result<Value, EncodeError> {
        let mutated = self.object.to_json().map_err(|source| EncodeError::Json {
            id: self.id.clone(),
            source,
        })?;
        Ok(reconcile(&self.raw, &self.baseline, &mutated))
    }

    /// Encodes the view and parses it back into a resource with the same identity.
    pub fn into_resource(self) -> Result<Resource, EncodeError> {
        let value = self.encode()?;
        let resource = Resource::from_json(value).map_err(|source| EncodeError::Json {
            id: self.id.clone(),
            source,
        })?;

        if resource.id() != &self.id {
            return Err(EncodeError::IdentityChanged {
                id: self.id,
                new: resource.id().clone(),
            });
        }

        Ok(resource)
    }
}

/// Map fields whose values are resource quantities.
const QUANTITY_MAPS: &[&str] = &["limits", "requests", "overhead"];

/// Quantities may be written as plain numbers (`cpu: 1`), but their typed
/// form only accepts strings.
fn quantities_as_strings(value: &mut Value) {
    match value {
        Value::Object(object) => {
            for (key, value) in object.iter_mut() {
                match (key.as_str(), value) {
                    (key, Value::Object(quantities)) if QUANTITY_MAPS.contains(&key) => {
                        quantities.values_mut().for_each(stringify_number);
                    }
                    ("sizeLimit", value) => stringify_number(value),
                    (_, value) => quantities_as_strings(value),
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(quantities_as_strings),
        _ => {}
    }
}

fn stringify_number(value: &mut Value) {
    if let Value::Number(number) = value {
        let number = number.to_string();
        *value = Value::String(number);
    }
}

fn reconcile(raw: &Value, baseline: &Value, mutated: &Value) -> Value {
    if baseline == mutated {
        return raw.clone();
    }

    match (raw, baseline, mutated) {
        (Value::Object(raw), Value::Object(baseline), Value::Object(mutated)) => {
            Value::Object(reconcile_object(raw, baseline, mutated))
        }
        (Value::Array(raw), Value::Array(baseline), Value::Array(mutated))
            if raw.len() == baseline.len() =>
        {
            Value::Array(reconcile_array(raw, baseline, mutated))
        }
        _ => mutated.clone(),
    }
}

/// Elements with a `name` (containers, env vars, volumes) are matched by name,
/// others by position. Elements the mutation added are taken as is.
fn reconcile_array(raw: &[Value], baseline: &[Value], mutated: &[Value]) -> Vec<Value> {
    mutated
        .iter()
        .enumerate()
        .map(|(index, mutated)| {
            let original = match element_name(mutated) {
                Some(name) => baseline
                    .iter()
                    .position(|baseline| element_name(baseline) == Some(name)),
                None => Some(index),
            };
            match original.and_then(|index| raw.get(index).zip(baseline.get(index))) {
                Some((raw, baseline)) => reconcile(raw, baseline, mutated),
                None => mutated.clone(),
            }
        })
        .collect()
}

fn element_name(value: &Value) -> Option<&str> {
    value.get("name")?.as_str()
}

fn reconcile_object(raw: &Object, baseline: &Object, mutated: &Object) -> Object {
    let mut out = Object::new();

    for (key, raw_value) in raw {
        match (baseline.get(key), mutated.get(key)) {
            // Not understood by the typed shape, unless the mutation produced it.
            (None, Some(value)) => {
                out.insert(key.clone(), value.clone());
            }
            (None, None) => {
                out.insert(key.clone(), raw_value.clone());
            }
            (Some(baseline), Some(mutated)) => {
                out.insert(key.clone(), reconcile(raw_value, baseline, mutated));
            }
            // Removed by the mutation.
            (Some(_), None) => {}
        }
    }

    for (key, value) in mutated {
        if raw.contains_key(key) || baseline.get(key) == Some(value) {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }

    out
}
