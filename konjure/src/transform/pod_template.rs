use crate::{
    codec::TypedView,
    error::TransformError,
    mutator::{self, Mutator},
    resmap::ResourceMap,
    schema::Schema,
    sink::SecretSink,
};

use super::Transformer;

/// What happened to a single resource during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No typed shape is registered for the kind.
    UnknownShape,
    /// The typed shape has no pod template, or it is unset.
    NoPodTemplate,
    Unchanged,
    Mutated { secrets: usize },
}

/// Applies a [`Mutator`] to the pod template of every resource that has one.
///
/// Resources are visited in collection order, each exactly once. Secrets
/// generated while mutating a resource are added to the collection before
/// the next resource is visited and are not visited themselves.
pub struct PodTemplateTransformer<M> {
    schema: Option<Schema>,
    mutator: M,
    sink: SecretSink,
}

impl<M: Mutator> PodTemplateTransformer<M> {
    pub fn new(mutator: M) -> Self {
        Self {
            schema: None,
            mutator,
            sink: SecretSink::new(),
        }
    }

    /// Uses `schema` instead of the builtin shapes.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    /// Runs a pass, returning the outcome for each resource present when it started.
    #[tracing::instrument(skip_all, name = "pod_template_transform", fields(resources = resources.len()))]
    pub fn run(&mut self, resources: &mut ResourceMap) -> Result<Vec<Outcome>, TransformError> {
        // resources appended by the sink are not visited
        let len = resources.len();
        let mut outcomes = Vec::with_capacity(len);

        for index in 0..len {
            let outcome = self.process(resources, index).inspect_err(|err| {
                tracing::debug!(resource = %err.id(), error = %err, "pod template transform failed");
            })?;

            if let Some(resource) = resources.get_index(index) {
                match outcome {
                    Outcome::UnknownShape => {
                        tracing::trace!(resource = %resource.id(), "skipping resource with unknown shape")
                    }
                    Outcome::NoPodTemplate | Outcome::Unchanged => {
                        tracing::trace!(resource = %resource.id(), ?outcome, "resource left untouched")
                    }
                    Outcome::Mutated { secrets } => {
                        tracing::debug!(resource = %resource.id(), secrets, "mutated pod template")
                    }
                }
            }

            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    fn process(
        &mut self,
        resources: &mut ResourceMap,
        index: usize,
    ) -> Result<Outcome, TransformError> {
        let schema = self.schema.as_ref().unwrap_or_else(|| Schema::load());

        let Some(resource) = resources.get_index(index) else {
            return Ok(Outcome::Unchanged);
        };

        let Some(shape) = schema.resolve(resource.gvk()) else {
            return Ok(Outcome::UnknownShape);
        };

        let mut view = TypedView::decode(resource, shape)?;
        let id = view.id().clone();

        let Some(template) = view.pod_template_mut() else {
            return Ok(Outcome::NoPodTemplate);
        };

        let result = mutator::mutate(&mut self.mutator, &id, template)?;
        let changed = result.changed;

        self.sink.extend(&id, result);
        let secrets = self.sink.flush(resources)?;

        if !changed {
            return Ok(Outcome::Unchanged);
        }

        let mutated = view.into_resource()?;
        if let Some(resource) = resources.get_index_mut(index) {
            *resource = mutated;
        }

        Ok(Outcome::Mutated { secrets })
    }
}

impl<M: Mutator> Transformer for PodTemplateTransformer<M> {
    fn transform(&mut self, resources: &mut ResourceMap) -> anyhow::Result<()> {
        self.run(resources)?;
        Ok(())
    }
}
