use crate::{
    error::FlushError,
    mutator::MutationResult,
    resmap::ResourceMap,
    resource::{ResId, Resource},
};

/// Generated resources waiting to be merged into the collection.
#[derive(Debug, Default)]
pub struct SecretSink {
    pending: Vec<(ResId, Resource)>,
}

impl SecretSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the artifacts of a mutation of the resource `origin`.
    pub fn extend(&mut self, origin: &ResId, result: MutationResult) {
        self.pending.extend(
            result
                .artifacts
                .into_iter()
                .map(|artifact| (origin.clone(), artifact)),
        );
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Moves every pending artifact into `resources` and returns how many were new.
    ///
    /// An artifact identical to a resource already in the collection is
    /// dropped. A different resource under the same id is a conflict; the
    /// conflicting artifact and those after it are discarded.
    pub fn flush(&mut self, resources: &mut ResourceMap) -> Result<usize, FlushError> {
        let mut added = 0;

        for (origin, artifact) in self.pending.drain(..) {
            match resources.get(artifact.id()) {
                Some(existing) if existing == &artifact => {
                    tracing::trace!(secret = %artifact.id(), "generated secret already present");
                }
                Some(_) => {
                    return Err(FlushError {
                        secret: artifact.id().clone(),
                        source_id: origin,
                    });
                }
                None => {
                    tracing::debug!(secret = %artifact.id(), origin = %origin, "adding generated secret");
                    resources
                        .insert(artifact)
                        .map_err(|conflict| FlushError {
                            secret: conflict.resource.id().clone(),
                            source_id: origin,
                        })?;
                    added += 1;
                }
            }
        }

        Ok(added)
    }
}
