use crate::resource::{Gvk, ResId};

/// A hard failure of a transform pass. Unknown kinds and resources without
/// a pod template are not errors, they are skipped.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Flush(#[from] FlushError),
}

impl TransformError {
    /// The resource that was being processed when the pass failed.
    pub fn id(&self) -> &ResId {
        match self {
            TransformError::Decode(err) => &err.id,
            TransformError::Encode(EncodeError::Json { id, .. })
            | TransformError::Encode(EncodeError::IdentityChanged { id, .. }) => id,
            TransformError::Mutation(err) => &err.id,
            TransformError::Flush(err) => &err.source_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("resource `{id}` does not conform to the schema of {gvk}")]
pub struct DecodeError {
    pub id: ResId,
    pub gvk: Gvk,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode mutated resource `{id}`")]
    Json {
        id: ResId,
        #[source]
        source: serde_json::Error,
    },
    #[error("mutation changed the identity of resource `{id}` to `{new}`")]
    IdentityChanged { id: ResId, new: ResId },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to mutate the pod template of resource `{id}`")]
pub struct MutationError {
    pub id: ResId,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, thiserror::Error)]
#[error("generated secret `{secret}` conflicts with an existing resource (generated for `{source_id}`)")]
pub struct FlushError {
    pub secret: ResId,
    pub source_id: ResId,
}
