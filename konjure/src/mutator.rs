mod secret_ref;

pub use self::secret_ref::{REFERENCE_PREFIX, SecretRefMutator, SecretResolver, StaticResolver};

use anyhow::anyhow;
use k8s_openapi::api::core::v1::PodTemplateSpec;

use crate::{
    error::MutationError,
    resource::{ResId, Resource},
};

/// Edits a pod template in place.
///
/// Returns whether the template changed. Resources the edit depends on
/// (generated secrets) are pushed to `artifacts`; they are merged into the
/// collection by the caller.
pub trait Mutator {
    fn mutate(
        &mut self,
        template: &mut PodTemplateSpec,
        artifacts: &mut Vec<Resource>,
    ) -> anyhow::Result<bool>;
}

impl<F> Mutator for F
where
    F: FnMut(&mut PodTemplateSpec, &mut Vec<Resource>) -> anyhow::Result<bool>,
{
    fn mutate(
        &mut self,
        template: &mut PodTemplateSpec,
        artifacts: &mut Vec<Resource>,
    ) -> anyhow::Result<bool> {
        self(template, artifacts)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub changed: bool,
    pub artifacts: Vec<Resource>,
}

/// Runs `mutator` over the pod template of the resource `id`.
pub fn mutate<M>(
    mutator: &mut M,
    id: &ResId,
    template: &mut PodTemplateSpec,
) -> Result<MutationResult, MutationError>
where
    M: Mutator + ?Sized,
{
    let error = |source| MutationError {
        id: id.clone(),
        source,
    };

    let mut artifacts = vec![];
    let changed = mutator.mutate(template, &mut artifacts).map_err(error)?;
    if !changed && !artifacts.is_empty() {
        return Err(error(anyhow!(
            "mutator produced {} artifact(s) without changing the pod template",
            artifacts.len()
        )));
    }

    Ok(MutationResult { changed, artifacts })
}
