//! Typed shapes known to the transformer.
//!
//! A [`Shape`] decodes an untyped document into a concrete `k8s-openapi`
//! type. Whether that type carries a pod template is an explicit opt-in
//! through [`PodTemplateOwner`].

use std::{marker::PhantomData, sync::OnceLock};

use anyhow::bail;
use indexmap::IndexMap;
use k8s_openapi::api::{
    apps::v1 as apps,
    batch::v1 as batch,
    core::v1::{self as core, PodTemplateSpec},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::resource::Gvk;

/// Exposes the pod template of a typed resource, if it has one.
///
/// Kinds whose template lives at `spec.template` implement this through
/// `spec_template!`; every other kind keeps the default and is skipped.
pub trait PodTemplateOwner {
    fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
        None
    }
}

macro_rules! spec_template {
    (optional: $($ty:ty),* $(,)?) => {
        $(
            impl PodTemplateOwner for $ty {
                fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
                    self.spec.as_mut().and_then(|spec| spec.template.as_mut())
                }
            }
        )*
    };
    ($($ty:ty),* $(,)?) => {
        $(
            impl PodTemplateOwner for $ty {
                fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
                    self.spec.as_mut().map(|spec| &mut spec.template)
                }
            }
        )*
    };
}

spec_template!(apps::Deployment, apps::StatefulSet, apps::DaemonSet, batch::Job);
spec_template!(optional: apps::ReplicaSet, core::ReplicationController);

// `CronJob` nests its template under `spec.jobTemplate.spec` and `PodTemplate` has no `spec`.
impl PodTemplateOwner for batch::CronJob {}
impl PodTemplateOwner for core::PodTemplate {}
impl PodTemplateOwner for core::Pod {}
impl PodTemplateOwner for core::ConfigMap {}
impl PodTemplateOwner for core::Secret {}
impl PodTemplateOwner for core::Service {}
impl PodTemplateOwner for core::ServiceAccount {}

/// A decoded resource, erased over its concrete type.
pub trait TypedObject: Send {
    fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec>;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<K> TypedObject for K
where
    K: PodTemplateOwner + Serialize + Send,
{
    fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
        PodTemplateOwner::pod_template_mut(self)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

pub trait Shape: Send + Sync {
    fn gvk(&self) -> Gvk;

    fn decode(&self, raw: serde_json::Value) -> serde_json::Result<Box<dyn TypedObject>>;
}

pub struct TypedShape<K>(PhantomData<fn() -> K>);

impl<K> Default for TypedShape<K> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K> Shape for TypedShape<K>
where
    K: k8s_openapi::Resource + PodTemplateOwner + Serialize + DeserializeOwned + Send + 'static,
{
    fn gvk(&self) -> Gvk {
        Gvk::new(K::GROUP, K::VERSION, K::KIND)
    }

    fn decode(&self, raw: serde_json::Value) -> serde_json::Result<Box<dyn TypedObject>> {
        Ok(Box::new(serde_json::from_value::<K>(raw)?))
    }
}

/// Maps group/version/kind to the typed shape used to decode it.
pub struct Schema {
    shapes: IndexMap<Gvk, Box<dyn Shape>>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Schema {
    pub fn empty() -> Self {
        Self {
            shapes: IndexMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut schema = Self::empty();
        schema.add::<apps::Deployment>();
        schema.add::<apps::StatefulSet>();
        schema.add::<apps::DaemonSet>();
        schema.add::<apps::ReplicaSet>();
        schema.add::<batch::Job>();
        schema.add::<batch::CronJob>();
        schema.add::<core::ReplicationController>();
        schema.add::<core::Pod>();
        schema.add::<core::PodTemplate>();
        schema.add::<core::ConfigMap>();
        schema.add::<core::Secret>();
        schema.add::<core::Service>();
        schema.add::<core::ServiceAccount>();
        schema
    }

    /// A shared instance of [`Schema::builtin`].
    pub fn load() -> &'static Self {
        static INSTANCE: OnceLock<Schema> = OnceLock::new();
        INSTANCE.get_or_init(Schema::builtin)
    }

    fn add<K>(&mut self)
    where
        K: k8s_openapi::Resource + PodTemplateOwner + Serialize + DeserializeOwned + Send + 'static,
    {
        let shape = TypedShape::<K>::default();
        self.shapes.insert(shape.gvk(), Box::new(shape));
    }

    pub fn register(&mut self, shape: impl Shape + 'static) -> anyhow::Result<()> {
        let gvk = shape.gvk();
        if self.shapes.contains_key(&gvk) {
            bail!("a shape for `{gvk}` is already registered");
        }
        self.shapes.insert(gvk, Box::new(shape));
        Ok(())
    }

    /// `None` is the normal outcome for kinds without a typed shape.
    pub fn resolve(&self, gvk: &Gvk) -> Option<&dyn Shape> {
        self.shapes.get(gvk).map(|shape| shape.as_ref())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
