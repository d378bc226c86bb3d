mod pod_template;

pub use self::pod_template::{Outcome, PodTemplateTransformer};

use crate::resmap::ResourceMap;

pub trait Transformer {
    fn transform(&mut self, resources: &mut ResourceMap) -> anyhow::Result<()>;
}
