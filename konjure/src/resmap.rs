use core::fmt;

use indexmap::{IndexMap, map::Entry};

use crate::resource::{ResId, Resource};

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    resources: IndexMap<ResId, Resource>,
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resources.values()).finish()
    }
}

impl fmt::Display for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for resource in self.iter() {
            if self.len() > 1 {
                writeln!(f, "---")?;
            }
            let yaml = serde_yaml::to_string(resource).map_err(|_| fmt::Error)?;
            write!(f, "{yaml}")?;
        }

        Ok(())
    }
}

impl ResourceMap {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), Conflict> {
        match self.resources.entry(resource.id().clone()) {
            Entry::Occupied(_) => Err(Conflict { resource }),
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ResId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn get_index(&self, index: usize) -> Option<&Resource> {
        self.resources.get_index(index).map(|(_, resource)| resource)
    }

    /// Callers must not change the identity of the resource, it is the key of the map.
    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut Resource> {
        self.resources
            .get_index_mut(index)
            .map(|(_, resource)| resource)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.values()
    }

    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Result<Self, Conflict> {
        let mut map = ResourceMap::default();
        for resource in resources {
            map.insert(resource)?;
        }
        Ok(map)
    }
}

impl IntoIterator for ResourceMap {
    type Item = Resource;
    type IntoIter = indexmap::map::IntoValues<ResId, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource: Resource,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "may not add resource with an already registered id `{}`",
            self.resource.id()
        )
    }
}

impl std::error::Error for Conflict {}
