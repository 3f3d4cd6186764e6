//! Grouped views over a crawled tree

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::crawler::ServiceDirectoryNode;
use crate::arcgis::LayerDescriptor;

/// Descriptors listed under one folder or service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGroup {
    pub name: String,
    pub layers: Vec<LayerDescriptor>,
}

/// Ordered map of group name to descriptors, serialized as a JSON object
/// in crawl order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerCatalogue {
    groups: Vec<LayerGroup>,
}

impl LayerCatalogue {
    /// Collect every non-empty group of `node` whose descriptors pass `keep`
    fn collect(node: &ServiceDirectoryNode, keep: impl Fn(&LayerDescriptor) -> bool) -> Self {
        let mut catalogue = Self::default();
        for current in node.walk() {
            let layers: Vec<LayerDescriptor> =
                current.layers.iter().filter(|d| keep(d)).cloned().collect();
            catalogue.extend_group(&current.name, layers);
        }
        catalogue
    }

    fn extend_group(&mut self, name: &str, layers: Vec<LayerDescriptor>) {
        if layers.is_empty() {
            return;
        }
        match self.groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.layers.extend(layers),
            None => self.groups.push(LayerGroup {
                name: name.to_string(),
                layers,
            }),
        }
    }

    /// Build a single-group catalogue from an uncrawled listing
    pub fn single(name: impl Into<String>, layers: Vec<LayerDescriptor>) -> Self {
        let mut catalogue = Self::default();
        catalogue.extend_group(&name.into(), layers);
        catalogue
    }

    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&LayerGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// All descriptors, in group order
    pub fn descriptors(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.groups.iter().flat_map(|g| g.layers.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.layers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for LayerCatalogue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.name, &group.layers)?;
        }
        map.end()
    }
}

/// Every leaf of the tree, grouped by the folder or service that lists it
pub fn catalogue(node: &ServiceDirectoryNode) -> LayerCatalogue {
    LayerCatalogue::collect(node, |_| true)
}

/// Only the leaves whose `type` is exactly `type_name`. Untyped leaves and
/// groups left empty are dropped.
pub fn filter_layers_by_type(node: &ServiceDirectoryNode, type_name: &str) -> LayerCatalogue {
    LayerCatalogue::collect(node, |d| d.is_type(type_name))
}
