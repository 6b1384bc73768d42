use crate::layout::{NodeHandle, has_visible_label};

use super::super::ViewModel;

impl ViewModel {
    /// Mounts every contact carrying a visible label and unmounts the rest.
    pub(in crate::app) fn sync_mounted(&mut self) {
        let nodes = self.engine.nodes_mut();
        for entity in self.dataset.entities() {
            let wanted = has_visible_label(entity, &self.labels);
            let mounted = nodes.is_registered(&entity.id);

            if wanted && !mounted {
                nodes.register(
                    &entity.id,
                    NodeHandle::new(self.next_handle),
                    entity.initial_position,
                );
                self.next_handle += 1;
            } else if !wanted && mounted {
                nodes.unregister(&entity.id);
            }
        }
    }

    /// Drops layout state for contacts that left the dataset.
    pub(in crate::app) fn prune_unknown_nodes(&mut self) {
        let dataset = &self.dataset;
        self.engine.nodes_mut().retain(|id| dataset.contains(id));
    }
}
