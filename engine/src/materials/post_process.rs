use super::MaterialInstanceDynamic;

/// Post-process volume holding screen-space blendable materials.
///
/// Blendables are keyed by base material name; adding a second instance of
/// the same base replaces the first.
#[derive(Clone, Debug, Default)]
pub struct PostProcessComponent {
    blendables: Vec<MaterialInstanceDynamic>,
}

impl PostProcessComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_or_update_blendable(&mut self, material: MaterialInstanceDynamic) -> usize {
        if let Some(index) = self
            .blendables
            .iter()
            .position(|m| m.base_material() == material.base_material())
        {
            self.blendables[index] = material;
            index
        } else {
            self.blendables.push(material);
            self.blendables.len() - 1
        }
    }

    pub fn blendable(&self, index: usize) -> Option<&MaterialInstanceDynamic> {
        self.blendables.get(index)
    }

    pub fn blendable_mut(&mut self, index: usize) -> Option<&mut MaterialInstanceDynamic> {
        self.blendables.get_mut(index)
    }

    pub fn blendable_count(&self) -> usize {
        self.blendables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_or_update_replaces_same_base() {
        let mut post_process = PostProcessComponent::new();
        let first = post_process.add_or_update_blendable(MaterialInstanceDynamic::create("M_Blinker"));
        let other = post_process.add_or_update_blendable(MaterialInstanceDynamic::create("M_Grain"));

        let mut updated = MaterialInstanceDynamic::create("M_Blinker");
        updated.set_scalar_parameter_value("Radius", 0.3);
        let again = post_process.add_or_update_blendable(updated);

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(post_process.blendable_count(), 2);
        assert_eq!(
            post_process
                .blendable(first)
                .and_then(|m| m.scalar_parameter_value("Radius")),
            Some(0.3)
        );
    }
}
