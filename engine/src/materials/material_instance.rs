use std::collections::HashMap;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl LinearColor {
    pub const BLACK: LinearColor = LinearColor::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        LinearColor { r, g, b, a: 1.0 }
    }
}

/// Runtime-writable parameter block layered over a named base material.
#[derive(Clone, Debug, Serialize)]
pub struct MaterialInstanceDynamic {
    base_material: String,
    scalar_parameters: HashMap<String, f32>,
    vector_parameters: HashMap<String, LinearColor>,
}

impl MaterialInstanceDynamic {
    pub fn create(base_material: impl Into<String>) -> Self {
        MaterialInstanceDynamic {
            base_material: base_material.into(),
            scalar_parameters: HashMap::new(),
            vector_parameters: HashMap::new(),
        }
    }

    pub fn base_material(&self) -> &str {
        &self.base_material
    }

    pub fn set_scalar_parameter_value(&mut self, name: &str, value: f32) {
        self.scalar_parameters.insert(name.to_owned(), value);
    }

    pub fn set_vector_parameter_value(&mut self, name: &str, value: LinearColor) {
        self.vector_parameters.insert(name.to_owned(), value);
    }

    pub fn scalar_parameter_value(&self, name: &str) -> Option<f32> {
        self.scalar_parameters.get(name).copied()
    }

    pub fn vector_parameter_value(&self, name: &str) -> Option<LinearColor> {
        self.vector_parameters.get(name).copied()
    }
}
