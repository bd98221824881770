use cgmath::{InnerSpace, Quaternion, Rotation, Vector3, Zero, vec3};
use serde::Serialize;

/// World-space pose of the VR camera.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CameraPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl CameraPose {
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(vec3(0.0, 0.0, -1.0))
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation.rotate_vector(vec3(1.0, 0.0, 0.0))
    }

    /// Forward with the vertical component removed, or zero when looking
    /// straight up or down.
    pub fn flat_forward(&self) -> Vector3<f32> {
        flatten(self.forward())
    }

    pub fn flat_right(&self) -> Vector3<f32> {
        flatten(self.right())
    }
}

fn flatten(v: Vector3<f32>) -> Vector3<f32> {
    let flat = vec3(v.x, 0.0, v.z);
    if flat.magnitude2() <= 1e-8 {
        Vector3::zero()
    } else {
        flat.normalize()
    }
}
