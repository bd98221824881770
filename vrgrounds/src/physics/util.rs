use cgmath::Vector3;
use rapier3d::prelude::*;

pub fn nvec_to_cgmath(vec: Vector<Real>) -> Vector3<f32> {
    Vector3 {
        x: vec.x,
        y: vec.y,
        z: vec.z,
    }
}

pub fn npoint_to_cgvec(point: Point<Real>) -> Vector3<f32> {
    Vector3 {
        x: point.x,
        y: point.y,
        z: point.z,
    }
}

pub fn vec_to_npoint(vec: Vector3<f32>) -> Point<Real> {
    point![vec.x, vec.y, vec.z]
}

pub fn vec_to_nvec(vec: Vector3<f32>) -> Vector<Real> {
    vector![vec.x, vec.y, vec.z]
}

pub fn vec_to_isometry(vec: Vector3<f32>) -> Isometry<Real> {
    Isometry::translation(vec.x, vec.y, vec.z)
}
