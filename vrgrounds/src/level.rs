use std::fs;
use std::path::Path;

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GroundsError, Result},
    navigation::{NavMesh, NavMeshDefinition},
    physics::PhysicsWorld,
};

fn default_blocking() -> bool {
    true
}

/// A static box in the level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorDefinition {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    /// Non-blocking actors only take part in overlaps
    #[serde(default = "default_blocking")]
    pub blocking: bool,
}

/// Level file contents: where the player starts, the geometry, and the
/// walkable surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelDefinition {
    #[serde(default)]
    pub name: String,
    /// Capsule center at spawn
    pub spawn: [f32; 3],
    #[serde(default)]
    pub actors: Vec<ActorDefinition>,
    #[serde(default)]
    pub navmesh: NavMeshDefinition,
}

pub struct Level {
    pub name: String,
    pub spawn: Vector3<f32>,
    pub physics: PhysicsWorld,
    pub navmesh: NavMesh,
}

impl LevelDefinition {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| GroundsError::Level { path: None, source })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| GroundsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| GroundsError::Level {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Register every actor with a fresh physics world and build the navmesh.
    pub fn build(&self) -> Result<Level> {
        let mut physics = PhysicsWorld::new();
        for (index, actor) in self.actors.iter().enumerate() {
            if actor.half_extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
                return Err(GroundsError::validation(
                    format!("actors[{}] ({})", index, actor.name),
                    "half extents must be positive",
                ));
            }
            physics.add_box_actor(
                actor.name.clone(),
                actor.tags.clone(),
                to_vec3(actor.center),
                to_vec3(actor.half_extents),
                actor.blocking,
            );
        }

        let navmesh = NavMesh::from_definition(&self.navmesh)?;

        Ok(Level {
            name: self.name.clone(),
            spawn: to_vec3(self.spawn),
            physics,
            navmesh,
        })
    }

    /// The built-in testing grounds: an open floor, a climbing wall, a
    /// climbing rope, a raised platform and a crate.
    pub fn testing_grounds() -> Self {
        let actor = |name: &str, tags: &[&str], center: [f32; 3], half_extents: [f32; 3], blocking| {
            ActorDefinition {
                name: name.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                center,
                half_extents,
                blocking,
            }
        };

        LevelDefinition {
            name: "TestingGrounds".to_string(),
            spawn: [0.0, 0.88, 0.0],
            actors: vec![
                actor("Floor", &[], [0.0, -0.5, 0.0], [20.0, 0.5, 20.0], true),
                actor("ClimbingWall", &["Climbable"], [0.0, 2.5, -8.0], [3.0, 2.5, 0.25], true),
                actor("Rope", &["Climbable"], [6.0, 3.0, -2.0], [0.05, 3.0, 0.05], false),
                actor("Platform", &[], [-8.0, 0.75, -4.0], [2.0, 0.75, 2.0], true),
                actor("Crate", &[], [4.0, 0.5, 3.0], [0.5, 0.5, 0.5], true),
            ],
            navmesh: NavMeshDefinition {
                vertices: vec![
                    // Floor
                    [-20.0, 0.0, -20.0],
                    [20.0, 0.0, -20.0],
                    [20.0, 0.0, 20.0],
                    [-20.0, 0.0, 20.0],
                    // Platform top
                    [-10.0, 1.5, -6.0],
                    [-6.0, 1.5, -6.0],
                    [-6.0, 1.5, -2.0],
                    [-10.0, 1.5, -2.0],
                ],
                cells: vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]],
            },
        }
    }
}

fn to_vec3(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[1], v[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let definition = LevelDefinition::from_json_str(
            r#"{
                "name": "Tiny",
                "spawn": [0.0, 0.88, 0.0],
                "actors": [
                    { "name": "Floor", "center": [0, -0.5, 0], "half_extents": [5, 0.5, 5] },
                    { "name": "Rope", "tags": ["Climbable"], "center": [1, 1, 1],
                      "half_extents": [0.05, 1, 0.05], "blocking": false }
                ],
                "navmesh": {
                    "vertices": [[-5, 0, -5], [5, 0, -5], [5, 0, 5], [-5, 0, 5]],
                    "cells": [[0, 1, 2, 3]]
                }
            }"#,
        )
        .unwrap();

        assert!(definition.actors[0].blocking);
        assert!(!definition.actors[1].blocking);

        let level = definition.build().unwrap();
        assert_eq!(level.name, "Tiny");
        assert_eq!(level.physics.actor_count(), 2);
        assert!(level.physics.find_actor("Rope").unwrap().has_tag("Climbable"));
        assert_eq!(level.navmesh.cell_count(), 1);
    }

    #[test]
    fn test_bad_level_files() {
        assert!(matches!(
            LevelDefinition::from_json_str("{ \"actors\": [] }"),
            Err(GroundsError::Level { .. })
        ));

        let definition = LevelDefinition::from_json_str(
            r#"{ "spawn": [0, 1, 0],
                 "actors": [{ "name": "Flat", "center": [0, 0, 0], "half_extents": [1, 0, 1] }] }"#,
        )
        .unwrap();
        assert!(matches!(definition.build(), Err(GroundsError::Validation { .. })));
    }

    #[test]
    fn test_testing_grounds_matches_shipped_file() {
        let shipped = LevelDefinition::from_json_str(include_str!("../levels/testing_grounds.json"))
            .unwrap();
        let built_in = LevelDefinition::testing_grounds();
        assert_eq!(shipped.actors.len(), built_in.actors.len());
        assert_eq!(shipped.navmesh.cells, built_in.navmesh.cells);

        let level = shipped.build().unwrap();
        assert_eq!(level.physics.actor_count(), 5);
        assert!(level.navmesh.project_point(level.spawn, cgmath::vec3(1.0, 1.0, 1.0)).is_some());
    }
}
