// VR Teleport Movement System
//
// Point with the right hand, see where you would land, press Teleport.
// The destination comes from a predicted projectile path (or a straight
// ray) traced against level geometry and snapped onto the navigation mesh.
// Execution hides the jump behind a fade to black and back.

pub mod arc_renderer;
pub mod teleport_system;
pub mod trajectory;

pub use arc_renderer::{ArcRenderer, SplineMeshSegment};
pub use teleport_system::{
    DestinationMarker, TeleportConfig, TeleportPhase, TeleportSystem, TeleportTargeting,
};
pub use trajectory::{ArcTrajectory, MAX_SIM_STEPS, PredictProjectileParams};
