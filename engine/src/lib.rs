// Host-side subsystems for the testing grounds: the pieces a game engine
// would normally provide to gameplay code (timers, camera fades, curves,
// splines, material parameters) plus the shared logging setup.

#[macro_use]
pub mod macros;

pub mod camera_fade;
pub mod curve;
pub mod logging;
pub mod materials;
pub mod spline;
pub mod timer;

pub use camera_fade::CameraFade;
pub use curve::{CurveKey, FloatCurve};
pub use spline::{Spline, SplinePoint};
pub use timer::{TimerHandle, TimerManager};
