pub mod material_instance;
pub mod post_process;

pub use material_instance::{LinearColor, MaterialInstanceDynamic};
pub use post_process::PostProcessComponent;
