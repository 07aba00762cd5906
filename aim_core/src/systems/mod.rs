pub mod analytics;
pub mod effects;
pub mod quality;
pub mod scoring;
pub mod targets;

pub use analytics::*;
pub use effects::*;
pub use quality::*;
pub use scoring::*;
pub use targets::*;
