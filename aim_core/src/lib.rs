pub mod components;
pub mod config;
pub mod error;
pub mod fsm;
pub mod map;
pub mod params;
pub mod policy;
pub mod pool;
pub mod resources;
pub mod session;
pub mod systems;

pub use components::*;
pub use config::*;
pub use error::*;
pub use fsm::*;
pub use map::*;
pub use params::*;
pub use policy::*;
pub use pool::*;
pub use resources::*;
pub use session::*;
pub use systems::*;
