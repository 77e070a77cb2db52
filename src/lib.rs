mod bridge;
mod components;
mod error;
mod interop;
mod vpos;
mod vpos_component;

pub use bridge::*;
pub use components::*;
pub use error::*;
pub use interop::*;
pub use vpos::*;
pub use vpos_component::*;
