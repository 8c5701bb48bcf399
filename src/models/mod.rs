//! Data model shared by the registries and the API

mod button;
mod configuration;
mod position;
mod session;

pub use button::{ActionParams, Button, ButtonAction, ParamValue};
pub use configuration::{Configuration, GridSize, ResolvedButton, ResolvedConfiguration};
pub use position::{GridPosition, PositionParseError};
pub use session::ClientSession;
