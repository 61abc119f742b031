pub mod html;
pub mod server;
pub mod state;
pub mod surface;

pub use state::{shared_panel, Panel, SharedPanel};
pub use surface::{DisplaySurface, WebSurface};
