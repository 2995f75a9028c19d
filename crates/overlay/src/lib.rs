//! Map overlay state and the controller that keeps it in sync with the map.
//!
//! The [`ViewportController`] owns the single [`MapOverlayState`] for a
//! session. Map interaction, search input and geolocation reach it as
//! commands through an [`OverlayHandle`]; it debounces viewport changes into
//! geosearch fetches and publishes an [`OverlaySnapshot`] after every change.

pub mod config;
pub mod controller;
pub mod locate;
pub mod render;
pub mod state;
pub mod surface;

pub use config::*;
pub use controller::*;
pub use locate::*;
pub use render::*;
pub use state::*;
pub use surface::*;
