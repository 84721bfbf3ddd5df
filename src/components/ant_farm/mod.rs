mod assets;
mod browser;
mod clock;
mod color;
mod component;
mod config;
mod error;
mod layout;
mod motion;
mod playback;
mod render;
mod state;
mod types;

pub use component::AntFarmCanvas;
pub use config::ViewerParams;
