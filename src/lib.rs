// IntSar tutorials: small 3D scenes on a shared frame loop

pub mod app;
pub mod assets;
pub mod camera;
pub mod clock;
pub mod config;
pub mod curve;
pub mod demos;
pub mod driver;
pub mod geometry;
pub mod light;
pub mod logging;
pub mod material;
pub mod math;
pub mod params;
pub mod renderer;
pub mod scene;
pub mod viewport;
