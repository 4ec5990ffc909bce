// The tutorial scenes.

mod cameras;
mod common;
mod custom_geometry;
mod fundamentals;
mod lights;
mod materials;
mod panorama;
mod primitives;
mod render_target;
mod solar_system;
mod tank;
mod textures;
mod transparency;

pub use cameras::Cameras;
pub use custom_geometry::CustomGeometry;
pub use fundamentals::Fundamentals;
pub use lights::Lights;
pub use materials::Materials;
pub use panorama::Panorama;
pub use primitives::Primitives;
pub use render_target::RenderTargetDemo;
pub use solar_system::SolarSystem;
pub use tank::{ActiveCamera, Tank};
pub use textures::{Textures, TexturesBatch, TexturesOnLoad};
pub use transparency::{Transparency, TransparencyPlanes};

use crate::assets::AssetLoader;
use crate::config::AppConfig;
use crate::driver::Demo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DemoKind {
    Fundamentals,
    Primitives,
    SolarSystem,
    Tank,
    Materials,
    Textures,
    TexturesOnLoad,
    TexturesBatch,
    Lights,
    Cameras,
    RenderTarget,
    CustomGeometry,
    Transparency,
    TransparencyPlanes,
    Panorama,
}

impl DemoKind {
    pub const ALL: [DemoKind; 15] = [
        DemoKind::Fundamentals,
        DemoKind::Primitives,
        DemoKind::SolarSystem,
        DemoKind::Tank,
        DemoKind::Materials,
        DemoKind::Textures,
        DemoKind::TexturesOnLoad,
        DemoKind::TexturesBatch,
        DemoKind::Lights,
        DemoKind::Cameras,
        DemoKind::RenderTarget,
        DemoKind::CustomGeometry,
        DemoKind::Transparency,
        DemoKind::TransparencyPlanes,
        DemoKind::Panorama,
    ];

    /// Builds the scene, queueing any textures it needs on `loader`.
    pub fn build(self, loader: &mut AssetLoader, config: &AppConfig) -> Box<dyn Demo> {
        match self {
            DemoKind::Fundamentals => Box::new(Fundamentals::new()),
            DemoKind::Primitives => Box::new(Primitives::new(config.demo.primitive)),
            DemoKind::SolarSystem => Box::new(SolarSystem::new()),
            DemoKind::Tank => Box::new(Tank::new()),
            DemoKind::Materials => Box::new(Materials::new()),
            DemoKind::Textures => Box::new(Textures::new(loader)),
            DemoKind::TexturesOnLoad => Box::new(TexturesOnLoad::new(loader)),
            DemoKind::TexturesBatch => Box::new(TexturesBatch::new(loader)),
            DemoKind::Lights => Box::new(Lights::new(loader)),
            DemoKind::Cameras => Box::new(Cameras::new(loader)),
            DemoKind::RenderTarget => Box::new(RenderTargetDemo::new(loader)),
            DemoKind::CustomGeometry => Box::new(CustomGeometry::new()),
            DemoKind::Transparency => Box::new(Transparency::new()),
            DemoKind::TransparencyPlanes => Box::new(TransparencyPlanes::new(loader)),
            DemoKind::Panorama => Box::new(Panorama::new(
                loader,
                &config.assets.video_frames,
                config.assets.video_fps,
            )),
        }
    }
}
