// IntSar tutorials: pick a scene and run it in a window or headless

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use intsar_tutorials::assets::AssetLoader;
use intsar_tutorials::config::AppConfig;
use intsar_tutorials::demos::DemoKind;
use intsar_tutorials::driver::FrameDriver;
use intsar_tutorials::logging::{init_logging, LoggingConfig};
use intsar_tutorials::params::apply_overrides;
use intsar_tutorials::renderer::HeadlessRenderer;
use intsar_tutorials::viewport::SurfaceSize;

// Frame spacing for headless runs, in milliseconds.
const HEADLESS_FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Parser)]
#[command(version, about = "Small 3D scenes rendered with wgpu")]
struct Cli {
    /// Scene to run.
    #[arg(value_enum, default_value = "fundamentals")]
    demo: DemoKind,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without a window, recording draws instead of presenting them.
    #[arg(long)]
    headless: bool,

    /// Frames to run in headless mode.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Log filter, overriding the config file and RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    init_logging(LoggingConfig {
        filter: cli.log.clone().or_else(|| config.logging.filter.clone()),
        ..LoggingConfig::default()
    });

    let mut loader = AssetLoader::current(&config.assets.root)?;
    let mut demo = cli.demo.build(&mut loader, &config);
    let params = demo.params();
    let applied = apply_overrides(demo.scene_mut(), &params, &config.params)
        .with_context(|| format!("applying parameters to `{}`", demo.name()))?;
    if applied > 0 {
        log::info!("applied {applied} parameter override(s)");
    }

    if cli.headless {
        let size = SurfaceSize::new(config.window.width, config.window.height);
        let mut driver = FrameDriver::new(HeadlessRenderer::new(size), demo).with_loader(loader);
        driver.start();
        for frame in 0..cli.frames {
            driver
                .tick(frame as f64 * HEADLESS_FRAME_MS)
                .with_context(|| format!("headless frame {frame}"))?;
        }
        let draws: usize = driver.renderer().records().iter().map(|r| r.draw_count()).sum();
        log::info!(
            "{}: {} frames, {} draws in the last one",
            driver.demo().name(),
            driver.renderer().frames(),
            draws
        );
        return Ok(());
    }

    intsar_tutorials::app::run(&config.window, demo, loader)
        .await
        .context("running window")?;
    Ok(())
}
