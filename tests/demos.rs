use approx::assert_abs_diff_eq;
use image::RgbaImage;

use intsar_tutorials::assets::AssetLoader;
use intsar_tutorials::camera::Camera;
use intsar_tutorials::config::AppConfig;
use intsar_tutorials::demos::{DemoKind, Fundamentals};
use intsar_tutorials::driver::{DriverError, DriverState, FrameDriver};
use intsar_tutorials::math::Color;
use intsar_tutorials::renderer::{HeadlessRenderer, RenderError, RenderTarget, Renderer, TextureKey};
use intsar_tutorials::scene::Scene;
use intsar_tutorials::viewport::{ScissorRect, SurfaceSize};

const SIZE: SurfaceSize = SurfaceSize::new(800, 600);

fn loader() -> AssetLoader {
    // Nothing under this root decodes; every texture request fails quietly.
    AssetLoader::current("no-such-asset-root").unwrap()
}

#[test]
fn three_cubes_after_one_second() {
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), Box::new(Fundamentals::new()));
    driver.start();
    let time = driver.tick(1000.0).unwrap();
    assert_abs_diff_eq!(time.elapsed, 1.0);

    let scene = driver.demo().scene();
    for (i, expected) in [1.0, 1.1, 1.2].into_iter().enumerate() {
        let id = scene.find(&format!("cube{i}")).unwrap();
        let rotation = scene.node(id).transform.rotation;
        assert_abs_diff_eq!(rotation.x, expected, epsilon = 1e-6);
        assert_abs_diff_eq!(rotation.y, expected, epsilon = 1e-6);
    }
    assert_eq!(driver.renderer().frames(), 1);
    assert_eq!(driver.renderer().records()[0].opaque, 3);
    assert!(driver.is_scheduled());
}

#[tokio::test]
async fn every_demo_is_a_function_of_time() {
    let config = AppConfig::default();
    let mut loader = loader();
    for kind in DemoKind::ALL {
        let mut fresh = kind.build(&mut loader, &config);
        let mut replayed = kind.build(&mut loader, &config);

        fresh.update(2.5);
        replayed.update(7.0);
        replayed.update(0.3);
        replayed.update(2.5);

        assert_eq!(
            fresh.scene().transforms(),
            replayed.scene().transforms(),
            "{} depends on more than its time input",
            fresh.name()
        );
    }
}

#[tokio::test]
async fn every_demo_renders_a_frame() {
    let config = AppConfig::default();
    let mut loader = loader();
    for kind in DemoKind::ALL {
        let demo = kind.build(&mut loader, &config);
        let name = demo.name();
        let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), demo);
        driver.start();
        driver.tick(16.0).unwrap();
        driver.tick(32.0).unwrap();
        assert_eq!(driver.renderer().frames(), 2, "{name}");
        assert!(!driver.renderer().records().is_empty(), "{name}");
    }
}

#[tokio::test]
async fn split_view_renders_each_half_with_its_own_aspect() {
    let demo = DemoKind::Cameras.build(&mut loader(), &AppConfig::default());
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), demo);
    driver.start();
    driver.tick(0.0).unwrap();

    let records = driver.renderer().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].scissor, Some(ScissorRect::new(0, 0, 400, 600)));
    assert_eq!(records[1].scissor, Some(ScissorRect::new(400, 0, 400, 600)));
    assert_abs_diff_eq!(records[0].camera_aspect, 400.0 / 600.0);
    assert_abs_diff_eq!(records[1].camera_aspect, 400.0 / 600.0);
    assert_eq!(records[0].background, Some(Color::from_hex(0x000000)));
    assert_eq!(records[1].background, Some(Color::from_hex(0x000040)));
    // The frustum helper only shows from the second camera.
    assert_eq!(records[1].draw_count(), records[0].draw_count() + 1);
}

#[tokio::test]
async fn split_view_on_odd_surface_stays_inside() {
    let demo = DemoKind::Cameras.build(&mut loader(), &AppConfig::default());
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SurfaceSize::new(801, 601)), demo);
    driver.start();
    driver.tick(0.0).unwrap();

    let scissors: Vec<_> = driver.renderer().records().iter().filter_map(|r| r.scissor).collect();
    assert_eq!(scissors.len(), 2);
    for rect in &scissors {
        assert!(rect.x + rect.width <= 801, "{rect:?}");
        assert!(rect.y + rect.height <= 601, "{rect:?}");
    }
    assert_eq!(scissors[0].x + scissors[0].width, scissors[1].x);
}

#[tokio::test]
async fn render_target_is_drawn_before_the_main_scene() {
    let demo = DemoKind::RenderTarget.build(&mut loader(), &AppConfig::default());
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), demo);
    driver.start();
    driver.tick(0.0).unwrap();

    let records = driver.renderer().records();
    assert_eq!(records.len(), 2);
    assert!(records[0].target.is_some());
    assert_eq!(records[0].camera_aspect, 1.0);
    assert_eq!(records[1].target, None);
    assert_abs_diff_eq!(records[1].camera_aspect, 800.0 / 600.0);
}

#[test]
fn resize_fits_cameras_and_skips_zero_sizes() {
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), Box::new(Fundamentals::new()));
    driver.start();
    assert_abs_diff_eq!(driver.demo_mut().cameras_mut()[0].aspect, 800.0 / 600.0);

    assert!(driver.resize(SurfaceSize::new(1024, 512)));
    assert_eq!(driver.renderer().size(), SurfaceSize::new(1024, 512));
    assert_abs_diff_eq!(driver.demo_mut().cameras_mut()[0].aspect, 2.0);

    assert!(!driver.resize(SurfaceSize::new(1024, 0)));
    assert_eq!(driver.renderer().size(), SurfaceSize::new(1024, 512));
    assert_abs_diff_eq!(driver.demo_mut().cameras_mut()[0].aspect, 2.0);
}

/// Headless renderer whose draws start failing from a given frame.
struct FlakyRenderer {
    inner: HeadlessRenderer,
    fail_from: u64,
}

impl Renderer for FlakyRenderer {
    fn size(&self) -> SurfaceSize {
        self.inner.size()
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.inner.resize(size);
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.inner.begin_frame()
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.inner.end_frame()
    }

    fn set_render_target(&mut self, target: Option<RenderTarget>) {
        self.inner.set_render_target(target);
    }

    fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.inner.set_scissor(scissor);
    }

    fn upload_image(&mut self, key: TextureKey, image: &RgbaImage) {
        self.inner.upload_image(key, image);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        if self.inner.frames() >= self.fail_from {
            return Err(RenderError::NoAdapter);
        }
        self.inner.render(scene, camera)
    }
}

#[test]
fn driver_halts_after_a_failed_frame() {
    let renderer = FlakyRenderer {
        inner: HeadlessRenderer::new(SIZE),
        fail_from: 2,
    };
    let mut driver = FrameDriver::new(renderer, Box::new(Fundamentals::new()));
    assert!(matches!(driver.tick(0.0), Err(DriverError::NotScheduled)));

    driver.start();
    driver.tick(0.0).unwrap();
    driver.tick(16.0).unwrap();
    assert!(matches!(driver.tick(32.0), Err(DriverError::Render(RenderError::NoAdapter))));
    assert_eq!(driver.state(), DriverState::Halted);

    // The failed frame was still closed; nothing runs after it.
    assert_eq!(driver.renderer().inner.frames(), 3);
    assert!(matches!(driver.tick(48.0), Err(DriverError::NotScheduled)));
    assert_eq!(driver.renderer().inner.frames(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn loaded_texture_reaches_renderer_and_demo() {
    let root = std::env::temp_dir().join(format!("intsar-on-load-{}", std::process::id()));
    std::fs::create_dir_all(root.join("resources")).unwrap();
    image::RgbImage::from_pixel(8, 4, image::Rgb([200, 120, 40]))
        .save(root.join("resources/fox-1.jpg"))
        .unwrap();

    let mut loader = AssetLoader::current(&root).unwrap();
    let demo = DemoKind::TexturesOnLoad.build(&mut loader, &AppConfig::default());
    let mut driver = FrameDriver::new(HeadlessRenderer::new(SIZE), demo).with_loader(loader);
    driver.start();

    let mut now = 0.0;
    while driver.demo().scene().find("box").is_none() && now < 5000.0 {
        driver.tick(now).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        now += 16.0;
    }
    driver.tick(now).unwrap();

    assert!(driver.demo().scene().find("box").is_some());
    assert_eq!(driver.renderer().records()[0].opaque, 1);
    assert_eq!(driver.loader_mut().map(|l| l.pending()), Some(0));
}
