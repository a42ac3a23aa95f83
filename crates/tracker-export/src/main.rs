//! Renders a mock pattern view into PNG frames through an offscreen
//! tracker-gfx context.

mod loader;
mod pattern;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracker_gfx::backend::{Backend, SoftwareBackend, WgpuBackend, WgpuInit};
use tracker_gfx::coords::Vec2;
use tracker_gfx::logging::{LoggingConfig, init_logging};
use tracker_gfx::resources::{ResourceLoader, ScaleVariant};
use tracker_gfx::text::Font;
use tracker_gfx::{Graphics, GraphicsConfig, OffscreenGraphics};

use crate::loader::DirLoader;
use crate::pattern::PatternView;

#[derive(Parser, Debug)]
#[command(about = "Render pattern-view frames to PNG files")]
struct Args {
    /// Directory holding bitmaps (`name[@1.5x|@2x].png`) and BMFont descriptions.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// BMFont name; loads `<assets>/<font>.fnt` and its `<font>.png` atlas.
    #[arg(long)]
    font: Option<String>,

    /// Bitmap tiled over the row gutter.
    #[arg(long)]
    swatch: Option<String>,

    #[arg(long, default_value_t = 8)]
    frames: u32,

    /// Width in logical pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Height in logical pixels.
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Device pixels per logical pixel.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    #[arg(long, default_value_t = 8)]
    channels: u32,

    #[arg(long, default_value_t = 64)]
    rows: u32,

    /// Output directory for `frame_NNNNN.png`.
    #[arg(long, default_value = "frames")]
    out: PathBuf,

    /// Use the CPU rasterizer instead of a headless GPU device.
    #[arg(long)]
    software: bool,

    /// Log filter, overriding `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.clone().map(LoggingConfig::with_filter).unwrap_or_default());

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;

    if args.software {
        export(SoftwareBackend::new(1, 1), &args)
    } else {
        export(WgpuBackend::headless(WgpuInit::default())?, &args)
    }
}

fn export<B: Backend>(backend: B, args: &Args) -> Result<()> {
    let config = GraphicsConfig { pixel_scale: args.scale, ..Default::default() };
    let width = (args.width as f32 * args.scale).round().max(1.0) as u32;
    let height = (args.height as f32 * args.scale).round().max(1.0) as u32;
    let mut g = OffscreenGraphics::new(backend, width, height, config);

    let loader = DirLoader::new(&args.assets);
    let font = match args.font.as_deref() {
        Some(name) => Some(load_font(&mut *g, &loader, name)?),
        None => None,
    };
    let swatch = match args.swatch.as_deref() {
        Some(name) => Some(g.load_bitmap(&loader, name)?),
        None => None,
    };

    let view = PatternView::new(args.channels, args.rows);
    let size = Vec2::new(args.width as f32, args.height as f32);
    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    log::info!("rendering {} frames at {width}x{height}", args.frames);

    for frame in 0..args.frames {
        g.begin_draw();
        view.draw(&mut *g, size, frame, font.as_ref(), swatch.as_ref());
        g.end_draw();

        g.get_bitmap(&mut pixels).with_context(|| format!("readback of frame {frame} failed"))?;
        let path = args.out.join(format!("frame_{frame:05}.png"));
        image::save_buffer(&path, &pixels, width, height, image::ExtendedColorType::Rgba8)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::debug!("wrote {}", path.display());
    }
    Ok(())
}

fn load_font<B: Backend>(g: &mut Graphics<B>, loader: &DirLoader, name: &str) -> Result<Font> {
    let path = loader.root().join(format!("{name}.fnt"));
    let description = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // Atlas metrics are authored at 1x.
    let atlas_path = loader.path(name, ScaleVariant::X1);
    let atlas = loader
        .load(name, ScaleVariant::X1)?
        .with_context(|| format!("font atlas {} not found", atlas_path.display()))?;
    let atlas = g.create_bitmap(&atlas);
    let font = g
        .create_font(&description, atlas)
        .with_context(|| format!("invalid font {}", path.display()))?;
    Ok(font.with_ellipsis(true))
}
