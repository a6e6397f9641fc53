//! Renders a few dashboard frames through the draw units onto a simulated panel.
//!
//! Set `RUST_LOG=pixelpipe_engine::ppe=trace` to see per-transfer timing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use pixelpipe_engine::coords::{Area, Point};
use pixelpipe_engine::display::DisplayDriver;
use pixelpipe_engine::draw::shapes::{BorderDsc, FillDsc, ImageDsc, LineDsc, MaskRectDsc};
use pixelpipe_engine::draw::{BufHeader, DrawBuf, HeapAllocator, Layer, Renderer};
use pixelpipe_engine::hal::PanelConfig;
use pixelpipe_engine::hal::sim::{Completion, SimCache, SimLcdc, SimPpe};
use pixelpipe_engine::logging::{LoggingConfig, init_logging};
use pixelpipe_engine::paint::{Color, Color32, ColorFormat, Opa};
use pixelpipe_engine::ppe::{PpeConfig, PpeUnit};
use pixelpipe_engine::sw::SoftwareUnit;

const FRAMES: u32 = 3;
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let ppe = SimPpe::new(Completion::Immediate);
    let lcdc = SimLcdc::new();
    let cache = Arc::new(SimCache::new());

    let panel = PanelConfig::default();
    let display = DisplayDriver::new(Arc::new(lcdc.clone()), cache.clone(), panel.clone())
        .context("display init failed")?;
    let vblanks = Arc::new(AtomicU64::new(0));
    {
        let vblanks = Arc::clone(&vblanks);
        display.register_vblank_callback(move || {
            vblanks.fetch_add(1, Ordering::Relaxed);
        });
    }

    let mut renderer = Renderer::new(Arc::new(HeapAllocator::unbounded()));
    renderer.register(Box::new(SoftwareUnit::new()));
    let unit = PpeUnit::new(Arc::new(ppe.clone()), cache.clone(), PpeConfig::default(), renderer.signal())
        .context("ppe draw unit init failed")?;
    let ppe_stats = unit.stats_handle();
    renderer.register(Box::new(unit));

    let icon = icon(48);
    let (w, h) = display.info();
    let screen = Area::new(0, 0, w as i32 - 1, h as i32 - 1);

    for frame in 0..FRAMES {
        let layer = Layer::new(panel.format, screen);
        draw_dashboard(&renderer, &layer, &icon, frame);
        renderer.finish_layer(&layer);
        renderer
            .run_until_idle(&layer, FRAME_TIMEOUT)
            .with_context(|| format!("frame {frame} did not finish"))?;
        renderer.present(&layer, &display)?;

        // One frame to reach the line interrupt, one for the swap to land.
        while display.refresh_pending() {
            if !lcdc.scan_frame() {
                anyhow::bail!("panel stopped scanning out");
            }
        }
        log::info!("frame {frame} on screen after {} vblanks", vblanks.load(Ordering::Relaxed));
    }

    let stats = ppe_stats.snapshot();
    log::info!(
        "ppe: {} transfers ({} fills, {} images, {} lines, {} masks), {} software fallbacks, {} stalls",
        stats.transfers,
        stats.fills,
        stats.images,
        stats.lines,
        stats.masks,
        stats.sw_fallbacks,
        stats.stalls
    );
    log::info!("panel: {} frames scanned, {} underflows", lcdc.frames(), display.underflows());
    let c = cache.counters();
    log::info!(
        "cache: {} cleans ({} bytes), {} invalidates, {} full flushes",
        c.cleans, c.cleaned_bytes, c.invalidates, c.full_flushes
    );

    renderer.shutdown()
}

/// A small RGB565 checkerboard.
fn icon(size: u32) -> DrawBuf {
    let buf = DrawBuf::new(BufHeader::new(size, size, ColorFormat::Rgb565));
    {
        let mut data = buf.write();
        let stride = buf.header().stride as usize;
        for y in 0..size as usize {
            for x in 0..size as usize {
                let px = if (x / 8 + y / 8) % 2 == 0 {
                    Color32::new(0xf0, 0x90, 0x20, 0xff)
                } else {
                    Color32::new(0x20, 0x20, 0x30, 0xff)
                };
                ColorFormat::Rgb565.write(&mut data[y * stride + x * 2..], px);
            }
        }
    }
    buf
}

fn draw_dashboard(renderer: &Renderer, layer: &Arc<Layer>, icon: &DrawBuf, frame: u32) {
    let screen = layer.buf_area();
    let offset = frame as i32 * 40;

    renderer.fill_solid(layer, screen, Color::hex(0x101418));
    renderer.add_fill(
        layer,
        Area::new(0, 0, screen.x2, 59),
        screen,
        FillDsc::solid(Color::hex(0x2d6cdf), Opa::COVER),
    );
    renderer.add_label(layer, Area::new(16, 16, 300, 44), screen, "pixelpipe", Color::white());

    // Cards: the big one goes to the accelerator, the badge is small enough
    // to stay in software.
    let card = Area::new(40 + offset, 100, 360 + offset, 300);
    renderer.add_fill(layer, card, screen, FillDsc::solid(Color::hex(0x20262e), Opa::COVER));
    renderer.add_border(layer, card, screen, BorderDsc::new(2, Color::hex(0x3a4450)));
    renderer.add_fill(
        layer,
        Area::new(card.x2 - 30, card.y1 + 10, card.x2 - 10, card.y1 + 30),
        screen,
        FillDsc::solid(Color::hex(0xe04040), Opa::COVER),
    );

    let mut img = ImageDsc::new(icon.clone());
    img.style.rotation = (frame as i32 % 4) * 900;
    renderer.add_image(layer, Area::from_origin_size(card.x1 + 20, card.y1 + 20, 48, 48), screen, img);

    let mut faded = ImageDsc::new(icon.clone());
    faded.style.opa = Opa::HALF;
    faded.style.scale_x = 128;
    faded.style.scale_y = 128;
    renderer.add_image(layer, Area::from_origin_size(card.x1 + 90, card.y1 + 20, 48, 48), screen, faded);

    renderer.add_line(
        layer,
        screen,
        LineDsc::new(Point::new(40, 340), Point::new(760, 340), 3, Color::hex(0x6a7480)),
    );

    let mut tiles = ImageDsc::new(icon.clone());
    tiles.style.tile = true;
    renderer.add_image(layer, Area::new(420, 100, 420 + 3 * 48 - 1, 100 + 2 * 48 - 1), screen, tiles);

    // Punch the panel corners back out.
    renderer.add_mask_rect(
        layer,
        Area::new(400, 380, 760, 460),
        MaskRectDsc { area: Area::new(410, 390, 750, 450), radius: 0 },
    );
}
