//! Text layout and glyph coverage via cosmic-text.

use std::collections::HashMap;
use std::sync::Arc;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache, fontdb};
use log::{debug, warn};
use renderer::{FontAsset, TextRun};
use scene_script::{TextAlign, TextBaseline};
use tiny_skia::Mask;

const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Glyph coverage for one text run, plus where its top-left pixel sits in the
/// run's local coordinates.
pub struct GlyphCoverage {
    pub mask: Mask,
    pub origin_x: f32,
    pub origin_y: f32,
}

struct LoadedFamily {
    generation: u64,
    family: String,
    faces: Vec<fontdb::ID>,
}

/// Font database and glyph cache; created on the first text draw.
pub struct TextRasterizer {
    fonts: FontSystem,
    swash: SwashCache,
    families: HashMap<String, LoadedFamily>,
}

impl TextRasterizer {
    pub fn new() -> Self {
        Self {
            fonts: FontSystem::new(),
            swash: SwashCache::new(),
            families: HashMap::new(),
        }
    }

    /// Family name for font id `id`, loading `font` into the database when it
    /// is new or was replaced since the last draw.
    fn family(&mut self, id: &str, font: Option<&FontAsset>) -> String {
        let Some(font) = font else {
            return id.to_owned();
        };
        if let Some(loaded) = self.families.get(id)
            && loaded.generation == font.generation()
        {
            return loaded.family.clone();
        }
        if let Some(stale) = self.families.remove(id) {
            for face in stale.faces {
                self.fonts.db_mut().remove_face(face);
            }
        }

        let source = fontdb::Source::Binary(Arc::new(Arc::clone(font.bytes())));
        let faces = self.fonts.db_mut().load_font_source(source).to_vec();
        let family = faces
            .first()
            .and_then(|face| self.fonts.db().face(*face))
            .and_then(|info| info.families.first())
            .map(|(name, _)| name.clone());
        let Some(family) = family else {
            warn!(target: "raster_backend", "font `{id}` contains no usable faces");
            return id.to_owned();
        };
        debug!(target: "raster_backend", "font `{id}` loaded as family `{family}`");
        self.families.insert(
            id.to_owned(),
            LoadedFamily {
                generation: font.generation(),
                family: family.clone(),
                faces,
            },
        );
        family
    }

    /// Lays out `run` and rasterises its glyph coverage. Returns `None` for
    /// text that produces no glyphs.
    pub fn rasterize(&mut self, run: &TextRun<'_>) -> Option<GlyphCoverage> {
        if run.text.is_empty() || !run.style.size.is_finite() || run.style.size <= 0.0 {
            return None;
        }
        let family = self.family(&run.style.font, run.font);
        let size = run.style.size;
        let attrs = Attrs::new().family(Family::Name(&family));

        let mut buffer = Buffer::new(&mut self.fonts, Metrics::new(size, size * LINE_HEIGHT_FACTOR));
        buffer.set_size(&mut self.fonts, None, None);
        buffer.set_text(&mut self.fonts, run.text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.fonts, false);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        let mut first_line = None;
        for line in buffer.layout_runs() {
            width = width.max(line.line_w);
            height = height.max(line.line_top + line.line_height);
            first_line.get_or_insert((line.line_y, line.line_top, line.line_height));
        }
        let (baseline, top, line_height) = first_line?;

        // Glyphs may overhang the advance box.
        let pad = (size * 0.5).ceil();
        let mask_width = (width + 2.0 * pad).ceil() as u32;
        let mask_height = (height + 2.0 * pad).ceil() as u32;
        let mut mask = Mask::new(mask_width, mask_height)?;
        let stride = i64::from(mask_width);
        let rows = i64::from(mask_height);
        let offset = pad as i64;
        {
            let data = mask.data_mut();
            buffer.draw(
                &mut self.fonts,
                &mut self.swash,
                cosmic_text::Color::rgba(255, 255, 255, 255),
                |x, y, span_w, span_h, color| {
                    let alpha = color.a();
                    if alpha == 0 {
                        return;
                    }
                    for row in i64::from(y)..i64::from(y) + i64::from(span_h) {
                        let py = row + offset;
                        if !(0..rows).contains(&py) {
                            continue;
                        }
                        for column in i64::from(x)..i64::from(x) + i64::from(span_w) {
                            let px = column + offset;
                            if !(0..stride).contains(&px) {
                                continue;
                            }
                            let slot = &mut data[(py * stride + px) as usize];
                            *slot = (*slot).max(alpha);
                        }
                    }
                },
            );
        }

        let shift_x = match run.style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width / 2.0,
            TextAlign::Right => -width,
        };
        let shift_y = match run.style.baseline {
            TextBaseline::Top => -top,
            TextBaseline::Middle => -(top + line_height / 2.0),
            TextBaseline::Alphabetic => -baseline,
            TextBaseline::Bottom => -(top + line_height),
        };
        Some(GlyphCoverage {
            mask,
            origin_x: shift_x - pad,
            origin_y: shift_y - pad,
        })
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
