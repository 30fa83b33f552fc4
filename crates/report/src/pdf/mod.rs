//! Stateless PDF renderer for composed documents.
//!
//! Charts are rasterised to PNG inside a temporary directory owned by a
//! single `render` call. The directory is removed on every exit path,
//! including errors.

mod font;
mod layout;

use std::path::{Path, PathBuf};

use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use tracing::{debug, warn};

use crate::chart::{CHART_HEIGHT, CHART_WIDTH, ChartSpec};
use crate::document::{Cover, Document, MetricTable, NarrativeBlock, Overview, Section};
use crate::error::RenderError;

use font::{Font, sanitize};
use layout::{Align, CONTENT_WIDTH, Layout, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};

const COVER_BAND: [u8; 3] = [51, 122, 183];
const TABLE_HEADER: [u8; 3] = [240, 240, 240];
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];
const LABEL_COLUMN: f32 = 260.0;

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    scratch_root: Option<PathBuf>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create chart scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(root.into()),
        }
    }

    /// Render `document` to PDF bytes.
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        self.with_scratch(|scratch| render_with(document, scratch))
    }

    /// Run `f` with a fresh scratch directory that is removed afterwards,
    /// whether `f` succeeded or not.
    fn with_scratch<T>(
        &self,
        f: impl FnOnce(&Path) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tenantpulse-charts-");
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let result = f(scratch.path());

        let scratch_path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            warn!(path = %scratch_path.display(), error = %err, "failed to remove chart scratch directory");
        }
        result
    }
}

fn render_with(document: &Document, scratch: &Path) -> Result<Vec<u8>, RenderError> {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), id);
    }

    let mut xobjects = Dictionary::new();
    let mut layout = Layout::new();
    for section in &document.sections {
        match section {
            Section::Cover(cover) => draw_cover(&mut layout, cover),
            Section::Overview(overview) => draw_overview(&mut layout, overview),
            Section::MetricsTables(tables) => draw_tables(&mut layout, tables),
            Section::Chart(spec) => {
                let name = format!("Im{}", xobjects.len() + 1);
                let image_id = embed_chart(&mut pdf, spec, scratch, &name)?;
                xobjects.set(name.clone(), image_id);
                draw_chart(&mut layout, spec, &name);
            }
            Section::DetailedNarrative(blocks) => draw_detail(&mut layout, blocks),
        }
    }

    let resources_id = pdf.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in layout.finish() {
        let content = Content { operations };
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let page_count = kids.len() as i64;

    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), (PAGE_WIDTH as i64).into(), (PAGE_HEIGHT as i64).into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    debug!(customer = %document.customer, pages = page_count, bytes = bytes.len(), "pdf rendered");
    Ok(bytes)
}

/// Rasterise a chart to PNG in `scratch`, read it back and add it as an image XObject.
fn embed_chart(
    pdf: &mut lopdf::Document,
    spec: &ChartSpec,
    scratch: &Path,
    name: &str,
) -> Result<ObjectId, RenderError> {
    let path = scratch.join(format!("{name}.png"));
    spec.rasterize()
        .save_with_format(&path, image::ImageFormat::Png)?;
    let raster = image::open(&path)?.to_rgb8();
    let (width, height) = raster.dimensions();

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        raster.into_raw(),
    );
    Ok(pdf.add_object(stream))
}

fn centred_x(text: &str, font: Font, size: f32) -> f32 {
    let w = font.width(&sanitize(text), size);
    ((PAGE_WIDTH - w) / 2.0).max(0.0)
}

fn draw_cover(layout: &mut Layout, cover: &Cover) {
    layout.new_page();
    layout.space(40.0);
    layout.band(0.0, PAGE_WIDTH, 50.0, COVER_BAND);
    let top = layout.cursor();
    layout.set_cursor(top - 13.0);
    layout.text_at(
        &cover.title,
        Font::Bold,
        24.0,
        centred_x(&cover.title, Font::Bold, 24.0),
        WHITE,
    );
    layout.set_cursor(top - 50.0);
    layout.space(20.0);
    layout.line(&cover.customer, Font::Bold, 20.0, Align::Centre, 30.0);
    layout.line(&cover.generated_on, Font::Regular, 12.0, Align::Centre, 18.0);
    layout.line(&cover.window_statement, Font::Regular, 12.0, Align::Centre, 18.0);
}

fn draw_overview(layout: &mut Layout, overview: &Overview) {
    layout.space(30.0);
    layout.line(&overview.heading, Font::Bold, 12.0, Align::Left, 16.0);
    layout.underline(MARGIN, Font::Bold.width(&overview.heading, 12.0));
    layout.space(4.0);
    for line in overview.text.lines() {
        if line.trim().is_empty() {
            layout.space(6.0);
        } else {
            layout.paragraph(line, Font::Regular, 9.0, 0.0, 12.0);
        }
    }
}

fn draw_tables(layout: &mut Layout, tables: &[MetricTable]) {
    layout.new_page();
    for table in tables {
        layout.ensure(22.0);
        layout.band(MARGIN, CONTENT_WIDTH, 18.0, TABLE_HEADER);
        let top = layout.cursor();
        layout.set_cursor(top - 4.0);
        layout.text_at(&table.group, Font::Bold, 9.0, MARGIN + 4.0, BLACK);
        layout.set_cursor(top - 18.0);

        for (label, value) in &table.rows {
            layout.ensure(16.0);
            layout.frame(MARGIN, LABEL_COLUMN, 16.0);
            layout.frame(MARGIN + LABEL_COLUMN, CONTENT_WIDTH - LABEL_COLUMN, 16.0);
            let top = layout.cursor();
            layout.set_cursor(top - 3.0);
            layout.text_at(label, Font::Regular, 10.0, MARGIN + 4.0, BLACK);
            layout.text_at(value, Font::Regular, 10.0, MARGIN + LABEL_COLUMN + 4.0, BLACK);
            layout.set_cursor(top - 16.0);
        }
        layout.space(12.0);
    }
}

fn draw_chart(layout: &mut Layout, spec: &ChartSpec, image_name: &str) {
    let height = CONTENT_WIDTH * CHART_HEIGHT as f32 / CHART_WIDTH as f32;
    layout.ensure(18.0 + height + 30.0);
    layout.space(8.0);
    layout.line(&spec.title, Font::Bold, 11.0, Align::Centre, 18.0);
    layout.image(image_name, CONTENT_WIDTH, height);

    let left = MARGIN;
    let top = layout.cursor();
    for (bar, centre) in spec.bars.iter().zip(spec.bar_centres()) {
        let x = left + centre * CONTENT_WIDTH;
        let value = group_thousands(bar.value);
        layout.set_cursor(top - 3.0);
        layout.text_at(
            &bar.label,
            Font::Regular,
            8.0,
            x - Font::Regular.width(&bar.label, 8.0) / 2.0,
            BLACK,
        );
        layout.set_cursor(top - 13.0);
        layout.text_at(
            &value,
            Font::Bold,
            8.0,
            x - Font::Bold.width(&value, 8.0) / 2.0,
            BLACK,
        );
    }
    layout.set_cursor(top - 30.0);
}

fn draw_detail(layout: &mut Layout, blocks: &[NarrativeBlock]) {
    layout.new_page();
    layout.line("Detailed Analysis", Font::Bold, 12.0, Align::Left, 18.0);
    for block in blocks {
        match block {
            NarrativeBlock::Heading(text) => {
                layout.space(5.0);
                layout.paragraph(text, Font::Bold, 11.0, 0.0, 16.0);
            }
            NarrativeBlock::Bullet(text) => layout.paragraph(text, Font::Regular, 9.0, 20.0, 12.0),
            NarrativeBlock::Paragraph(text) => layout.paragraph(text, Font::Regular, 9.0, 0.0, 12.0),
        }
    }
}

/// `1234567` → `1,234,567`.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::DocumentComposer;
    use chrono::NaiveDate;
    use tenantpulse_core::{
        CanonicalRecord, LookbackWindow, PlanTier, RawFacts, RawValue, Region, TenantId,
        TenantIdentity, normalize,
    };

    fn record() -> CanonicalRecord {
        record_for("wayne enterprises")
    }

    fn record_for(customer: &str) -> CanonicalRecord {
        let identity = TenantIdentity {
            customer: customer.to_string(),
            tenant_id: TenantId::new(3),
            plan: PlanTier::Enterprise,
            schema_name: Some("tenant_wayne".to_string()),
            external_crm_id: None,
            region: Region::Us,
        };
        let facts = RawFacts::single_row(
            LookbackWindow::new(2).unwrap(),
            [
                ("logged_in_count", RawValue::Integer(1500)),
                ("active_count", RawValue::Integer(900)),
                ("live_contracts", RawValue::Integer(320)),
                ("updated_live_contracts", RawValue::Integer(41)),
            ],
        );
        normalize(&identity, &facts).unwrap()
    }

    fn document() -> Document {
        let narrative = "0. Overview\nWayne Enterprises is growing \u{2013} adoption is up.\n\
                         1. Document Management & Compliance\n- Coverage is strong\n\
                         2. Ownership\nMost contracts are owned.";
        DocumentComposer::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .compose(&record(), narrative)
            .unwrap()
    }

    #[test]
    fn renders_a_loadable_pdf_with_all_sections() {
        let bytes = PdfRenderer::new().render(&document()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        // Cover + overview, tables + charts, detailed analysis.
        assert!(loaded.get_pages().len() >= 3);
    }

    #[test]
    fn scratch_directory_is_removed_after_render() {
        let root = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::with_scratch_root(root.path());
        renderer.render(&document()).unwrap();
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_directory_is_removed_when_rendering_fails() {
        let root = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::with_scratch_root(root.path());

        let err = renderer
            .with_scratch(|scratch| -> Result<(), RenderError> {
                std::fs::write(scratch.join("Im1.png"), b"partial")?;
                Err(RenderError::Chart("encoder gave up".to_string()))
            })
            .unwrap_err();

        assert!(matches!(err, RenderError::Chart(ref msg) if msg == "encoder gave up"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn accented_customer_names_are_drawn_in_win_ansi() {
        let document = DocumentComposer::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .compose(&record_for("caf\u{e9} z\u{fc}rich"), "Steady \u{2013} na\u{ef}ve users.")
            .unwrap();
        let bytes = PdfRenderer::new().render(&document).unwrap();
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();

        let mut drawn: Vec<Vec<u8>> = Vec::new();
        for page_id in loaded.get_pages().into_values() {
            let content = Content::decode(&loaded.get_page_content(page_id).unwrap()).unwrap();
            for op in content.operations.into_iter().filter(|op| op.operator == "Tj") {
                if let Some(Object::String(text, _)) = op.operands.into_iter().next() {
                    drawn.push(text);
                }
            }
        }

        assert!(drawn.iter().any(|t| t.as_slice() == b"Caf\xe9 Z\xfcrich"));
        assert!(
            drawn
                .iter()
                .any(|t| t.windows(7).any(|w| w == b"\x96 na\xefve".as_slice()))
        );
    }

    #[test]
    fn missing_scratch_root_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");
        let err = PdfRenderer::with_scratch_root(&missing)
            .render(&document())
            .unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
