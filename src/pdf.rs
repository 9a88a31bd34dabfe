use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Pt, Px, TextMatrix,
};
use tracing::{debug, info};

use crate::charts::ChartArtifact;
use crate::document::{ReportBlock, ReportDocument, wrap_text};
use crate::error::{Result, SalesReportError};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const PAGE_MARGIN: f32 = 72.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * PAGE_MARGIN;

const TITLE_SIZE: f32 = 18.0;
const CHART_TITLE_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const TICK_SIZE: f32 = 7.0;
const LINE_HEIGHT: f32 = 14.0;

const BAR_IMAGE: (f32, f32) = (450.0, 250.0);
const PIE_IMAGE: (f32, f32) = (250.0, 250.0);
const TICK_AREA: f32 = 66.0;
const IMAGE_DPI: f32 = 300.0;
const MAX_TICK_CHARS: usize = 24;

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Rough Helvetica advance width, used to centre and wrap text.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Places blocks top to bottom, starting a new A4 page when one does not fit.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> PageCursor<'a> {
    fn reserve(&mut self, height: f32) {
        if self.y - height < PAGE_MARGIN && self.y < PAGE_HEIGHT - PAGE_MARGIN {
            let (page, layer) = self
                .doc
                .add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), format!("Page {}", self.pages + 1));
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - PAGE_MARGIN;
            self.pages += 1;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, mm(x), mm(y), font);
    }

    fn rotated_text(&self, text: &str, size: f32, x: f32, y: f32, font: &IndirectFontRef) {
        self.layer.begin_text_section();
        self.layer.set_font(font, size);
        self.layer
            .set_text_matrix(TextMatrix::TranslateRotate(Pt(x), Pt(y), 45.0));
        self.layer.write_text(text, font);
        self.layer.end_text_section();
    }
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_TICK_CHARS {
        label.to_string()
    } else {
        let cut: String = label.chars().take(MAX_TICK_CHARS - 3).collect();
        format!("{cut}...")
    }
}

fn embed_chart(cursor: &mut PageCursor<'_>, fonts: &Fonts, chart: &ChartArtifact) -> Result<()> {
    let (image_width, image_height) = if chart.kind.is_square() {
        PIE_IMAGE
    } else {
        BAR_IMAGE
    };
    let tick_area = if chart.ticks.is_empty() { 0.0 } else { TICK_AREA };
    let legend_height = chart.legend.len() as f32 * LINE_HEIGHT;
    cursor.reserve(LINE_HEIGHT + image_height + tick_area + legend_height);

    let left = PAGE_MARGIN + (CONTENT_WIDTH - image_width) / 2.0;
    let title_x = PAGE_MARGIN + (CONTENT_WIDTH - text_width(&chart.title, CHART_TITLE_SIZE)) / 2.0;
    cursor.y -= CHART_TITLE_SIZE;
    cursor.text(&chart.title, CHART_TITLE_SIZE, title_x, cursor.y, &fonts.bold);
    cursor.y -= LINE_HEIGHT - CHART_TITLE_SIZE + 4.0;

    let expected = (chart.width * chart.height * 3) as usize;
    if chart.pixels.len() != expected {
        return Err(SalesReportError::report_build(
            format!("chart {}", chart.kind.key()),
            format!(
                "bitmap holds {} bytes, expected {expected} for {}x{}",
                chart.pixels.len(),
                chart.width,
                chart.height
            ),
        ));
    }
    let bottom = cursor.y - image_height;
    let natural_width = chart.width as f32 / IMAGE_DPI * 72.0;
    let natural_height = chart.height as f32 / IMAGE_DPI * 72.0;
    let image = Image::from(ImageXObject {
        width: Px(chart.width as usize),
        height: Px(chart.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: chart.pixels.clone(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    });
    image.add_to_layer(
        cursor.layer.clone(),
        ImageTransform {
            translate_x: Some(mm(left)),
            translate_y: Some(mm(bottom)),
            scale_x: Some(image_width / natural_width),
            scale_y: Some(image_height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
    cursor.y = bottom;

    if !chart.y_label.is_empty() {
        let top_value = crate::document::format_currency(chart.y_range.1);
        cursor.text(
            &format!("{} ({top_value})", chart.y_label),
            TICK_SIZE,
            left,
            bottom + image_height + 2.0,
            &fonts.regular,
        );
    }

    // Labels run up and to the right, ending just under their bar.
    for tick in &chart.ticks {
        let label = truncate_label(&tick.label);
        let run = text_width(&label, TICK_SIZE) * std::f32::consts::FRAC_1_SQRT_2;
        let x = left + tick.x as f32 * image_width;
        cursor.rotated_text(
            &label,
            TICK_SIZE,
            x - run,
            bottom - 4.0 - run,
            &fonts.regular,
        );
    }
    cursor.y -= tick_area;

    if !chart.x_label.is_empty() {
        let x = PAGE_MARGIN + (CONTENT_WIDTH - text_width(&chart.x_label, BODY_SIZE)) / 2.0;
        cursor.text(&chart.x_label, BODY_SIZE, x, cursor.y, &fonts.regular);
    }

    for entry in &chart.legend {
        cursor.y -= LINE_HEIGHT;
        let [r, g, b] = entry.color;
        let swatch = format!("#{r:02x}{g:02x}{b:02x}");
        cursor.text(
            &format!("{}  ({swatch})", entry.label),
            BODY_SIZE,
            left,
            cursor.y,
            &fonts.regular,
        );
    }
    debug!(chart = chart.kind.key(), pages = cursor.pages, "embedded chart");
    Ok(())
}

/// Lay the document out on A4 pages and serialize it.
pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>> {
    let doc_error = |err: printpdf::Error| SalesReportError::report_build("document", err);

    let (doc, page, layer) =
        PdfDocument::new(document.title(), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(doc_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(doc_error)?,
    };

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - PAGE_MARGIN,
        pages: 1,
    };

    let max_chars = (CONTENT_WIDTH / (BODY_SIZE * 0.5)) as usize;
    for block in document.blocks() {
        match block {
            ReportBlock::Title(title) => {
                cursor.reserve(TITLE_SIZE + 6.0);
                cursor.y -= TITLE_SIZE;
                let x = PAGE_MARGIN + (CONTENT_WIDTH - text_width(title, TITLE_SIZE)) / 2.0;
                cursor.text(title, TITLE_SIZE, x, cursor.y, &fonts.bold);
                cursor.y -= 6.0;
            }
            ReportBlock::Paragraph(text) => {
                for line in wrap_text(text, max_chars) {
                    cursor.reserve(LINE_HEIGHT);
                    cursor.y -= LINE_HEIGHT;
                    cursor.text(&line, BODY_SIZE, PAGE_MARGIN, cursor.y, &fonts.regular);
                }
                cursor.y -= LINE_HEIGHT;
            }
            ReportBlock::Metrics(lines) => {
                let value_x = PAGE_MARGIN
                    + lines
                        .iter()
                        .map(|line| text_width(&line.label, BODY_SIZE))
                        .fold(0.0, f32::max)
                    + 16.0;
                for line in lines {
                    cursor.reserve(LINE_HEIGHT);
                    cursor.y -= LINE_HEIGHT;
                    cursor.text(
                        &format!("{}:", line.label),
                        BODY_SIZE,
                        PAGE_MARGIN,
                        cursor.y,
                        &fonts.bold,
                    );
                    cursor.text(&line.value, BODY_SIZE, value_x, cursor.y, &fonts.regular);
                }
            }
            ReportBlock::Chart(chart) => embed_chart(&mut cursor, &fonts, chart)?,
            ReportBlock::Spacer(height) => cursor.y -= height,
        }
    }

    let pages = cursor.pages;
    drop(cursor);
    let bytes = doc.save_to_bytes().map_err(doc_error)?;
    info!(pages, bytes = bytes.len(), "rendered PDF report");
    Ok(bytes)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(path);
    let result = (|| {
        let mut file = fs::File::create(&partial)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&partial, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

/// Render `document` and write it to `path`. Either the complete file
/// appears at `path` or nothing is written there.
pub fn write_pdf(document: &ReportDocument, path: &Path) -> Result<()> {
    let bytes = render_pdf(document)?;
    write_atomically(path, &bytes).map_err(|err| {
        SalesReportError::report_build(format!("document {}", path.display()), err)
    })?;
    info!(path = %path.display(), "wrote PDF report");
    Ok(())
}
