use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};

use crate::error::{Error, Result};
use crate::money::FormatPolicy;
use crate::report::{Report, Section, SectionBody, SectionKind};

// US letter.
const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 18.0;
const BOTTOM_MARGIN: f32 = 18.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const FINANCIAL_HEADER_SIZE: f32 = 14.0;
const LIVESTOCK_HEADER_SIZE: f32 = 12.0;

const PT_TO_MM: f32 = 0.3528;

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn ensure_room(&mut self, doc: &PdfDocumentReference, needed: f32) {
        if self.y - needed < BOTTOM_MARGIN {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
            self.layer = doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }
}

/// Deterministic for a given report and policy; the document is complete and
/// openable even when every section is an empty placeholder.
pub fn render(report: &Report, policy: &FormatPolicy) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        &report.title,
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
    };

    cursor.y -= line_height(TITLE_SIZE);
    let title_x = (PAGE_WIDTH - text_width(&report.title, TITLE_SIZE)) / 2.0;
    cursor
        .layer
        .use_text(&report.title, TITLE_SIZE, Mm(title_x.max(MARGIN)), Mm(cursor.y), &bold);
    cursor.y -= line_height(BODY_SIZE) + 2.0;

    let period = format!("Period: {} to {}", report.start, report.end);
    cursor
        .layer
        .use_text(&period, BODY_SIZE, Mm(MARGIN), Mm(cursor.y), &regular);
    cursor.y -= line_height(BODY_SIZE) + 4.0;

    draw_summary(&doc, &mut cursor, report, policy, &regular, &bold);

    for section in &report.sections {
        draw_section(&doc, &mut cursor, section, &regular, &bold);
    }

    doc.save_to_bytes()
        .map_err(|err| Error::Render(err.to_string()))
}

fn draw_summary(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    report: &Report,
    policy: &FormatPolicy,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    cursor.ensure_room(doc, line_height(BODY_SIZE) * 4.0 + 8.0);
    cursor
        .layer
        .use_text("Financial Summary:", BODY_SIZE, Mm(MARGIN), Mm(cursor.y), bold);
    cursor.y -= line_height(BODY_SIZE);

    let lines = [
        format!("Total Revenue: {}", policy.money(report.summary.total_revenue_cents)),
        format!(
            "Total Expenditure: {}",
            policy.money(report.summary.total_expenditure_cents)
        ),
        format!("Profit/Loss: {}", policy.money(report.summary.profit_or_loss_cents)),
    ];
    for line in &lines {
        cursor
            .layer
            .use_text(line, BODY_SIZE, Mm(MARGIN), Mm(cursor.y), regular);
        cursor.y -= line_height(BODY_SIZE);
    }
    cursor.y -= 6.0;
}

fn draw_section(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    section: &Section,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    cursor.ensure_room(doc, line_height(HEADING_SIZE) + row_height(BODY_SIZE) * 2.0);
    cursor
        .layer
        .use_text(&section.title, HEADING_SIZE, Mm(MARGIN), Mm(cursor.y), bold);
    cursor.y -= line_height(HEADING_SIZE) + 1.0;

    match &section.body {
        SectionBody::Empty { message } => {
            cursor
                .layer
                .use_text(message, BODY_SIZE, Mm(MARGIN), Mm(cursor.y), regular);
            cursor.y -= line_height(BODY_SIZE) + 6.0;
        }
        SectionBody::Table { header, rows } => {
            let header_size = match section.kind {
                SectionKind::Financial => FINANCIAL_HEADER_SIZE,
                SectionKind::Livestock => LIVESTOCK_HEADER_SIZE,
            };
            draw_table(doc, cursor, header, rows, header_size, regular, bold);
            cursor.y -= 6.0;
        }
    }
}

fn draw_table(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    header: &[String],
    rows: &[Vec<String>],
    header_size: f32,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let columns = header.len().max(1);
    let table_width = PAGE_WIDTH - 2.0 * MARGIN;
    let col_width = table_width / columns as f32;

    draw_row(doc, cursor, header, bold, header_size, col_width, columns);
    // Double rule sets the header row apart from the body.
    rule(&cursor.layer, MARGIN, cursor.y + 0.7, MARGIN + table_width, cursor.y + 0.7);

    for row in rows {
        draw_row(doc, cursor, row, regular, BODY_SIZE, col_width, columns);
    }
    rule(&cursor.layer, MARGIN, cursor.y, MARGIN + table_width, cursor.y);
}

fn draw_row(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    cells: &[String],
    font: &IndirectFontRef,
    size: f32,
    col_width: f32,
    columns: usize,
) {
    let height = row_height(size);
    cursor.ensure_room(doc, height);
    let top = cursor.y;
    let bottom = top - height;
    let table_width = col_width * columns as f32;

    cursor.layer.set_outline_thickness(0.4);
    rule(&cursor.layer, MARGIN, top, MARGIN + table_width, top);
    for column in 0..=columns {
        let x = MARGIN + column as f32 * col_width;
        rule(&cursor.layer, x, top, x, bottom);
    }

    for (column, cell) in cells.iter().enumerate().take(columns) {
        let x = MARGIN + column as f32 * col_width + 1.5;
        cursor
            .layer
            .use_text(fit(cell, col_width, size), size, Mm(x), Mm(bottom + 1.8), font);
    }
    cursor.y = bottom;
}

fn rule(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM + 1.8
}

fn row_height(size: f32) -> f32 {
    size * PT_TO_MM + 3.2
}

// Helvetica averages roughly half an em per glyph; close enough to center a
// title and clip cells without embedding font metrics.
fn char_width(size: f32) -> f32 {
    size * PT_TO_MM * 0.52
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * char_width(size)
}

fn fit(text: &str, col_width: f32, size: f32) -> String {
    let max_chars = ((col_width - 3.0) / char_width(size)).max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn render_err(err: printpdf::Error) -> Error {
    Error::Render(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Section, SectionBody, SectionKind};
    use crate::summary::FinancialSummary;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn placeholder(title: &str, kind: SectionKind) -> Section {
        Section {
            title: title.to_string(),
            kind,
            body: SectionBody::Empty {
                message: "No records found for this period.".to_string(),
            },
        }
    }

    #[test]
    fn renders_openable_pdf_when_all_sections_are_placeholders() {
        let report = Report {
            title: "Farm Report - All".to_string(),
            start: day("2024-03-01"),
            end: day("2024-03-31"),
            summary: FinancialSummary::default(),
            sections: vec![
                placeholder("Revenue Records", SectionKind::Financial),
                placeholder("Expenditure Records", SectionKind::Financial),
                placeholder("Classification Records", SectionKind::Livestock),
            ],
        };
        let bytes = render(&report, &FormatPolicy::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_tables_spill_onto_additional_pages() {
        let rows: Vec<Vec<String>> = (0..120)
            .map(|i| {
                vec![
                    format!("Entry {i}"),
                    "1,000.00".to_string(),
                    "2024-03-10 09:00:00".to_string(),
                ]
            })
            .collect();
        let report = Report {
            title: "Farm Report - Revenue".to_string(),
            start: day("2024-03-01"),
            end: day("2024-03-31"),
            summary: FinancialSummary::default(),
            sections: vec![Section {
                title: "Revenue Records".to_string(),
                kind: SectionKind::Financial,
                body: SectionBody::Table {
                    header: vec!["Name".into(), "Amount (₹)".into(), "Date".into()],
                    rows,
                },
            }],
        };
        let bytes = render(&report, &FormatPolicy::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // 120 body rows cannot fit one letter page: the page tree node plus
        // at least two page objects.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.matches("/Type /Page").count() >= 3);
    }

    #[test]
    fn title_centering_stays_inside_the_page() {
        let title = "Farm Report - All";
        let width = text_width(title, TITLE_SIZE);
        assert!(width > text_width("Farm", TITLE_SIZE));
        assert!(width < PAGE_WIDTH - 2.0 * MARGIN);
        let x = (PAGE_WIDTH - width) / 2.0;
        assert!(x > MARGIN);

        // Absurdly wide titles clamp to the margin instead of running off the
        // left edge.
        let wide = (PAGE_WIDTH - text_width(&"x".repeat(400), TITLE_SIZE)) / 2.0;
        assert_eq!(wide.max(MARGIN), MARGIN);
    }

    #[test]
    fn cell_text_is_clipped_to_column_width() {
        let clipped = fit(&"x".repeat(200), 30.0, 10.0);
        assert!(clipped.ends_with("..."));
        assert!(clipped.chars().count() < 40);
    }
}
