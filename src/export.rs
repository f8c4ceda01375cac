use crate::types::{AggregatedRow, FacilityCounts, FilterState};
use crate::util::format_int;
use anyhow::{anyhow, Context, Result};
use docx_rs::{AlignmentType, Docx, Paragraph, Run, Table as DocxTable, TableCell, TableRow};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table};

/// File name for an exported artifact, embedding the active range and the
/// facility key when one is selected: `checkins_2024-01-01_2024-01-31_pool.xlsx`.
pub fn export_file_name(filter: &FilterState, ext: &str) -> String {
    match filter.facility {
        Some(f) => format!("checkins_{}_{}_{}.{}", filter.from, filter.to, f.key(), ext),
        None => format!("checkins_{}_{}.{}", filter.from, filter.to, ext),
    }
}

/// Title line shared by the PDF, the Word document, and the print view.
pub fn report_title(filter: &FilterState) -> String {
    match filter.facility {
        Some(f) => format!(
            "รายงานผู้เข้าใช้สนามกีฬา (ช่วง {}, {})",
            filter.range_text(),
            f.display_name()
        ),
        None => format!("รายงานผู้เข้าใช้สนามกีฬา (ช่วง {})", filter.range_text()),
    }
}

/// CSV artifact. The header row is written explicitly so a zero-row export
/// still produces a valid, header-only file.
pub fn export_csv(path: &Path, rows: &[AggregatedRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    wtr.write_record(AggregatedRow::HEADERS)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Spreadsheet artifact: a single sheet named "Counts" with a bold header.
pub fn export_xlsx(path: &Path, rows: &[AggregatedRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Counts")?;
    for (col, header) in AggregatedRow::HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &r.session_date)?;
        sheet.write_string(row, 1, &r.facility_name)?;
        sheet.write_number(row, 2, r.count as f64)?;
    }
    workbook.save(path)?;
    Ok(())
}

/// PDF artifact: A4 portrait, title line, then the table. Starts a new page
/// whenever the cursor runs out of room.
///
/// The built-in Helvetica only covers WinAnsi, so Thai strings rely on
/// viewer font substitution.
pub fn export_pdf(path: &Path, rows: &[AggregatedRow], filter: &FilterState) -> Result<()> {
    // Column x-offsets and the line step, in millimeters.
    let cols = [20.0, 70.0, 150.0];
    let step = 7.0;

    let (doc, page, layer) =
        PdfDocument::new(report_title(filter), Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("pdf font error: {}", e))?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text(report_title(filter), 12.0, Mm(20.0), Mm(282.0), &font);

    let mut y = 270.0;
    for (x, text) in cols.iter().zip(AggregatedRow::HEADERS) {
        current.use_text(text, 10.0, Mm(*x), Mm(y), &font);
    }
    y -= step;

    for r in rows {
        if y < 20.0 {
            let (next_page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = 270.0;
        }
        let cells = [r.session_date.as_str(), r.facility_name.as_str()];
        for (x, text) in cols.iter().zip(cells) {
            current.use_text(text, 10.0, Mm(*x), Mm(y), &font);
        }
        current.use_text(r.count.to_string(), 10.0, Mm(cols[2]), Mm(y), &font);
        y -= step;
    }

    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow!("pdf save error: {}", e))?;
    Ok(())
}

fn docx_cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
}

/// Word artifact: centered heading, range/facility subtitle, then the table.
pub fn export_docx(path: &Path, rows: &[AggregatedRow], filter: &FilterState) -> Result<()> {
    let header = TableRow::new(
        AggregatedRow::HEADERS
            .iter()
            .map(|h| {
                TableCell::new()
                    .add_paragraph(Paragraph::new().add_run(Run::new().add_text(*h).bold()))
            })
            .collect(),
    );
    let mut table_rows = vec![header];
    for r in rows {
        table_rows.push(TableRow::new(vec![
            docx_cell(&r.session_date),
            docx_cell(&r.facility_name),
            docx_cell(&r.count.to_string()),
        ]));
    }

    let subtitle = match filter.facility {
        Some(f) => format!("ช่วง {} ({})", filter.range_text(), f.display_name()),
        None => format!("ช่วง {}", filter.range_text()),
    };

    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Docx::new()
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("รายงานผู้เข้าใช้สนามกีฬา").bold().size(32))
                .align(AlignmentType::Center),
        )
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(subtitle)))
        .add_table(DocxTable::new(table_rows))
        .build()
        .pack(file)
        .map_err(|e| anyhow!("docx pack error: {:?}", e))?;
    Ok(())
}

/// Write all four artifacts from the same row snapshot, guaranteeing they
/// are content-identical modulo presentation. Returns the written paths.
pub fn export_all(
    dir: &Path,
    rows: &[AggregatedRow],
    filter: &FilterState,
) -> Result<Vec<PathBuf>> {
    let xlsx = dir.join(export_file_name(filter, "xlsx"));
    let pdf = dir.join(export_file_name(filter, "pdf"));
    let docx = dir.join(export_file_name(filter, "docx"));
    let csv = dir.join(export_file_name(filter, "csv"));
    export_xlsx(&xlsx, rows)?;
    export_pdf(&pdf, rows, filter)?;
    export_docx(&docx, rows, filter)?;
    export_csv(&csv, rows)?;
    Ok(vec![xlsx, pdf, docx, csv])
}

/// Print view: the rendered table straight to the terminal, no document
/// constructed.
pub fn print_report(rows: &[AggregatedRow], counts: &FacilityCounts, filter: &FilterState) {
    println!("\n{}\n", report_title(filter));
    if rows.is_empty() {
        println!("(no rows)\n");
    } else {
        let slice: Vec<AggregatedRow> = rows.to_vec();
        let table = Table::new(slice).with(Style::markdown()).to_string();
        println!("{}\n", table);
    }
    println!("รวมทั้งหมด: {}\n", format_int(counts.total as i64));
}
