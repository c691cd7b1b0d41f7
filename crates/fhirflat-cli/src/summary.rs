use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fhirflat_cli::pipeline::BatchResult;
use fhirflat_model::{DocumentOutcome, DocumentStatus, ExportSummary};

pub fn print_batch_summary(result: &BatchResult) {
    println!("Input: {}", result.input_dir.display());
    let summary = &result.summary;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Documents"),
        header_cell("Persisted"),
        header_cell("Skipped"),
        header_cell("Failed"),
        header_cell("Not JSON"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.total).add_attribute(Attribute::Bold),
        count_cell(summary.persisted, Color::Green),
        count_cell(summary.skipped, Color::Yellow),
        count_cell(summary.failed, Color::Red),
        count_cell(result.rejected.len(), Color::Yellow),
    ]);
    println!("{table}");
    print_outcome_table(&result.outcomes);
}

fn print_outcome_table(outcomes: &[DocumentOutcome]) {
    let notable: Vec<&DocumentOutcome> = outcomes
        .iter()
        .filter(|outcome| !outcome.is_persisted() || !outcome.child_failures.is_empty())
        .collect();
    if notable.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Status"),
        header_cell("Stage"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    for outcome in notable {
        let (status, detail) = match &outcome.status {
            DocumentStatus::Persisted => (
                Cell::new("persisted").fg(Color::Green),
                outcome.child_failures.join("\n"),
            ),
            DocumentStatus::Skipped { reason } => (
                Cell::new("skipped").fg(Color::Yellow),
                reason.as_str().to_string(),
            ),
            DocumentStatus::Failed { message } => (
                Cell::new("failed")
                    .fg(Color::Red)
                    .add_attribute(Attribute::Bold),
                message.clone(),
            ),
        };
        table.add_row(vec![
            Cell::new(&outcome.source_id),
            status,
            dim_cell(format!("{:?}", outcome.stage).to_lowercase()),
            Cell::new(detail),
        ]);
    }
    println!("{table}");
}

pub fn print_export_summary(summary: &ExportSummary) {
    println!("Output: {}", summary.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Patients"),
        header_cell("Summary files"),
        header_cell("Event files"),
        header_cell("Failures"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.patients).add_attribute(Attribute::Bold),
        Cell::new(summary.summary_files),
        Cell::new(summary.event_files),
        count_cell(summary.failures.len(), Color::Red),
    ]);
    println!("{table}");
    if summary.has_failures() {
        eprintln!("Errors:");
        for failure in &summary.failures {
            eprintln!("- {}: {}", failure.subject, failure.message);
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
