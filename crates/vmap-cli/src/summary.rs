use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use vmap_cli::render::{expression_text, gate_text, target_text};
use vmap_client::MappingList;
use vmap_map::{LookupResults, ReviewRecord};
use vmap_model::{IssueSeverity, Mapping, MappingStatus, ValidationIssue, ValidationReport};

pub fn print_report(report: &ValidationReport) {
    if report.issues.is_empty() {
        println!("No issues found.");
        return;
    }
    let mut issues: Vec<&ValidationIssue> = report.issues.iter().collect();
    issues.sort_by_key(|issue| severity_rank(issue.severity));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Location"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 1, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            Cell::new(issue.location.to_string()),
            Cell::new(&issue.message),
        ]);
    }
    println!("{table}");
    println!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}

pub fn print_mapping(mapping: &Mapping) {
    let id = mapping.id.map_or_else(|| "(new)".to_string(), |id| id.to_string());
    let status = mapping
        .status
        .map_or_else(|| "-".to_string(), |status| status.to_string());
    println!("Mapping {id} [{status}]");
    println!("Target: {}", target_text(mapping));
    if let Some(description) = mapping.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("Description: {description}");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Rule"),
        header_cell("Gate"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, group) in mapping.groups().iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(expression_text(group)),
            gate_text(group.logic.as_ref()).map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
    if mapping.has_multiple_groups() {
        println!("Groups combined with {}", mapping.condition());
    }
}

pub fn print_review(record: &ReviewRecord) {
    println!("Status: {}", status_cell_text(record));
    match record.notes.as_deref() {
        Some(notes) if !notes.trim().is_empty() => println!("Notes: {notes}"),
        _ => println!("Notes: -"),
    }
}

pub fn print_mapping_list(list: &MappingList) {
    if list.rows.is_empty() {
        println!("No mappings stored.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Target"),
        header_cell("Sources"),
        header_cell("Study"),
        header_cell("Mapped"),
        header_cell("Status"),
        header_cell("Notes"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for row in &list.rows {
        table.add_row(vec![
            Cell::new(row.id).add_attribute(Attribute::Bold),
            Cell::new(row.target()).fg(Color::Blue),
            Cell::new(row.sources().join("\n")),
            Cell::new(&row.study),
            row.date_mapped
                .map_or_else(|| dim_cell("-"), |date| Cell::new(date.to_string())),
            status_cell(&row.status),
            row.notes
                .as_deref()
                .filter(|notes| !notes.trim().is_empty())
                .map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

pub fn print_lookup(results: &LookupResults) {
    if results.is_empty() {
        println!("No matches.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Name"), header_cell("Title"), header_cell("Detail")]);
    apply_table_style(&mut table);
    for schema in &results.schemata {
        table.add_row(vec![
            Cell::new(&schema.name),
            optional_cell(schema.title.as_deref()),
            schema
                .publish_date
                .map_or_else(|| dim_cell("-"), |date| Cell::new(date.to_string())),
        ]);
    }
    for attribute in &results.attributes {
        table.add_row(vec![
            Cell::new(&attribute.name),
            optional_cell(attribute.title.as_deref()),
            attribute
                .kind
                .as_ref()
                .map_or_else(|| dim_cell("-"), |kind| Cell::new(kind.to_string())),
        ]);
    }
    for choice in &results.choices {
        table.add_row(vec![
            Cell::new(&choice.name),
            optional_cell(choice.title.as_deref()),
            dim_cell("-"),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 0,
        IssueSeverity::Warning => 1,
    }
}

fn status_cell_text(record: &ReviewRecord) -> String {
    if record.status.is_final() {
        format!("{} (final)", record.status)
    } else {
        record.status.to_string()
    }
}

/// Status names come from the server and may be outside the known set.
fn status_cell(status: &str) -> Cell {
    let color = match status.parse::<MappingStatus>() {
        Ok(MappingStatus::Approved) => Color::Green,
        Ok(MappingStatus::Rejected) => Color::Red,
        Ok(MappingStatus::InProgress) => Color::Cyan,
        Ok(MappingStatus::Review) => Color::Yellow,
        Err(_) => Color::DarkGrey,
    };
    Cell::new(status).fg(color)
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
