use crate::model::HostRecord;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

/// Console table of a finished scan
pub fn render(records: &[HostRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    table.set_header(vec!["IP", "Status", "Latency", "Hostname", "MAC", "Vendor", "Ports"]);

    for record in records {
        let status = if record.is_reachable() {
            Cell::new(record.status).fg(Color::Green)
        } else {
            Cell::new(record.status).fg(Color::Red)
        };
        let latency = record
            .latency_ms
            .map_or("—".to_string(), |l| format!("{:.1} ms", l));
        let ports = if record.open_ports.is_empty() {
            "—".to_string()
        } else {
            record
                .open_ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        table.add_row(vec![
            Cell::new(record.address),
            status,
            Cell::new(latency),
            Cell::new(&record.hostname),
            Cell::new(&record.mac_address),
            Cell::new(&record.vendor),
            Cell::new(ports),
        ]);
    }

    table
}
