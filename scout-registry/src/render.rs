use crate::{EnrichedRow, RegistryError};

const HEADERS: [&str; 5] = [
    "address_full",
    "google_maps_building_type",
    "google_maps_official",
    "ollama_activity_type",
    "ollama_official",
];

fn cells(row: &EnrichedRow) -> [String; 5] {
    [
        row.address_full.clone(),
        format!("[{}]", row.google_maps_building_type.join(", ")),
        row.google_maps_official.to_string(),
        row.ollama_activity_type.clone(),
        row.ollama_official.to_string(),
    ]
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}

/// Left-aligned plain-text table, one line per row.
pub fn render_table(rows: &[EnrichedRow]) -> String {
    let body: Vec<[String; 5]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for line in &body {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_line = |line: &[String]| {
        line.iter()
            .zip(widths.iter())
            .map(|(cell, w)| pad(cell, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = format_line(header.as_slice());
    out.push('\n');
    for line in &body {
        out.push_str(&format_line(line.as_slice()));
        out.push('\n');
    }
    out
}

pub fn render_json(rows: &[EnrichedRow]) -> Result<String, RegistryError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryRow;

    fn enriched(address: &str, types: &[&str], label: &str) -> EnrichedRow {
        let row = RegistryRow {
            address: address.into(),
            postal_code: "1003".into(),
            city: "Lausanne".into(),
            description: "Boulangerie".into(),
        };
        EnrichedRow {
            address_full: row.address_full(),
            row,
            google_maps_building_type: types.iter().map(|t| t.to_string()).collect(),
            google_maps_official: types.contains(&"bakery"),
            ollama_activity_type: label.into(),
            ollama_official: label == "officiel",
        }
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            enriched("Rue de Bourg 8", &["bakery", "food"], "officiel"),
            enriched("Chemin des Épinettes 2", &[], ""),
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("address_full"));
        assert!(lines[1].contains("[bakery, food]"));
        assert!(lines[2].contains("[]"));

        let col = |line: &str| line.chars().position(|c| c == '[');
        assert_eq!(col(lines[1]), col(lines[2]));
    }

    #[test]
    fn json_keeps_output_columns_only() {
        let rows = vec![enriched("Rue de Bourg 8", &["bakery"], "officiel")];
        let value: serde_json::Value = serde_json::from_str(&render_json(&rows).unwrap()).unwrap();
        let obj = value[0].as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["address_full"], "Rue de Bourg 8, 1003 Lausanne");
        assert_eq!(obj["google_maps_building_type"][0], "bakery");
        assert_eq!(obj["google_maps_official"], true);
        assert_eq!(obj["ollama_activity_type"], "officiel");
        assert_eq!(obj["ollama_official"], true);
    }
}
