// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for the CLI

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use graphmatch::{OutputValue, QueryResult, QueryTelemetry};

use super::commands::OutputFormat;

pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format(result: &QueryResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(result),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::Csv => Self::format_csv(result),
        }
    }

    fn format_table(result: &QueryResult) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(result.columns.iter());
        for row in &result.rows {
            table.add_row(row.iter().map(Self::cell));
        }

        let footer = match result.len() {
            1 => "1 row".to_string(),
            n => format!("{} rows", n),
        };
        format!("{}\n{} ({} matches)", table, footer, result.matched)
    }

    fn format_json(result: &QueryResult) -> String {
        result
            .to_json()
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_csv(result: &QueryResult) -> String {
        Self::write_csv(result).unwrap_or_else(|e| format!("CSV error: {}", e))
    }

    fn write_csv(result: &QueryResult) -> Result<String, Box<dyn std::error::Error>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&result.columns)?;
        for row in &result.rows {
            writer.write_record(row.iter().map(|value| match value {
                OutputValue::Null => String::new(),
                other => other.to_string(),
            }))?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        let mut text = String::from_utf8(bytes)?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    fn cell(value: &OutputValue) -> String {
        match value {
            OutputValue::Null => "NULL".to_string(),
            other => other.to_string(),
        }
    }

    /// Colored per-stage timing report
    pub fn format_timings(telemetry: &QueryTelemetry) -> String {
        let mut out = format!("{}", "Timings:".bold().green());
        for timing in telemetry.timings() {
            out.push_str(&format!(
                "\n  {} {}",
                format!("{:<8}", timing.stage).cyan(),
                format!("{:>10.3} ms", timing.millis()).yellow()
            ));
        }
        out.push_str(&format!(
            "\n  {} {}",
            format!("{:<8}", "total").bold(),
            format!("{:>10.3} ms", telemetry.total().as_secs_f64() * 1000.0).bold()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QueryResult {
        QueryResult {
            columns: vec!["name".into(), "n".into()],
            rows: vec![
                vec![OutputValue::Str("a,b".into()), OutputValue::Int(2)],
                vec![OutputValue::Null, OutputValue::Int(1)],
            ],
            matched: 3,
        }
    }

    #[test]
    fn test_csv_quoting_and_nulls() {
        let csv = ResultFormatter::format(&result(), OutputFormat::Csv);
        assert_eq!(csv, "name,n\n\"a,b\",2\n,1");

        let quoted = QueryResult {
            columns: vec!["say \"hi\"".into()],
            rows: vec![vec![OutputValue::Str("line\nbreak".into())]],
            matched: 1,
        };
        assert_eq!(
            ResultFormatter::format(&quoted, OutputFormat::Csv),
            "\"say \"\"hi\"\"\"\n\"line\nbreak\""
        );
    }

    #[test]
    fn test_table_lists_rows() {
        let table = ResultFormatter::format(&result(), OutputFormat::Table);
        assert!(table.contains("NULL"));
        assert!(table.ends_with("2 rows (3 matches)"));
    }

    #[test]
    fn test_json_is_valid() {
        let json = ResultFormatter::format(&result(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["matched"], 3);
    }
}
