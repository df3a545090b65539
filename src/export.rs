use crate::reading::HistorySeries;
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Semicolon-separated, same columns as the sensor's daily log files
    Csv,
    Json,
}

/// Writes `series` oldest first.
pub fn write_series<W: Write>(series: &HistorySeries, format: ExportFormat, writer: W) -> anyhow::Result<()> {
    match format {
        ExportFormat::Csv => write_csv(series, writer),
        ExportFormat::Json => {
            let readings: Vec<_> = series.chronological().collect();
            serde_json::to_writer_pretty(writer, &readings)?;
            Ok(())
        }
    }
}

fn write_csv<W: Write>(series: &HistorySeries, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    csv.write_record(["Time", "Temperature", "Humidity"])?;
    for reading in series.chronological() {
        csv.write_record([
            reading.datetime.clone(),
            reading.temperature.to_string(),
            reading.humidity.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;

    fn series() -> HistorySeries {
        HistorySeries::from(vec![
            Reading { datetime: "2024-05-01 12:01:00".into(), temperature: 21.5, humidity: 40.0 },
            Reading { datetime: "2024-05-01 12:00:00".into(), temperature: 21.0, humidity: 41.2 },
        ])
    }

    #[test]
    fn csv_matches_log_layout() {
        let mut out = Vec::new();
        write_series(&series(), ExportFormat::Csv, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Time;Temperature;Humidity\n\
             2024-05-01 12:00:00;21;41.2\n\
             2024-05-01 12:01:00;21.5;40\n"
        );
    }

    #[test]
    fn json_is_oldest_first() {
        let mut out = Vec::new();
        write_series(&series(), ExportFormat::Json, &mut out).unwrap();

        let parsed: Vec<Reading> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0].datetime, "2024-05-01 12:00:00");
        assert_eq!(parsed[1].temperature, 21.5);
    }
}
