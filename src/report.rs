use std::fs;
use std::path::{Path, PathBuf};
use log::info;
use plotters::prelude::*;
use thiserror::Error;
use crate::config::ReportParameters;
use crate::models::ForecastResponse;

/// Number of upcoming hours covered by the report
const REPORT_HOURS: usize = 24;

const TITLE: &str = "Temperature and AVG Humidity forecast";
const CHART_SIZE: (u32, u32) = (1000, 600);

/// Anything that can turn a forecast into a report file
pub trait ReportRenderer {
    /// Renders the report and returns the path to it
    ///
    /// # Arguments
    ///
    /// * 'forecast' - hourly forecast
    fn render(&self, forecast: &ForecastResponse) -> Result<PathBuf, ReportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub hour: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

/// The tabular data behind the daily chart
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
    pub average_humidity: Option<f64>,
}

impl ReportTable {
    /// Builds the table from the first 24 hours of the forecast, or fewer if that is all there is
    ///
    /// # Arguments
    ///
    /// * 'forecast' - hourly forecast
    pub fn from_forecast(forecast: &ForecastResponse) -> ReportTable {
        let rows = forecast.hourly
            .iter()
            .take(REPORT_HOURS)
            .map(|h| ReportRow {
                hour: h.valid_time().map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
                temperature: h.temp,
                feels_like: h.feels_like,
                humidity: h.humidity,
            })
            .collect::<Vec<ReportRow>>();

        let average_humidity = if rows.is_empty() {
            None
        } else {
            let sum = rows.iter().map(|r| r.humidity).sum::<f64>();
            Some(round_to_two_decimals(sum / rows.len() as f64))
        };

        ReportTable { rows, average_humidity }
    }

    /// Returns the x axis description carrying the daily average humidity
    pub fn humidity_label(&self) -> String {
        match self.average_humidity {
            Some(avg) => format!("Hour of the Day (UTC), AVG Humidity for today: {:.2}%", avg),
            None => "Hour of the Day (UTC), AVG Humidity for today: n/a".to_string(),
        }
    }

    /// Returns a y range covering both temperature series with some headroom for the annotations
    fn temperature_range(&self) -> (f64, f64) {
        let (min, max) = self.rows.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), r| (min.min(r.temperature).min(r.feels_like), max.max(r.temperature).max(r.feels_like)));

        if min > max {
            (0.0, 1.0)
        } else {
            (min - 1.0, max + 2.0)
        }
    }
}

/// Struct for rendering the daily report as a PNG chart
pub struct ChartReport {
    output_dir: PathBuf,
    path: PathBuf,
}

impl ChartReport {
    /// Returns a new ChartReport writing to the configured file
    ///
    /// # Arguments
    ///
    /// * 'config' - report configuration
    pub fn new(config: &ReportParameters) -> ChartReport {
        ChartReport {
            output_dir: config.output_dir.clone(),
            path: config.output_dir.join(&config.file_name),
        }
    }
}

impl ReportRenderer for ChartReport {
    fn render(&self, forecast: &ForecastResponse) -> Result<PathBuf, ReportError> {
        let table = ReportTable::from_forecast(forecast);

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ReportError::FileError(format!("{}: {}", self.output_dir.display(), e)))?;

        draw_chart(&table, &self.path)
            .map_err(|e| ReportError::DrawError(e.to_string()))?;

        info!("Report with {} hours rendered to {}, {}", table.rows.len(), self.path.display(), table.humidity_label());

        Ok(self.path.clone())
    }
}

/// Draws temperature and feels like temperature as annotated marker series
///
/// # Arguments
///
/// * 'table' - report data
/// * 'path' - image file to write, any existing file is overwritten
fn draw_chart(table: &ReportTable, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = table.temperature_range();
    let segments = table.rows.len().max(1) as u32;
    let labels = table.rows.iter().map(|r| r.hour.clone()).collect::<Vec<String>>();

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..segments).into_segmented(), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(segments as usize)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_label_style(("sans-serif", 11))
        .x_desc(table.humidity_label())
        .y_desc("°C")
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    let series: [(&str, RGBColor, fn(&ReportRow) -> f64); 2] = [
        ("Temperature", BLUE, |r: &ReportRow| r.temperature),
        ("Perceivable temperature", RED, |r: &ReportRow| r.feels_like),
    ];

    for (label, color, value) in series {
        chart
            .draw_series(table.rows.iter().enumerate().map(|(i, r)| {
                let v = value(r);
                EmptyElement::at((SegmentValue::CenterOf(i as u32), v))
                    + Circle::new((0, 0), 5, color.filled())
                    + Text::new(format!("{:.2}°C", v), (-16, -16), ("sans-serif", 10).into_font())
            }))?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;

    Ok(())
}

/// Rounds values to two decimals
///
/// # Arguments
///
/// * 'value' - the value to round to two decimals
fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100f64).round() / 100f64
}

/// Error depicting errors that occur while rendering the report
///
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("FileError: {0}")]
    FileError(String),
    #[error("DrawError: {0}")]
    DrawError(String),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use super::*;
    use crate::models::fixtures::{forecast_with_codes, START};

    fn forecast_with_humidity(humidity: &[f64]) -> ForecastResponse {
        let mut forecast = forecast_with_codes(&vec![800; humidity.len()]);
        forecast.hourly.iter_mut().zip(humidity).for_each(|(h, v)| h.humidity = *v);
        forecast
    }

    #[test]
    fn takes_first_twenty_four_hours() {
        let table = ReportTable::from_forecast(&forecast_with_codes(&[800; 48]));

        assert_eq!(table.rows.len(), 24);
        assert_eq!(table.rows[0].hour, "00:00");
        assert_eq!(table.rows[7].hour, "07:00");
        assert_eq!(table.rows[23].hour, "23:00");
        assert_eq!(table.rows[1].temperature, 10.5);
        assert_eq!(table.rows[1].feels_like, 9.5);
    }

    #[test]
    fn labels_use_utc_hour_and_minute() {
        let mut forecast = forecast_with_codes(&[800, 800]);
        forecast.hourly[0].dt = START + 5 * 3600 + 30 * 60;
        forecast.hourly[1].dt = START - 60;

        let table = ReportTable::from_forecast(&forecast);
        assert_eq!(table.rows[0].hour, "05:30");
        assert_eq!(table.rows[1].hour, "23:59");
    }

    #[test]
    fn average_humidity_of_stepped_series() {
        // 50, 52, ..., 96 has a mean of 73
        let humidity = (0..24).map(|i| 50.0 + 2.0 * i as f64).collect::<Vec<f64>>();
        let table = ReportTable::from_forecast(&forecast_with_humidity(&humidity));

        assert_eq!(table.average_humidity, Some(73.0));
        assert_eq!(table.humidity_label(), "Hour of the Day (UTC), AVG Humidity for today: 73.00%");
    }

    #[test]
    fn average_humidity_is_rounded_to_two_decimals() {
        let table = ReportTable::from_forecast(&forecast_with_humidity(&[50.0, 51.0, 51.0]));
        assert_eq!(table.average_humidity, Some(50.67));
    }

    #[test]
    fn average_ignores_hours_beyond_the_report() {
        let mut humidity = vec![80.0; 24];
        humidity.extend([0.0; 6]);
        let table = ReportTable::from_forecast(&forecast_with_humidity(&humidity));

        assert_eq!(table.average_humidity, Some(80.0));
    }

    #[test]
    fn short_forecast_uses_what_is_there() {
        let table = ReportTable::from_forecast(&forecast_with_codes(&[800; 5]));
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.average_humidity, Some(60.0));
    }

    #[test]
    fn empty_forecast_has_no_average() {
        let table = ReportTable::from_forecast(&forecast_with_codes(&[]));

        assert!(table.rows.is_empty());
        assert_eq!(table.average_humidity, None);
        assert_eq!(table.temperature_range(), (0.0, 1.0));
        assert!(table.humidity_label().ends_with("n/a"));
    }

    #[test]
    fn same_input_gives_same_table() {
        let forecast = forecast_with_codes(&[800; 30]);
        assert_eq!(ReportTable::from_forecast(&forecast), ReportTable::from_forecast(&forecast));
    }

    #[test]
    fn temperature_range_covers_both_series() {
        let table = ReportTable::from_forecast(&forecast_with_codes(&[800; 4]));
        // temperatures 10.0..=11.5, feels like 9.0..=10.5
        assert_eq!(table.temperature_range(), (8.0, 13.5));
    }

    #[test]
    fn chart_path_is_inside_output_dir() {
        let config = ReportParameters {
            output_dir: PathBuf::from("/tmp/weather"),
            file_name: "daily_weather.png".to_string(),
        };
        let report = ChartReport::new(&config);
        assert_eq!(report.path, PathBuf::from("/tmp/weather/daily_weather.png"));
    }

    fn chart_report(dir: &TempDir) -> ChartReport {
        ChartReport::new(&ReportParameters {
            output_dir: dir.path().join("sub"),
            file_name: "daily_weather.png".to_string(),
        })
    }

    #[test]
    fn render_writes_png_into_missing_dir() {
        let dir = TempDir::new().unwrap();
        let report = chart_report(&dir);

        let path = report.render(&forecast_with_codes(&[800; 24])).unwrap();

        assert_eq!(path, dir.path().join("sub").join("daily_weather.png"));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn render_twice_gives_identical_file() {
        let dir = TempDir::new().unwrap();
        let report = chart_report(&dir);
        let forecast = forecast_with_codes(&[800; 24]);

        let first = fs::read(report.render(&forecast).unwrap()).unwrap();
        let second = fs::read(report.render(&forecast).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn render_empty_forecast_still_writes_chart() {
        let dir = TempDir::new().unwrap();
        let report = chart_report(&dir);

        let path = report.render(&forecast_with_codes(&[])).unwrap();

        assert!(path.exists());
    }
}
