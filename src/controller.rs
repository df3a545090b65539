//! Dashboard controller.
//!
//! Owns all dashboard state: the view flags, the last fetched history series
//! and the chart. It never performs I/O. Operations that need the network
//! return a `HistoryRequest` for the scheduler to execute, and the outcome is
//! handed back through `complete_history`. Toggling and hiding only ever
//! re-render from the cached series.

use crate::chart::{LineChart, HUMIDITY, TEMPERATURE};
use crate::page::{Display, ElementId, Page, Size, TableRow, SHOW_GRAPH_LABEL, SHOW_TABLE_LABEL};
use crate::reading::{HistorySeries, LatestReading};
use chrono::{DateTime, Local};
use tracing::debug;

pub const FLASH_CLASS: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Table,
    Graph,
}

impl ViewKind {
    fn flipped(self) -> Self {
        match self {
            ViewKind::Table => ViewKind::Graph,
            ViewKind::Graph => ViewKind::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub current_view: ViewKind,
    pub historical_data_visible: bool,
    pub current_history_hours: u32,
}

impl ViewState {
    pub fn new(history_hours: u32) -> Self {
        Self {
            current_view: ViewKind::Table,
            historical_data_visible: false,
            current_history_hours: history_hours,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(1)
    }
}

/// What to do with a history response once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Cache it, and render it if the history view is visible by then.
    Display,
    /// Cache it only. Used by the background refresh while history is hidden.
    CacheOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    pub hours: u32,
    pub mode: HistoryMode,
}

pub struct DashboardController {
    view: ViewState,
    cache: Option<HistorySeries>,
    chart: Option<LineChart>,
    page: Page,
    device_pixel_ratio: f64,
    last_update: Option<DateTime<Local>>,
}

impl DashboardController {
    pub fn new(history_hours: u32, device_pixel_ratio: f64) -> Self {
        Self {
            view: ViewState::new(history_hours),
            cache: None,
            chart: None,
            page: Page::new(),
            device_pixel_ratio,
            last_update: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// For the frontend to report layout before drawing.
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn chart(&self) -> Option<&LineChart> {
        self.chart.as_ref()
    }

    pub fn cached_series(&self) -> Option<&HistorySeries> {
        self.cache.as_ref()
    }

    /// Local time of the last successful live poll.
    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Writes a fresh live reading and starts the status pulse. The caller
    /// ends the pulse with `end_pulse` once it has elapsed.
    pub fn apply_latest(&mut self, latest: &LatestReading) {
        self.page.set_text(ElementId::Temp, latest.temperature_text());
        self.page.set_text(ElementId::Hum, latest.humidity_text());
        self.page.add_class(ElementId::StatusDot, FLASH_CLASS);
        self.last_update = Some(Local::now());
    }

    pub fn end_pulse(&mut self) {
        self.page.remove_class(ElementId::StatusDot, FLASH_CLASS);
    }

    /// Makes `hours` the active lookback window and asks for that window.
    /// The window changes even if the request later fails.
    pub fn fetch_history(&mut self, hours: u32) -> HistoryRequest {
        self.view.current_history_hours = hours;
        HistoryRequest {
            hours,
            mode: HistoryMode::Display,
        }
    }

    /// Period selector: show history and fetch the chosen window.
    pub fn show_history(&mut self, hours: u32) -> HistoryRequest {
        self.view.historical_data_visible = true;
        self.fetch_history(hours)
    }

    /// The periodic refresh. Visible history is refetched and redrawn;
    /// hidden history is only refetched into the cache.
    pub fn background_refresh(&mut self) -> HistoryRequest {
        let hours = self.view.current_history_hours;
        if self.view.historical_data_visible {
            self.fetch_history(hours)
        } else {
            HistoryRequest {
                hours,
                mode: HistoryMode::CacheOnly,
            }
        }
    }

    /// Stores a history response. Responses are not fenced: whichever
    /// arrives last wins, even if it answers an older request.
    pub fn complete_history(&mut self, request: HistoryRequest, series: HistorySeries) {
        debug!(
            hours = request.hours,
            readings = series.len(),
            mode = ?request.mode,
            "History received"
        );
        self.cache = Some(series);

        if request.mode == HistoryMode::Display && self.view.historical_data_visible {
            self.render_current();
        }
    }

    fn render_current(&mut self) {
        // Rendering needs `&mut self` while reading the cache, so work on a
        // temporary that is put back afterwards.
        if let Some(series) = self.cache.take() {
            match self.view.current_view {
                ViewKind::Table => self.render_table(&series),
                ViewKind::Graph => self.render_graph(&series),
            }
            self.cache = Some(series);
        }
    }

    /// Rows in server order; shows the table and hides the graph.
    pub fn render_table(&mut self, series: &HistorySeries) {
        let rows = series
            .readings()
            .iter()
            .map(|r| TableRow {
                datetime: r.datetime.clone(),
                temperature: format!("{}°C", r.temperature),
                humidity: format!("{}%", r.humidity),
            })
            .collect();
        self.page.replace_table_rows(rows);

        self.page.set_display(ElementId::TableContainer, Display::Block);
        self.page.set_display(ElementId::GraphContainer, Display::None);
        self.page.set_display(ElementId::DataControls, Display::Flex);
        self.page.set_text(ElementId::ShowGraph, SHOW_GRAPH_LABEL);
        self.view.current_view = ViewKind::Table;
    }

    /// Plots oldest first; shows the graph and hides the table. The chart is
    /// created on first use and updated in place afterwards.
    pub fn render_graph(&mut self, series: &HistorySeries) {
        self.page.set_display(ElementId::TableContainer, Display::None);
        self.page.set_display(ElementId::GraphContainer, Display::Block);
        self.page.set_display(ElementId::DataControls, Display::Flex);
        self.page.set_text(ElementId::ShowGraph, SHOW_TABLE_LABEL);

        let container = self.page.graph_container();
        self.page.resize_canvas(Size {
            width: (container.width as f64 * self.device_pixel_ratio).round() as u32,
            height: (container.height as f64 * self.device_pixel_ratio).round() as u32,
        });

        let labels: Vec<String> = series.chronological().map(|r| r.datetime.clone()).collect();
        let temperature: Vec<f64> = series.chronological().map(|r| r.temperature).collect();
        let humidity: Vec<f64> = series.chronological().map(|r| r.humidity).collect();

        match self.chart.as_mut() {
            Some(chart) => {
                chart.labels = labels;
                chart.datasets[TEMPERATURE].data = temperature;
                chart.datasets[HUMIDITY].data = humidity;
                chart.update();
            }
            None => {
                self.chart = Some(LineChart::new(labels, temperature, humidity));
            }
        }
        self.view.current_view = ViewKind::Graph;
    }

    /// The show-graph button. Swaps views and redraws the cached series
    /// without fetching anything.
    pub fn toggle_view(&mut self) {
        let next = self.view.current_view.flipped();
        self.view.current_view = next;

        let (shown, hidden, label) = match next {
            ViewKind::Graph => (ElementId::GraphContainer, ElementId::TableContainer, SHOW_TABLE_LABEL),
            ViewKind::Table => (ElementId::TableContainer, ElementId::GraphContainer, SHOW_GRAPH_LABEL),
        };
        self.page.set_display(hidden, Display::None);
        self.page.set_display(shown, Display::Block);
        self.page.set_text(ElementId::ShowGraph, label);
        self.view.historical_data_visible = true;

        self.render_current();
    }

    /// The hide-data button. The cache survives so the next show is instant.
    pub fn hide(&mut self) {
        self.page.set_display(ElementId::TableContainer, Display::None);
        self.page.set_display(ElementId::GraphContainer, Display::None);
        self.page.set_display(ElementId::DataControls, Display::None);
        self.view.historical_data_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;

    fn reading(datetime: &str, temperature: f64, humidity: f64) -> Reading {
        Reading {
            datetime: datetime.to_string(),
            temperature,
            humidity,
        }
    }

    fn sample_series() -> HistorySeries {
        HistorySeries::from(vec![reading("t2", 5.0, 50.0), reading("t1", 3.0, 40.0)])
    }

    fn history_shown(page: &Page) -> bool {
        page.is_shown(ElementId::TableContainer) || page.is_shown(ElementId::GraphContainer)
    }

    #[test]
    fn starts_hidden_in_table_mode() {
        let controller = DashboardController::new(1, 1.0);
        assert_eq!(controller.view(), ViewState::default());
        assert!(!history_shown(controller.page()));
        assert!(controller.chart().is_none());
    }

    #[test]
    fn latest_reading_fills_displays_and_pulses() {
        let mut controller = DashboardController::new(1, 1.0);
        let latest: LatestReading = serde_json::from_str(r#"{"temp": null, "hum": 20}"#).unwrap();

        controller.apply_latest(&latest);
        assert_eq!(controller.page().text(ElementId::Temp), "--");
        assert_eq!(controller.page().text(ElementId::Hum), "20");
        assert!(controller.page().has_class(ElementId::StatusDot, FLASH_CLASS));
        assert!(controller.last_update().is_some());

        controller.end_pulse();
        assert!(!controller.page().has_class(ElementId::StatusDot, FLASH_CLASS));
    }

    #[test]
    fn identical_readings_still_pulse() {
        let mut controller = DashboardController::new(1, 1.0);
        let latest = LatestReading::default();
        controller.apply_latest(&latest);
        controller.end_pulse();
        controller.apply_latest(&latest);
        assert!(controller.page().has_class(ElementId::StatusDot, FLASH_CLASS));
    }

    #[test]
    fn table_rows_follow_server_order() {
        let mut controller = DashboardController::new(1, 1.0);
        controller.render_table(&sample_series());

        let rows = controller.page().table_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].datetime, "t2");
        assert_eq!(rows[0].temperature, "5°C");
        assert_eq!(rows[0].humidity, "50%");
        assert!(controller.page().is_shown(ElementId::TableContainer));
        assert!(!controller.page().is_shown(ElementId::GraphContainer));
        assert_eq!(controller.page().display(ElementId::DataControls), Display::Flex);
        assert_eq!(controller.page().text(ElementId::ShowGraph), SHOW_GRAPH_LABEL);
    }

    #[test]
    fn graph_plots_oldest_first() {
        let mut controller = DashboardController::new(1, 1.0);
        controller.render_graph(&sample_series());

        let chart = controller.chart().unwrap();
        assert_eq!(chart.labels, vec!["t1", "t2"]);
        assert_eq!(chart.datasets[TEMPERATURE].data, vec![3.0, 5.0]);
        assert_eq!(chart.datasets[HUMIDITY].data, vec![40.0, 50.0]);
        assert_eq!(controller.view().current_view, ViewKind::Graph);
        assert_eq!(controller.page().text(ElementId::ShowGraph), SHOW_TABLE_LABEL);
    }

    #[test]
    fn graph_reuses_chart_instance() {
        let mut controller = DashboardController::new(1, 1.0);
        controller.render_graph(&sample_series());
        assert_eq!(controller.chart().unwrap().update_count(), 0);

        let newer = HistorySeries::from(vec![reading("t3", 7.0, 60.0)]);
        controller.render_graph(&newer);
        let chart = controller.chart().unwrap();
        assert_eq!(chart.update_count(), 1);
        assert_eq!(chart.labels, vec!["t3"]);
    }

    #[test]
    fn canvas_tracks_container_and_pixel_ratio() {
        let mut controller = DashboardController::new(1, 2.0);
        controller.page_mut().set_graph_container(Size { width: 80, height: 20 });
        controller.render_graph(&sample_series());
        assert_eq!(controller.page().canvas(), Size { width: 160, height: 40 });
    }

    #[test]
    fn rerender_from_cache_is_idempotent() {
        let mut controller = DashboardController::new(1, 1.0);
        let series = sample_series();

        controller.render_table(&series);
        let first = controller.page().table_rows().to_vec();
        controller.render_graph(&series);
        controller.render_table(&series);

        assert_eq!(controller.page().table_rows(), first.as_slice());
    }

    #[test]
    fn fetch_history_sets_window_before_any_response() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.fetch_history(24);
        assert_eq!(request, HistoryRequest { hours: 24, mode: HistoryMode::Display });
        assert_eq!(controller.view().current_history_hours, 24);
        assert!(controller.cached_series().is_none());
    }

    #[test]
    fn show_history_renders_on_completion() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.show_history(6);
        assert!(controller.view().historical_data_visible);

        controller.complete_history(request, sample_series());
        assert!(controller.page().is_shown(ElementId::TableContainer));
        assert_eq!(controller.page().table_rows().len(), 2);
    }

    #[test]
    fn late_response_for_older_window_wins() {
        let mut controller = DashboardController::new(1, 1.0);
        let hour = controller.show_history(1);
        let day = controller.show_history(24);

        let day_series = HistorySeries::from(vec![
            reading("d3", 9.0, 90.0),
            reading("d2", 8.0, 80.0),
            reading("d1", 7.0, 70.0),
        ]);
        let hour_series = HistorySeries::from(vec![reading("h1", 1.0, 10.0)]);

        controller.complete_history(day, day_series);
        assert_eq!(controller.page().table_rows().len(), 3);

        controller.complete_history(hour, hour_series.clone());
        assert_eq!(controller.cached_series(), Some(&hour_series));
        assert_eq!(controller.page().table_rows().len(), 1);
        assert_eq!(controller.page().table_rows()[0].datetime, "h1");
        assert_eq!(controller.view().current_history_hours, 24);
    }

    #[test]
    fn completion_after_hide_only_updates_cache() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.show_history(6);
        controller.hide();
        let revision = controller.page().revision();

        controller.complete_history(request, sample_series());
        assert_eq!(controller.cached_series(), Some(&sample_series()));
        assert_eq!(controller.page().revision(), revision);
        assert!(!history_shown(controller.page()));
    }

    #[test]
    fn hidden_background_refresh_is_cache_only() {
        let mut controller = DashboardController::new(1, 1.0);
        controller.fetch_history(12);
        let revision = controller.page().revision();

        let request = controller.background_refresh();
        assert_eq!(request, HistoryRequest { hours: 12, mode: HistoryMode::CacheOnly });

        controller.complete_history(request, sample_series());
        assert_eq!(controller.page().revision(), revision);
        assert!(controller.cached_series().is_some());
    }

    #[test]
    fn visible_background_refresh_redraws_current_view() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.show_history(3);
        controller.complete_history(request, sample_series());
        controller.toggle_view();

        let request = controller.background_refresh();
        assert_eq!(request.mode, HistoryMode::Display);
        assert_eq!(request.hours, 3);

        controller.complete_history(request, HistorySeries::from(vec![reading("t9", 1.0, 2.0)]));
        assert_eq!(controller.chart().unwrap().labels, vec!["t9"]);
        assert!(controller.page().is_shown(ElementId::GraphContainer));
    }

    #[test]
    fn toggling_twice_restores_view() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.show_history(1);
        controller.complete_history(request, sample_series());
        let before = (
            controller.view().current_view,
            controller.page().is_shown(ElementId::TableContainer),
            controller.page().is_shown(ElementId::GraphContainer),
        );

        controller.toggle_view();
        assert_eq!(controller.view().current_view, ViewKind::Graph);
        assert!(controller.page().is_shown(ElementId::GraphContainer));
        assert!(!controller.page().is_shown(ElementId::TableContainer));

        controller.toggle_view();
        let after = (
            controller.view().current_view,
            controller.page().is_shown(ElementId::TableContainer),
            controller.page().is_shown(ElementId::GraphContainer),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn toggle_without_cache_still_shows_history() {
        let mut controller = DashboardController::new(1, 1.0);
        controller.toggle_view();
        assert!(controller.view().historical_data_visible);
        assert!(controller.page().is_shown(ElementId::GraphContainer));
        assert!(controller.chart().is_none());
    }

    #[test]
    fn hide_keeps_cache_for_next_show() {
        let mut controller = DashboardController::new(1, 1.0);
        let request = controller.show_history(1);
        controller.complete_history(request, sample_series());

        controller.hide();
        assert!(!controller.view().historical_data_visible);
        assert!(!history_shown(controller.page()));
        assert!(!controller.page().is_shown(ElementId::DataControls));
        assert!(controller.cached_series().is_some());

        controller.toggle_view();
        assert!(controller.view().historical_data_visible);
        assert_eq!(controller.chart().unwrap().labels, vec!["t1", "t2"]);
    }

    #[test]
    fn visibility_flag_matches_containers() {
        let mut controller = DashboardController::new(1, 1.0);
        let check = |c: &DashboardController| {
            assert_eq!(c.view().historical_data_visible, history_shown(c.page()));
        };

        check(&controller);
        let request = controller.show_history(1);
        controller.complete_history(request, sample_series());
        check(&controller);
        controller.toggle_view();
        check(&controller);
        controller.hide();
        check(&controller);
        controller.toggle_view();
        check(&controller);
    }
}
