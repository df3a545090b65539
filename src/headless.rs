use crate::controller::DashboardController;
use crate::page::ElementId;
use crate::scheduler::Frontend;
use tracing::{debug, info};

/// Runs the dashboard without a terminal and logs what the page would show.
#[derive(Default)]
pub struct HeadlessFrontend {
    last_revision: u64,
    last_rows: usize,
    last_history_shown: bool,
}

impl Frontend for HeadlessFrontend {
    fn draw(&mut self, controller: &mut DashboardController) -> anyhow::Result<()> {
        let page = controller.page();
        if page.revision() == self.last_revision {
            return Ok(());
        }
        self.last_revision = page.revision();

        debug!(
            temp = page.text(ElementId::Temp),
            hum = page.text(ElementId::Hum),
            "Live reading"
        );

        let view = controller.view();
        let rows = controller.cached_series().map(|s| s.len()).unwrap_or(0);
        if view.historical_data_visible != self.last_history_shown || rows != self.last_rows {
            let shown = if page.is_shown(ElementId::GraphContainer) {
                ElementId::GraphContainer
            } else {
                ElementId::TableContainer
            };
            info!(
                visible = view.historical_data_visible,
                view = ?view.current_view,
                hours = view.current_history_hours,
                readings = rows,
                element = shown.dom_id(),
                canvas = ?page.canvas(),
                "History view changed"
            );
            self.last_history_shown = view.historical_data_visible;
            self.last_rows = rows;
        }
        Ok(())
    }
}
