//! The dashboard's event loop.
//!
//! Everything that touches the controller runs here, one event at a time:
//! timer ticks, user actions and fetch completions. Fetches themselves run as
//! spawned tasks that only report back over a channel, so a slow or hung
//! request never holds up the timers.

use crate::client::{FetchError, SensorSource};
use crate::config::PollingConfig;
use crate::controller::{DashboardController, HistoryRequest};
use crate::reading::{HistorySeries, LatestReading};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Inputs from whoever is looking at the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// The show-graph button
    ToggleView,
    /// The hide-data button
    HideHistory,
    /// A period selector button, in hours
    ShowHistory(u32),
    Quit,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Latest(Result<LatestReading, FetchError>),
    History {
        request: HistoryRequest,
        result: Result<HistorySeries, FetchError>,
    },
}

#[derive(Debug)]
pub enum SchedulerEvent {
    LiveTick,
    HistoryTick,
    PulseElapsed,
    Action(UserAction),
    Fetched(FetchOutcome),
}

/// Something that can show the controller's page.
pub trait Frontend {
    fn draw(&mut self, controller: &mut DashboardController) -> anyhow::Result<()>;
}

pub struct Scheduler {
    controller: DashboardController,
    source: Arc<dyn SensorSource>,
    polling: PollingConfig,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    pulse_deadline: Option<Instant>,
    requests_sent: u64,
}

impl Scheduler {
    pub fn new(controller: DashboardController, source: Arc<dyn SensorSource>, polling: PollingConfig) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            source,
            polling,
            outcome_tx,
            outcome_rx,
            pulse_deadline: None,
            requests_sent: 0,
        }
    }

    #[cfg(test)]
    pub fn controller(&self) -> &DashboardController {
        &self.controller
    }

    /// Number of requests issued so far.
    #[cfg(test)]
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Waits for the next finished fetch.
    #[cfg(test)]
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.recv().await
    }

    /// Applies one event to the controller. Breaks on `Quit`.
    pub fn handle(&mut self, event: SchedulerEvent) -> ControlFlow<()> {
        match event {
            SchedulerEvent::LiveTick => self.spawn_latest(),
            SchedulerEvent::HistoryTick => {
                let request = self.controller.background_refresh();
                self.spawn_history(request);
            }
            SchedulerEvent::PulseElapsed => {
                self.pulse_deadline = None;
                self.controller.end_pulse();
            }
            SchedulerEvent::Action(action) => return self.handle_action(action),
            SchedulerEvent::Fetched(outcome) => self.handle_outcome(outcome),
        }
        ControlFlow::Continue(())
    }

    fn handle_action(&mut self, action: UserAction) -> ControlFlow<()> {
        debug!(?action, "User action");
        match action {
            UserAction::ToggleView => self.controller.toggle_view(),
            UserAction::HideHistory => self.controller.hide(),
            UserAction::ShowHistory(hours) => {
                let request = self.controller.show_history(hours);
                self.spawn_history(request);
            }
            UserAction::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Latest(Ok(latest)) => {
                self.controller.apply_latest(&latest);
                // A newer pulse supersedes a pending one
                self.pulse_deadline = Some(Instant::now() + self.polling.pulse());
            }
            FetchOutcome::Latest(Err(e)) => {
                error!("Error fetching data: {}", e);
            }
            FetchOutcome::History { request, result: Ok(series) } => {
                self.controller.complete_history(request, series);
            }
            FetchOutcome::History { request, result: Err(e) } => {
                error!(hours = request.hours, "History fetching error: {}", e);
            }
        }
    }

    fn spawn_latest(&mut self) {
        self.requests_sent += 1;
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = source.latest().await;
            // The receiver lives as long as the scheduler
            let _ = tx.send(FetchOutcome::Latest(result));
        });
    }

    fn spawn_history(&mut self, request: HistoryRequest) {
        self.requests_sent += 1;
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = source.history(request.hours).await;
            let _ = tx.send(FetchOutcome::History { request, result });
        });
    }

    /// Runs until a `Quit` action arrives or the action channel closes.
    pub async fn run<F: Frontend>(
        mut self,
        frontend: &mut F,
        mut actions: mpsc::UnboundedReceiver<UserAction>,
        frame_interval: Duration,
    ) -> anyhow::Result<()> {
        info!(
            "Polling every {:?}, refreshing history every {:?}",
            self.polling.live_interval(),
            self.polling.history_interval()
        );

        // The live poll fires immediately, like a page load; history waits a full period
        let mut live = time::interval(self.polling.live_interval());
        live.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let history_period = self.polling.history_interval();
        let mut history = time::interval_at(Instant::now() + history_period, history_period);
        history.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame = time::interval(frame_interval);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let pulse_deadline = self.pulse_deadline;
            let event = tokio::select! {
                _ = live.tick() => Some(SchedulerEvent::LiveTick),
                _ = history.tick() => Some(SchedulerEvent::HistoryTick),
                _ = time::sleep_until(pulse_deadline.unwrap_or_else(Instant::now)), if pulse_deadline.is_some() => {
                    Some(SchedulerEvent::PulseElapsed)
                }
                Some(outcome) = self.outcome_rx.recv() => Some(SchedulerEvent::Fetched(outcome)),
                action = actions.recv() => Some(SchedulerEvent::Action(action.unwrap_or(UserAction::Quit))),
                _ = frame.tick() => None,
            };

            match event {
                Some(event) => {
                    let redraw = !matches!(event, SchedulerEvent::LiveTick | SchedulerEvent::HistoryTick);
                    if self.handle(event).is_break() {
                        break;
                    }
                    if redraw {
                        frontend.draw(&mut self.controller)?;
                    }
                }
                None => frontend.draw(&mut self.controller)?,
            }
        }

        info!("Dashboard stopped after {} requests", self.requests_sent);
        Ok(())
    }
}
