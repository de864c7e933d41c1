//! Session controller: owns every piece of mutable dashboard state and fans a
//! prediction out to the renderers.
//!
//! Requests are split into `begin_*` (allocate a [`Ticket`]) and `apply_*`
//! (consume the outcome) so callers can keep several requests in flight. Each
//! flow carries a generation counter; an outcome whose ticket is older than the
//! newest ticket of the same flow is dropped instead of overwriting fresher
//! state.

use anyhow::Result;
use serde_json::json;
use std::time::Instant;

use crate::alerts::AlertPresenter;
use crate::charts::{Canvas, ChartRegistry, ChartSpec};
use crate::client::PredictClient;
use crate::config::Config;
use crate::drivers::render_drivers;
use crate::gauge::{render_gauge, GaugeView};
use crate::logging::{log, log_request, log_response, obj, v_num, v_str, Domain, Level};
use crate::model::{Prediction, RiskInput, RiskResult};
use crate::recommendations::{render_recommendations, RecommendationList};
use crate::simulation::{render_simulation, simulated_input, SimulationBlocked, SimulationView, Sliders};
use crate::view::ViewRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Submit,
    Simulate,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Submit => "submit",
            Flow::Simulate => "simulate",
        }
    }

    fn index(self) -> usize {
        match self {
            Flow::Submit => 0,
            Flow::Simulate => 1,
        }
    }
}

/// One issued prediction request.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub flow: Flow,
    pub generation: u64,
    pub input: RiskInput,
    pub issued_at: Instant,
    /// Submit generation that produced the baseline in effect at issue time.
    pub baseline_generation: u64,
}

/// What happened to an outcome handed to `apply_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Rendered,
    Rejected,
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Summary(String),
    ServerError(String),
    NetworkError(String),
}

/// Perform the network half of a ticket, with request/response logging.
pub async fn dispatch<C>(client: &C, ticket: &Ticket) -> Result<Prediction>
where
    C: PredictClient + Sync + ?Sized,
{
    log_request(
        ticket.flow.as_str(),
        ticket.generation,
        client.endpoint(),
        &ticket.input.fingerprint(),
        ticket.input.len(),
    );
    let outcome = client.predict(&ticket.input).await;
    let elapsed_ms = ticket.issued_at.elapsed().as_millis() as u64;
    let (label, score) = match &outcome {
        Ok(p @ Prediction::Scored(_)) => ("scored", p.score()),
        Ok(Prediction::Rejected(_)) => ("rejected", None),
        Err(_) => ("failed", None),
    };
    log_response(ticket.flow.as_str(), ticket.generation, label, score, elapsed_ms);
    outcome
}

pub struct RiskDashboard {
    router: ViewRouter,
    charts: ChartRegistry,
    alerts: AlertPresenter,
    recommendations: RecommendationList,
    gauge: Option<GaugeView>,
    simulation: Option<SimulationView>,
    adjustments: Vec<String>,
    season: Option<String>,
    result_visible: bool,
    drivers_visible: bool,
    status: Status,
    sim_status: Option<String>,
    baseline: Option<f64>,
    baseline_generation: u64,
    latest: [u64; 2],
    in_flight: [usize; 2],
}

impl RiskDashboard {
    pub fn new(cfg: &Config) -> Self {
        Self {
            router: ViewRouter::new(),
            charts: ChartRegistry::new(),
            alerts: AlertPresenter::new(cfg.popup_dismiss()),
            recommendations: RecommendationList::default(),
            gauge: None,
            simulation: None,
            adjustments: Vec::new(),
            season: None,
            result_visible: false,
            drivers_visible: false,
            status: Status::Idle,
            sim_status: None,
            baseline: None,
            baseline_generation: 0,
            latest: [0; 2],
            in_flight: [0; 2],
        }
    }

    /// Forget everything from the current session. Requests still in flight
    /// become stale; they stay counted in `busy()` until their outcome is applied.
    pub fn reset(&mut self) {
        self.router = ViewRouter::new();
        self.charts.clear();
        self.alerts.clear();
        self.recommendations = RecommendationList::default();
        self.gauge = None;
        self.simulation = None;
        self.adjustments.clear();
        self.season = None;
        self.result_visible = false;
        self.drivers_visible = false;
        self.status = Status::Idle;
        self.sim_status = None;
        self.baseline = None;
        for g in self.latest.iter_mut() {
            *g += 1;
        }
        self.baseline_generation = 0;
        log(Level::Info, Domain::System, "session_reset", obj(&[]));
    }

    fn issue(&mut self, flow: Flow, input: RiskInput) -> Ticket {
        let idx = flow.index();
        self.latest[idx] += 1;
        self.in_flight[idx] += 1;
        Ticket {
            flow,
            generation: self.latest[idx],
            input,
            issued_at: Instant::now(),
            baseline_generation: self.baseline_generation,
        }
    }

    /// Settle a ticket. Returns false when a newer ticket of the same flow exists.
    fn settle(&mut self, ticket: &Ticket) -> bool {
        let idx = ticket.flow.index();
        self.in_flight[idx] = self.in_flight[idx].saturating_sub(1);
        if ticket.generation < self.latest[idx] {
            log(
                Level::Warn,
                Domain::Net,
                "stale_response",
                obj(&[
                    ("flow", v_str(ticket.flow.as_str())),
                    ("generation", json!(ticket.generation)),
                    ("latest", json!(self.latest[idx])),
                ]),
            );
            return false;
        }
        true
    }

    // =========================================================================
    // Form submission
    // =========================================================================

    pub fn begin_submit(&mut self, input: RiskInput) -> Ticket {
        self.issue(Flow::Submit, input)
    }

    pub fn apply_submit(&mut self, ticket: &Ticket, outcome: Result<Prediction>, now: Instant) -> Applied {
        if !self.settle(ticket) {
            return Applied::Stale;
        }
        match outcome {
            Ok(Prediction::Scored(result)) => {
                self.render_result(&result, ticket.generation, now);
                Applied::Rendered
            }
            Ok(Prediction::Rejected(msg)) => {
                log(
                    Level::Warn,
                    Domain::Net,
                    "server_error",
                    obj(&[("flow", v_str("submit")), ("msg", v_str(&msg))]),
                );
                self.status = Status::ServerError(msg);
                Applied::Rejected
            }
            Err(err) => {
                log(
                    Level::Error,
                    Domain::Net,
                    "request_failed",
                    obj(&[("flow", v_str("submit")), ("msg", v_str(&format!("{:#}", err)))]),
                );
                self.status = Status::NetworkError(format!("{:#}. Submit again to retry.", err));
                Applied::Failed
            }
        }
    }

    fn render_result(&mut self, result: &RiskResult, generation: u64, now: Instant) {
        self.result_visible = true;

        let gauge = render_gauge(result.risk_score, &result.risk_level);
        self.charts.install(Canvas::Gauge, ChartSpec::Doughnut(gauge.chart.clone()));
        self.gauge = Some(gauge);

        if let Some(bar) = render_drivers(result.breakdown.as_ref()) {
            self.charts.install(Canvas::Drivers, ChartSpec::Bar(bar));
            self.drivers_visible = true;
        }

        self.status = Status::Summary(result.summary.clone().unwrap_or_default());
        self.alerts.render(&result.alerts, now);
        self.recommendations = render_recommendations(&result.recommendations);
        self.adjustments = result.adjustments.clone();
        self.season = result.season.clone();
        self.baseline = Some(result.risk_score);
        self.baseline_generation = generation;

        log(
            Level::Info,
            Domain::Render,
            "result_rendered",
            obj(&[
                ("score", v_num(result.risk_score)),
                ("level", v_str(result.risk_level.as_str())),
                ("alerts", json!(result.alerts.len())),
                ("recommendations", json!(result.recommendations.len())),
            ]),
        );
    }

    pub async fn submit<C>(&mut self, client: &C, input: RiskInput) -> Applied
    where
        C: PredictClient + Sync + ?Sized,
    {
        let ticket = self.begin_submit(input);
        let outcome = dispatch(client, &ticket).await;
        self.apply_submit(&ticket, outcome, Instant::now())
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    pub fn begin_simulation(&mut self, form: &RiskInput, sliders: &Sliders) -> Result<Ticket, SimulationBlocked> {
        if self.baseline.is_none() {
            self.sim_status = Some(SimulationBlocked::NoBaseline.notice().to_string());
            log(
                Level::Info,
                Domain::Sim,
                "simulation_blocked",
                obj(&[("reason", v_str("no_baseline"))]),
            );
            return Err(SimulationBlocked::NoBaseline);
        }
        self.sim_status = None;
        Ok(self.issue(Flow::Simulate, simulated_input(form, sliders)))
    }

    pub fn apply_simulation(&mut self, ticket: &Ticket, outcome: Result<Prediction>) -> Applied {
        if !self.settle(ticket) {
            return Applied::Stale;
        }
        // A reset between issue and response leaves nothing to compare with.
        let Some(baseline) = self.baseline else {
            return Applied::Stale;
        };
        if ticket.baseline_generation != self.baseline_generation {
            log(
                Level::Info,
                Domain::Sim,
                "baseline_moved",
                obj(&[
                    ("generation", json!(ticket.generation)),
                    ("issued_against", json!(ticket.baseline_generation)),
                    ("current", json!(self.baseline_generation)),
                ]),
            );
        }
        match outcome {
            Ok(Prediction::Scored(result)) => {
                let view = render_simulation(baseline, result.risk_score);
                self.charts.install(Canvas::SimulationGauge, ChartSpec::Doughnut(view.chart.clone()));
                log(
                    Level::Info,
                    Domain::Sim,
                    "simulation_rendered",
                    obj(&[
                        ("baseline", v_num(baseline)),
                        ("score", v_num(view.score)),
                        ("delta", v_num(view.delta)),
                    ]),
                );
                self.simulation = Some(view);
                Applied::Rendered
            }
            Ok(Prediction::Rejected(msg)) => {
                log(
                    Level::Warn,
                    Domain::Net,
                    "server_error",
                    obj(&[("flow", v_str("simulate")), ("msg", v_str(&msg))]),
                );
                self.sim_status = Some(format!("Simulation rejected: {}", msg));
                Applied::Rejected
            }
            Err(err) => {
                log(
                    Level::Error,
                    Domain::Net,
                    "request_failed",
                    obj(&[("flow", v_str("simulate")), ("msg", v_str(&format!("{:#}", err)))]),
                );
                self.sim_status = Some(format!("Simulation failed: {:#}. Run it again to retry.", err));
                Applied::Failed
            }
        }
    }

    pub async fn run_simulation<C>(
        &mut self,
        client: &C,
        form: &RiskInput,
        sliders: &Sliders,
    ) -> Result<Applied, SimulationBlocked>
    where
        C: PredictClient + Sync + ?Sized,
    {
        let ticket = self.begin_simulation(form, sliders)?;
        let outcome = dispatch(client, &ticket).await;
        Ok(self.apply_simulation(&ticket, outcome))
    }

    // =========================================================================
    // Popups and navigation
    // =========================================================================

    /// Expire popups whose auto-dismiss deadline passed.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.alerts.sweep(now)
    }

    pub fn click_popup(&mut self, popup_id: u64) -> bool {
        match self.alerts.click(popup_id) {
            Some(panel) => {
                self.router.show(panel);
                true
            }
            None => false,
        }
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ViewRouter {
        &mut self.router
    }

    // =========================================================================
    // Read access for the front end
    // =========================================================================

    pub fn busy(&self, flow: Flow) -> bool {
        self.in_flight[flow.index()] > 0
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn sim_status(&self) -> Option<&str> {
        self.sim_status.as_deref()
    }

    pub fn result_visible(&self) -> bool {
        self.result_visible
    }

    pub fn drivers_visible(&self) -> bool {
        self.drivers_visible
    }

    pub fn gauge(&self) -> Option<&GaugeView> {
        self.gauge.as_ref()
    }

    pub fn simulation(&self) -> Option<&SimulationView> {
        self.simulation.as_ref()
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn alerts(&self) -> &AlertPresenter {
        &self.alerts
    }

    pub fn recommendations(&self) -> &RecommendationList {
        &self.recommendations
    }

    pub fn adjustments(&self) -> &[String] {
        &self.adjustments
    }

    pub fn season(&self) -> Option<&str> {
        self.season.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Breakdown, RiskLevel};
    use anyhow::anyhow;

    fn scored(score: f64, level: RiskLevel) -> Prediction {
        Prediction::Scored(RiskResult {
            risk_score: score,
            risk_level: level,
            breakdown: Some(Breakdown(vec![("weather".into(), 80.0), ("market".into(), 20.0)])),
            summary: Some("Weather variability is the primary instability driver.".into()),
            alerts: vec![],
            recommendations: vec![],
            season: Some("MONSOON".into()),
            adjustments: vec!["Rainfed irrigation increases rainfall dependency.".into()],
        })
    }

    fn dashboard() -> RiskDashboard {
        RiskDashboard::new(&Config::default())
    }

    #[test]
    fn scored_submit_sets_baseline_and_renders() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        assert!(d.busy(Flow::Submit));
        assert_eq!(d.apply_submit(&t, Ok(scored(55.0, RiskLevel::Moderate)), Instant::now()), Applied::Rendered);
        assert!(!d.busy(Flow::Submit));
        assert_eq!(d.baseline(), Some(55.0));
        assert!(d.result_visible());
        assert!(d.drivers_visible());
        assert_eq!(d.gauge().unwrap().label, "MODERATE RISK");
        assert_eq!(d.alerts().cards().len(), 1);
        assert_eq!(d.recommendations().badge, None);
        assert_eq!(d.season(), Some("MONSOON"));
        assert_eq!(d.adjustments().len(), 1);
    }

    #[test]
    fn rejected_submit_renders_nothing() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        let applied = d.apply_submit(&t, Ok(Prediction::Rejected("bad input".into())), Instant::now());
        assert_eq!(applied, Applied::Rejected);
        assert!(!d.result_visible());
        assert_eq!(d.baseline(), None);
        assert_eq!(d.charts().outstanding(), 0);
        assert_eq!(d.status(), &Status::ServerError("bad input".into()));
    }

    #[test]
    fn network_failure_is_surfaced() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        let applied = d.apply_submit(&t, Err(anyhow!("connection refused")), Instant::now());
        assert_eq!(applied, Applied::Failed);
        assert!(matches!(d.status(), Status::NetworkError(m) if m.contains("retry")));
        assert_eq!(d.baseline(), None);
    }

    #[test]
    fn older_response_cannot_overwrite_newer() {
        let mut d = dashboard();
        let first = d.begin_submit(RiskInput::new());
        let second = d.begin_submit(RiskInput::new());
        let now = Instant::now();
        assert_eq!(d.apply_submit(&second, Ok(scored(20.0, RiskLevel::Low)), now), Applied::Rendered);
        assert_eq!(d.apply_submit(&first, Ok(scored(90.0, RiskLevel::High)), now), Applied::Stale);
        assert_eq!(d.baseline(), Some(20.0));
        assert!(!d.busy(Flow::Submit));
    }

    #[test]
    fn simulation_requires_baseline() {
        let mut d = dashboard();
        let blocked = d.begin_simulation(&RiskInput::new(), &Sliders::default());
        assert_eq!(blocked.unwrap_err(), SimulationBlocked::NoBaseline);
        assert_eq!(d.sim_status(), Some(crate::simulation::NO_BASELINE_NOTICE));
        assert!(!d.busy(Flow::Simulate));
    }

    #[test]
    fn simulation_compares_against_baseline_without_moving_it() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        d.apply_submit(&t, Ok(scored(50.0, RiskLevel::Moderate)), Instant::now());

        let sim = d.begin_simulation(&RiskInput::new(), &Sliders::default()).unwrap();
        assert_eq!(d.apply_simulation(&sim, Ok(scored(80.0, RiskLevel::High))), Applied::Rendered);
        let view = d.simulation().unwrap();
        assert_eq!(view.narrative[1], "Change: +30.0%");
        assert!(view.insight.contains("significantly increases instability"));
        assert_eq!(d.baseline(), Some(50.0));
    }

    #[test]
    fn repeated_renders_keep_one_chart_per_canvas() {
        let mut d = dashboard();
        for _ in 0..3 {
            let t = d.begin_submit(RiskInput::new());
            d.apply_submit(&t, Ok(scored(42.0, RiskLevel::Moderate)), Instant::now());
            let s = d.begin_simulation(&RiskInput::new(), &Sliders::default()).unwrap();
            d.apply_simulation(&s, Ok(scored(47.0, RiskLevel::Moderate)));
        }
        for canvas in Canvas::ALL {
            assert_eq!(d.charts().live_count(canvas), 1);
        }
        assert_eq!(d.charts().outstanding(), 3);
    }

    #[test]
    fn reset_drops_state_and_staleness_in_flight() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        d.apply_submit(&t, Ok(scored(50.0, RiskLevel::Moderate)), Instant::now());
        let pending = d.begin_submit(RiskInput::new());
        d.reset();
        assert_eq!(d.apply_submit(&pending, Ok(scored(70.0, RiskLevel::Moderate)), Instant::now()), Applied::Stale);
        assert_eq!(d.baseline(), None);
        assert_eq!(d.charts().outstanding(), 0);
        assert!(!d.result_visible());
    }

    #[test]
    fn stale_outcome_after_reset_keeps_new_request_busy() {
        let mut d = dashboard();
        let old = d.begin_submit(RiskInput::new());
        d.reset();
        let fresh = d.begin_submit(RiskInput::new());
        assert_eq!(d.apply_submit(&old, Ok(scored(70.0, RiskLevel::Moderate)), Instant::now()), Applied::Stale);
        assert!(d.busy(Flow::Submit));
        assert_eq!(d.apply_submit(&fresh, Ok(scored(30.0, RiskLevel::Low)), Instant::now()), Applied::Rendered);
        assert!(!d.busy(Flow::Submit));
        assert_eq!(d.baseline(), Some(30.0));
    }

    #[test]
    fn simulation_uses_baseline_current_at_apply_time() {
        let mut d = dashboard();
        let first = d.begin_submit(RiskInput::new());
        d.apply_submit(&first, Ok(scored(50.0, RiskLevel::Moderate)), Instant::now());

        let sim = d.begin_simulation(&RiskInput::new(), &Sliders::default()).unwrap();
        assert_eq!(sim.baseline_generation, first.generation);

        let second = d.begin_submit(RiskInput::new());
        d.apply_submit(&second, Ok(scored(60.0, RiskLevel::Moderate)), Instant::now());
        assert_ne!(sim.baseline_generation, second.generation);

        assert_eq!(d.apply_simulation(&sim, Ok(scored(62.0, RiskLevel::Moderate))), Applied::Rendered);
        assert_eq!(d.simulation().unwrap().narrative[0], "Baseline: 60.0% → Now: 62.0%");
    }

    #[test]
    fn rejected_simulation_reports_without_rendering() {
        let mut d = dashboard();
        let t = d.begin_submit(RiskInput::new());
        d.apply_submit(&t, Ok(scored(50.0, RiskLevel::Moderate)), Instant::now());
        let sim = d.begin_simulation(&RiskInput::new(), &Sliders::default()).unwrap();
        let applied = d.apply_simulation(&sim, Ok(Prediction::Rejected("bad slider".into())));
        assert_eq!(applied, Applied::Rejected);
        assert_eq!(d.sim_status(), Some("Simulation rejected: bad slider"));
        assert!(d.simulation().is_none());
        assert_eq!(d.charts().live_count(Canvas::SimulationGauge), 0);
    }
}
