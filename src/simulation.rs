//! Client-side "what-if" runs: adjust three inputs, rescore, compare to the
//! stored baseline.

use crate::charts::{Doughnut, AMBER, GREEN, RED};
use crate::model::{FieldValue, RiskInput, INPUT_COST, MARKET_VOLATILITY, RAINFALL_DEVIATION};

pub const NO_BASELINE_NOTICE: &str = "Run the main analysis first.";

const INSIGHT_WORSE: &str = "This scenario significantly increases instability.";
const INSIGHT_BETTER: &str = "This scenario significantly improves resilience.";
const INSIGHT_FLAT: &str = "This scenario has minimal impact on overall risk.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    value: f64,
}

impl Slider {
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        Self { min, max, value: value.clamp(min, max) }
    }

    pub fn set(&mut self, value: f64) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sliders {
    pub rain: Slider,
    pub market: Slider,
    pub cost: Slider,
}

impl Default for Sliders {
    fn default() -> Self {
        Self {
            rain: Slider::new(0.0, 100.0, 0.0),
            market: Slider::new(0.0, 100.0, 20.0),
            cost: Slider::new(-50.0, 100.0, 0.0),
        }
    }
}

impl Sliders {
    pub fn by_name(&mut self, name: &str) -> Option<&mut Slider> {
        match name {
            "rain" => Some(&mut self.rain),
            "market" => Some(&mut self.market),
            "cost" => Some(&mut self.cost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationBlocked {
    NoBaseline,
}

impl SimulationBlocked {
    pub fn notice(&self) -> &'static str {
        match self {
            SimulationBlocked::NoBaseline => NO_BASELINE_NOTICE,
        }
    }
}

/// Percentage adjustment applied multiplicatively: 20 on 100 gives 120.
pub fn adjust_cost(base_cost: f64, pct: f64) -> f64 {
    base_cost * (1.0 + pct / 100.0)
}

/// Copy of the form input with the three slider-driven fields overridden.
pub fn simulated_input(base: &RiskInput, sliders: &Sliders) -> RiskInput {
    let mut input = base.clone();
    let base_cost = base.get(INPUT_COST).and_then(FieldValue::as_f64).unwrap_or(0.0);

    input.set(RAINFALL_DEVIATION, FieldValue::Text(format_slider(sliders.rain.value())));
    input.set(MARKET_VOLATILITY, FieldValue::Number(sliders.market.value() / 100.0));
    input.set(INPUT_COST, FieldValue::Number(adjust_cost(base_cost, sliders.cost.value())));
    input
}

fn format_slider(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Numeric bands for the simulation ring. Independent of the backend's level strings.
pub fn score_color(score: f64) -> &'static str {
    if score < 40.0 {
        GREEN
    } else if score <= 70.0 {
        AMBER
    } else {
        RED
    }
}

pub fn insight(delta: f64) -> &'static str {
    if delta > 5.0 {
        INSIGHT_WORSE
    } else if delta < -5.0 {
        INSIGHT_BETTER
    } else {
        INSIGHT_FLAT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationView {
    pub chart: Doughnut,
    pub score: f64,
    pub delta: f64,
    pub narrative: [String; 2],
    pub insight: &'static str,
}

pub fn render_simulation(baseline: f64, score: f64) -> SimulationView {
    let delta = score - baseline;
    let sign = if delta < 0.0 { "-" } else { "+" };
    SimulationView {
        chart: Doughnut::ring(score, score_color(score))
            .with_center_text(format!("{}%", score.round() as i64)),
        score,
        delta,
        narrative: [
            format!("Baseline: {:.1}% → Now: {:.1}%", baseline, score),
            format!("Change: {}{:.1}%", sign, delta.abs()),
        ],
        insight: insight(delta),
    }
}
