use crate::charts::{Doughnut, AMBER, GREEN, RED};
use crate::model::RiskLevel;

/// Rendered main gauge: ring chart plus numeric readout and label.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeView {
    pub chart: Doughnut,
    pub readout: i64,
    pub label: String,
}

pub fn level_color(level: &RiskLevel) -> &'static str {
    match level {
        RiskLevel::Moderate => AMBER,
        RiskLevel::High => RED,
        RiskLevel::Low | RiskLevel::Other(_) => GREEN,
    }
}

pub fn render_gauge(score: f64, level: &RiskLevel) -> GaugeView {
    GaugeView {
        chart: Doughnut::ring(score, level_color(level)),
        readout: score.round() as i64,
        label: format!("{} RISK", level.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_score_and_remainder() {
        for s in [0.0, 12.5, 50.0, 99.9, 100.0] {
            let g = render_gauge(s, &RiskLevel::Low);
            assert_eq!(g.chart.segments, [s, 100.0 - s]);
        }
    }

    #[test]
    fn level_picks_color_and_label() {
        let g = render_gauge(72.6, &RiskLevel::High);
        assert_eq!(g.chart.colors[0], RED);
        assert_eq!(g.readout, 73);
        assert_eq!(g.label, "HIGH RISK");

        assert_eq!(level_color(&RiskLevel::Moderate), AMBER);
        assert_eq!(level_color(&RiskLevel::Other("SEVERE".into())), GREEN);
    }
}
