//! Plain-text rendering of the dashboard for the terminal front end.

use std::fmt::Write;

use crate::charts::{Canvas, ChartSpec};
use crate::dashboard::{Flow, RiskDashboard, Status};
use crate::model::RiskInput;
use crate::simulation::Sliders;
use crate::view::Panel;

const BAR_WIDTH: usize = 30;

/// Horizontal bar for a value on a 0..=100 scale.
pub fn meter(value: f64, width: usize) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn badge(count: Option<usize>) -> String {
    count.map(|n| format!(" ({})", n)).unwrap_or_default()
}

fn tabs(d: &RiskDashboard) -> String {
    let mut out = String::new();
    for panel in Panel::ALL {
        let name = match panel {
            Panel::Dashboard => "Dashboard".to_string(),
            Panel::Simulation => "Simulation".to_string(),
            Panel::Alerts => format!("Alerts{}", badge(d.alerts().badge())),
            Panel::AiHelp => format!("AI Help{}", badge(d.recommendations().badge)),
        };
        if d.router().is_visible(panel) {
            let _ = write!(out, " >{}< ", name);
        } else {
            let _ = write!(out, "  {}  ", name);
        }
    }
    out
}

fn popups(d: &RiskDashboard, out: &mut String) {
    for p in d.alerts().popups() {
        let _ = writeln!(out, "  !{} [{}] {}: {}", p.id, p.class, p.title, p.message);
    }
}

fn dashboard_panel(d: &RiskDashboard, form: &RiskInput, out: &mut String) {
    let _ = writeln!(out, "Form{}:", if d.router().advanced_open() { " (advanced)" } else { "" });
    for (k, v) in form.iter() {
        let _ = writeln!(out, "  {} = {}", k, v);
    }
    if d.busy(Flow::Submit) {
        let _ = writeln!(out, "Analyzing...");
    }
    match d.status() {
        Status::Idle => {}
        Status::Summary(s) => {
            let _ = writeln!(out, "Summary: {}", s);
        }
        Status::ServerError(msg) => {
            let _ = writeln!(out, "Server error: {}", msg);
        }
        Status::NetworkError(msg) => {
            let _ = writeln!(out, "Network error: {}", msg);
        }
    }
    if !d.result_visible() {
        return;
    }
    if let Some(g) = d.gauge() {
        let _ = writeln!(out, "Risk {} {:>3}  {}", meter(g.chart.segments[0], BAR_WIDTH), g.readout, g.label);
    }
    if let Some(season) = d.season() {
        let _ = writeln!(out, "Season: {}", season);
    }
    if d.drivers_visible() {
        if let Some(ChartSpec::Bar(bar)) = d.charts().get(Canvas::Drivers).map(|h| &h.spec) {
            let _ = writeln!(out, "Top risk drivers:");
            for (label, value) in bar.labels.iter().zip(&bar.values) {
                let _ = writeln!(out, "  {:<10} {} {:.1}", label, meter(*value, BAR_WIDTH), value);
            }
        }
    }
    for note in d.adjustments() {
        let _ = writeln!(out, "  * {}", note);
    }
}

fn simulation_panel(d: &RiskDashboard, sliders: &Sliders, out: &mut String) {
    let _ = writeln!(out, "Rainfall deviation: {}", sliders.rain.value());
    let _ = writeln!(out, "Market volatility:  {}%", sliders.market.value());
    let _ = writeln!(out, "Input cost change:  {}%", sliders.cost.value());
    if d.busy(Flow::Simulate) {
        let _ = writeln!(out, "Simulating...");
    }
    if let Some(notice) = d.sim_status() {
        let _ = writeln!(out, "{}", notice);
    }
    if let Some(view) = d.simulation() {
        let text = view.chart.center_text.as_deref().unwrap_or("");
        let _ = writeln!(out, "Scenario {} {}", meter(view.score, BAR_WIDTH), text);
        for line in &view.narrative {
            let _ = writeln!(out, "{}", line);
        }
        let _ = writeln!(out, "{}", view.insight);
    }
}

fn alerts_panel(d: &RiskDashboard, out: &mut String) {
    for card in d.alerts().cards() {
        let _ = writeln!(out, "| {} {}: {}", card.border_color, card.title, card.message);
    }
}

fn help_panel(d: &RiskDashboard, out: &mut String) {
    for item in &d.recommendations().items {
        let _ = writeln!(out, "  {}", item);
    }
}

/// Full screen: tab bar, popups, then the visible panel.
pub fn render_screen(d: &RiskDashboard, form: &RiskInput, sliders: &Sliders) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", tabs(d));
    popups(d, &mut out);
    match d.router().active() {
        Panel::Dashboard => dashboard_panel(d, form, &mut out),
        Panel::Simulation => simulation_panel(d, sliders, &mut out),
        Panel::Alerts => alerts_panel(d, &mut out),
        Panel::AiHelp => help_panel(d, &mut out),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn meter_scales_and_clamps() {
        assert_eq!(meter(50.0, 10), "[#####.....]");
        assert_eq!(meter(0.0, 4), "[....]");
        assert_eq!(meter(140.0, 4), "[####]");
    }

    #[test]
    fn fresh_screen_shows_dashboard_tab() {
        let d = RiskDashboard::new(&Config::default());
        let mut form = RiskInput::new();
        form.set_text("Season", "HARVEST");
        let screen = render_screen(&d, &form, &Sliders::default());
        assert!(screen.contains(">Dashboard<"));
        assert!(screen.contains("Season = HARVEST"));
        assert!(!screen.contains("Risk ["));
    }
}
