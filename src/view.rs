use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Dashboard,
    Simulation,
    Alerts,
    AiHelp,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Dashboard, Panel::Simulation, Panel::Alerts, Panel::AiHelp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Dashboard => "dashboard",
            Panel::Simulation => "simulation",
            Panel::Alerts => "alerts",
            Panel::AiHelp => "ai_help",
        }
    }

    pub fn parse(raw: &str) -> Option<Panel> {
        match raw {
            "dashboard" => Some(Panel::Dashboard),
            "simulation" | "sim" => Some(Panel::Simulation),
            "alerts" => Some(Panel::Alerts),
            "help" | "ai" | "ai_help" => Some(Panel::AiHelp),
            _ => None,
        }
    }
}

/// Exactly one panel is visible; the last one shown wins. No history.
#[derive(Debug, Clone)]
pub struct ViewRouter {
    active: Panel,
    advanced_open: bool,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self {
            active: Panel::Dashboard,
            advanced_open: false,
        }
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, panel: Panel) {
        if self.active != panel {
            log(
                Level::Debug,
                Domain::View,
                "panel_switch",
                obj(&[("from", v_str(self.active.as_str())), ("to", v_str(panel.as_str()))]),
            );
        }
        self.active = panel;
    }

    pub fn show_dashboard(&mut self) {
        self.show(Panel::Dashboard);
    }

    pub fn show_simulation(&mut self) {
        self.show(Panel::Simulation);
    }

    pub fn show_alerts(&mut self) {
        self.show(Panel::Alerts);
    }

    pub fn show_ai_help(&mut self) {
        self.show(Panel::AiHelp);
    }

    pub fn active(&self) -> Panel {
        self.active
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.active == panel
    }

    /// Flip the advanced form fields section.
    pub fn toggle_advanced(&mut self) -> bool {
        self.advanced_open = !self.advanced_open;
        self.advanced_open
    }

    pub fn advanced_open(&self) -> bool {
        self.advanced_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(router: &ViewRouter) -> Vec<Panel> {
        Panel::ALL.iter().copied().filter(|p| router.is_visible(*p)).collect()
    }

    #[test]
    fn exactly_one_panel_visible_after_each_call() {
        let mut router = ViewRouter::new();
        assert_eq!(visible(&router), vec![Panel::Dashboard]);

        router.show_simulation();
        assert_eq!(visible(&router), vec![Panel::Simulation]);
        router.show_alerts();
        assert_eq!(visible(&router), vec![Panel::Alerts]);
        router.show_ai_help();
        assert_eq!(visible(&router), vec![Panel::AiHelp]);
        router.show_dashboard();
        assert_eq!(visible(&router), vec![Panel::Dashboard]);
    }

    #[test]
    fn repeated_show_is_stable() {
        let mut router = ViewRouter::new();
        router.show_alerts();
        router.show_alerts();
        assert_eq!(router.active(), Panel::Alerts);
    }

    #[test]
    fn advanced_toggle_flips() {
        let mut router = ViewRouter::new();
        assert!(router.toggle_advanced());
        assert!(!router.toggle_advanced());
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Panel::parse("help"), Some(Panel::AiHelp));
        assert_eq!(Panel::parse("sim"), Some(Panel::Simulation));
        assert_eq!(Panel::parse("settings"), None);
    }
}
