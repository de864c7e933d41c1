use std::time::{Duration, Instant};

use serde_json::json;

use crate::charts::{AMBER, GREEN, RED};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{Alert, Severity};
use crate::view::Panel;

pub const STABLE_TITLE: &str = "Stable Condition";
pub const STABLE_MESSAGE: &str = "No active risk alerts. Farm conditions are within safe limits.";

pub fn border_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => RED,
        Severity::Warning => AMBER,
        Severity::Info => GREEN,
    }
}

pub fn popup_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "popup-critical",
        Severity::Warning => "popup-warning",
        Severity::Info => "popup-info",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertCard {
    pub border_color: &'static str,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub id: u64,
    pub class: &'static str,
    pub title: String,
    pub message: String,
    /// None for critical popups: they stay until clicked.
    pub dismiss_at: Option<Instant>,
}

#[derive(Debug)]
pub struct AlertPresenter {
    cards: Vec<AlertCard>,
    popups: Vec<Popup>,
    badge: Option<usize>,
    dismiss_after: Duration,
    next_popup_id: u64,
}

impl AlertPresenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            cards: Vec::new(),
            popups: Vec::new(),
            badge: None,
            dismiss_after,
            next_popup_id: 0,
        }
    }

    /// Replace the card list and raise one popup per alert. Nothing carries
    /// over from the previous render except popups still waiting to expire.
    pub fn render(&mut self, alerts: &[Alert], now: Instant) {
        self.cards.clear();

        if alerts.is_empty() {
            self.badge = None;
            self.popups.clear();
            self.cards.push(AlertCard {
                border_color: GREEN,
                title: STABLE_TITLE.to_string(),
                message: STABLE_MESSAGE.to_string(),
            });
            return;
        }

        self.badge = Some(alerts.len());
        for alert in alerts {
            self.cards.push(AlertCard {
                border_color: border_color(alert.severity),
                title: alert.title.clone(),
                message: alert.message.clone(),
            });

            self.next_popup_id += 1;
            let dismiss_at = match alert.severity {
                Severity::Critical => None,
                _ => Some(now + self.dismiss_after),
            };
            self.popups.push(Popup {
                id: self.next_popup_id,
                class: popup_class(alert.severity),
                title: alert.title.clone(),
                message: alert.message.clone(),
                dismiss_at,
            });
        }

        log(
            Level::Info,
            Domain::Alert,
            "alerts_rendered",
            obj(&[
                ("count", json!(alerts.len())),
                (
                    "critical",
                    json!(alerts.iter().filter(|a| a.severity == Severity::Critical).count()),
                ),
            ]),
        );
    }

    /// Drop popups whose deadline has passed. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.popups.len();
        self.popups.retain(|p| p.dismiss_at.map_or(true, |at| at > now));
        before - self.popups.len()
    }

    /// Remove the clicked popup and ask the router to open the alerts panel.
    pub fn click(&mut self, popup_id: u64) -> Option<Panel> {
        let pos = self.popups.iter().position(|p| p.id == popup_id)?;
        let popup = self.popups.remove(pos);
        log(
            Level::Debug,
            Domain::Alert,
            "popup_clicked",
            obj(&[("id", json!(popup.id)), ("class", v_str(popup.class))]),
        );
        Some(Panel::Alerts)
    }

    pub fn cards(&self) -> &[AlertCard] {
        &self.cards
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    pub fn badge(&self) -> Option<usize> {
        self.badge
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.popups.clear();
        self.badge = None;
    }
}
