use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub predict_url: String,
    pub request_timeout_ms: u64,
    pub popup_dismiss_ms: u64,
    pub tick_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            predict_url: std::env::var("PREDICT_URL").unwrap_or_else(|_| "http://127.0.0.1:5000/predict".to_string()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000),
            popup_dismiss_ms: std::env::var("POPUP_DISMISS_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5_000),
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(250),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn popup_dismiss(&self) -> Duration {
        Duration::from_millis(self.popup_dismiss_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            predict_url: "http://127.0.0.1:5000/predict".to_string(),
            request_timeout_ms: 10_000,
            popup_dismiss_ms: 5_000,
            tick_ms: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.popup_dismiss(), Duration::from_millis(5000));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(cfg.predict_url.ends_with("/predict"));
    }

    #[test]
    fn tick_has_a_floor() {
        let cfg = Config { tick_ms: 0, ..Config::default() };
        assert_eq!(cfg.tick(), Duration::from_millis(10));
    }
}
