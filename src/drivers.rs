use crate::charts::{HorizontalBar, AMBER, GREEN, RED};
use crate::model::Breakdown;

pub const TOP_DRIVERS: usize = 3;
const RANK_COLORS: [&str; TOP_DRIVERS] = [RED, AMBER, GREEN];

/// Heaviest factors first; equal weights keep the backend's order.
pub fn top_drivers(breakdown: &Breakdown) -> Vec<(String, f64)> {
    let mut sorted = breakdown.entries().to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted.truncate(TOP_DRIVERS);
    sorted
}

/// `None` when there is no breakdown to show; the section stays hidden.
pub fn render_drivers(breakdown: Option<&Breakdown>) -> Option<HorizontalBar> {
    let top = top_drivers(breakdown?);
    Some(HorizontalBar {
        labels: top.iter().map(|(name, _)| name.to_uppercase()).collect(),
        values: top.iter().map(|(_, weight)| *weight).collect(),
        colors: RANK_COLORS[..top.len()].to_vec(),
        x_min: 0.0,
        x_max: 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(pairs: &[(&str, f64)]) -> Breakdown {
        Breakdown(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn keeps_three_heaviest_descending() {
        let b = breakdown(&[("a", 10.0), ("b", 90.0), ("c", 50.0), ("d", 5.0)]);
        let bar = render_drivers(Some(&b)).unwrap();
        assert_eq!(bar.labels, vec!["B", "C", "A"]);
        assert_eq!(bar.values, vec![90.0, 50.0, 10.0]);
        assert_eq!(bar.x_max, 100.0);
    }

    #[test]
    fn ties_keep_original_order() {
        let b = breakdown(&[("soil", 40.0), ("pest", 70.0), ("weather", 40.0), ("market", 40.0)]);
        let names: Vec<String> = top_drivers(&b).into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["pest", "soil", "weather"]);
    }

    #[test]
    fn absent_breakdown_is_noop() {
        assert!(render_drivers(None).is_none());
    }

    #[test]
    fn short_breakdown_renders_what_exists() {
        let bar = render_drivers(Some(&breakdown(&[("weather", 12.0)]))).unwrap();
        assert_eq!(bar.labels, vec!["WEATHER"]);
        assert_eq!(bar.colors, vec![RED]);
    }
}
