pub const PLACEHOLDER: &str = "No recommendations available yet.";
pub const CHECK: &str = "✔";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationList {
    pub items: Vec<String>,
    pub badge: Option<usize>,
}

pub fn render_recommendations(recommendations: &[String]) -> RecommendationList {
    if recommendations.is_empty() {
        return RecommendationList {
            items: vec![PLACEHOLDER.to_string()],
            badge: None,
        };
    }
    RecommendationList {
        items: recommendations.iter().map(|r| format!("{} {}", CHECK, r)).collect(),
        badge: Some(recommendations.len()),
    }
}
