//! Chart descriptions and the canvases that own them.
//!
//! A chart is plain data describing what a charting backend should draw. Each
//! [`Canvas`] owns at most one live chart: installing a new one destroys the
//! previous handle first. The registry counts creations and destructions so
//! callers (and tests) can check that no handle leaks.

use crate::logging::log_render;

pub const TRACK_COLOR: &str = "#e0e0e0";
pub const GREEN: &str = "#2e7d32";
pub const AMBER: &str = "#f4b400";
pub const RED: &str = "#d32f2f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canvas {
    Gauge,
    SimulationGauge,
    Drivers,
}

impl Canvas {
    pub const ALL: [Canvas; 3] = [Canvas::Gauge, Canvas::SimulationGauge, Canvas::Drivers];

    fn index(self) -> usize {
        match self {
            Canvas::Gauge => 0,
            Canvas::SimulationGauge => 1,
            Canvas::Drivers => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Canvas::Gauge => "fsiGauge",
            Canvas::SimulationGauge => "simulationGauge",
            Canvas::Drivers => "riskDriverChart",
        }
    }
}

/// Ring chart: filled segment then remaining track.
#[derive(Debug, Clone, PartialEq)]
pub struct Doughnut {
    pub segments: [f64; 2],
    pub colors: [&'static str; 2],
    pub cutout_pct: u8,
    pub center_text: Option<String>,
}

impl Doughnut {
    pub fn ring(score: f64, color: &'static str) -> Self {
        Self {
            segments: [score, 100.0 - score],
            colors: [color, TRACK_COLOR],
            cutout_pct: 80,
            center_text: None,
        }
    }

    pub fn with_center_text(mut self, text: String) -> Self {
        self.center_text = Some(text);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalBar {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<&'static str>,
    pub x_min: f64,
    pub x_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Doughnut(Doughnut),
    Bar(HorizontalBar),
}

impl ChartSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ChartSpec::Doughnut(_) => "doughnut",
            ChartSpec::Bar(_) => "bar",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartHandle {
    pub id: u64,
    pub spec: ChartSpec,
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    slots: [Option<ChartHandle>; 3],
    next_id: u64,
    created: u64,
    destroyed: u64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy whatever lives on `canvas`, then install `spec`. Returns the new handle id.
    pub fn install(&mut self, canvas: Canvas, spec: ChartSpec) -> u64 {
        let replaced = self.destroy(canvas);
        self.next_id += 1;
        self.created += 1;
        log_render(canvas.as_str(), spec.kind(), replaced);
        self.slots[canvas.index()] = Some(ChartHandle { id: self.next_id, spec });
        self.next_id
    }

    /// Returns true when a live chart was destroyed.
    pub fn destroy(&mut self, canvas: Canvas) -> bool {
        match self.slots[canvas.index()].take() {
            Some(_) => {
                self.destroyed += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, canvas: Canvas) -> Option<&ChartHandle> {
        self.slots[canvas.index()].as_ref()
    }

    pub fn live_count(&self, canvas: Canvas) -> usize {
        usize::from(self.slots[canvas.index()].is_some())
    }

    /// Charts created but never destroyed. Always equals the number of occupied slots.
    pub fn outstanding(&self) -> u64 {
        self.created - self.destroyed
    }

    pub fn clear(&mut self) {
        for canvas in Canvas::ALL {
            self.destroy(canvas);
        }
    }
}
