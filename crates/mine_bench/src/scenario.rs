use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub ticks: u64,
    /// Simulated seconds per tick.
    #[serde(default = "default_delta")]
    pub delta: f64,
    #[serde(default = "default_metrics_every")]
    pub metrics_every: u64,
    pub seeds: SeedSpec,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// Constant name → replacement value, applied onto `constants.json`.
    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,
}

fn default_delta() -> f64 {
    0.1
}

fn default_metrics_every() -> u64 {
    50
}

fn default_content_dir() -> String {
    "./content".to_string()
}

fn default_autopilot() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeedSpec {
    List(Vec<u64>),
    Range { range: [u64; 2] },
}

impl SeedSpec {
    pub fn expand(&self) -> Vec<u64> {
        match self {
            SeedSpec::List(seeds) => seeds.clone(),
            SeedSpec::Range { range } => (range[0]..=range[1]).collect(),
        }
    }
}

impl Scenario {
    /// Parameters recorded alongside every run of this scenario.
    pub fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "ticks": self.ticks,
            "delta": self.delta,
            "metrics_every": self.metrics_every,
            "content_dir": self.content_dir,
            "autopilot": self.autopilot,
            "overrides": self.overrides,
        })
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if scenario.name.is_empty() {
        bail!("scenario 'name' must not be empty");
    }
    if scenario.ticks == 0 {
        bail!("scenario 'ticks' must be > 0");
    }
    if scenario.metrics_every == 0 {
        bail!("scenario 'metrics_every' must be > 0");
    }
    if !(scenario.delta.is_finite() && scenario.delta > 0.0) {
        bail!("scenario 'delta' must be a positive number of seconds");
    }
    if scenario.seeds.expand().is_empty() {
        bail!("scenario 'seeds' must produce at least one seed");
    }
    Ok(scenario)
}
