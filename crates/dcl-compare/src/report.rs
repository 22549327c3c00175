use dcl_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Mean return of one policy, optionally relative to a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub policy: String,
    pub mean: Reward,
    pub error: Reward,
    pub trajectories: usize,
    /// Mean paired difference `policy - benchmark`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub difference: Option<Reward>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub difference_error: Option<Reward>,
}

/// Results of one comparison run, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub benchmark: Option<String>,
    pub summaries: Vec<Summary>,
}

impl Report {
    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }
    pub fn get(&self, policy: &str) -> Option<&Summary> {
        self.summaries.iter().find(|s| s.policy == policy)
    }
    pub fn json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(
            f,
            "{:<32}{:>16}{:>16}{:>16}{:>16}",
            "policy", "mean", "stderr", "difference", "stderr"
        )?;
        for summary in self.summaries.iter() {
            write!(
                f,
                "{:<32}{:>16.4}{:>16.4}",
                summary.policy, summary.mean, summary.error
            )?;
            match (summary.difference, summary.difference_error) {
                (Some(d), Some(e)) => writeln!(f, "{:>16.4}{:>16.4}", d, e)?,
                _ => writeln!(f)?,
            }
        }
        if let Some(ref benchmark) = self.benchmark {
            writeln!(f, "differences relative to {}", benchmark)?;
        }
        Ok(())
    }
}
