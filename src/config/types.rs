use std::time::Duration;

use serde::Deserialize;

use crate::error::ValidationError;
use crate::sweep::{SweepGrid, SweepPlan};

/// Contents of `brokerbench.toml` / `brokerbench.json`. Every field is
/// optional; command-line values take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub broker: Option<String>,
    pub connect_timeout: Option<DurationValue>,
    pub results_dir: Option<String>,
    pub checkpoint_every: Option<usize>,
    pub plan: Option<SweepPlan>,
    pub instances: Option<u32>,
    pub first_id: Option<u32>,
    pub timing: Option<TimingConfig>,
    pub grid: Option<SweepGrid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimingConfig {
    pub settle: Option<DurationValue>,
    #[serde(alias = "run_duration")]
    pub duration: Option<DurationValue>,
    pub buffer: Option<DurationValue>,
    pub cooldown: Option<DurationValue>,
}

/// Either whole seconds or a string with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
