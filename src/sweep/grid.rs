use std::num::NonZeroU32;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{QosLevel, RunParameters};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SweepPlan {
    /// Every combination of the benchmark grid (162 runs)
    #[default]
    Full,
    /// Small grid for quick checks (4 runs)
    Reduced,
    /// One single-publisher run per QoS level
    Handshake,
    /// Grid taken from the `[grid]` config section
    Custom,
}

impl SweepPlan {
    /// Base grid of this plan before command-line axis overrides. The
    /// handshake plan is not a grid and yields `None`.
    ///
    /// `custom` takes the config grid when there is one, else the full grid
    /// when `has_overrides` says the command line narrows it.
    ///
    /// # Errors
    ///
    /// Returns an error for `custom` with neither a config grid nor
    /// overrides.
    pub fn grid(
        self,
        custom: Option<&SweepGrid>,
        has_overrides: bool,
    ) -> Result<Option<SweepGrid>, ValidationError> {
        match self {
            SweepPlan::Full => Ok(Some(SweepGrid::full())),
            SweepPlan::Reduced => Ok(Some(SweepGrid::reduced())),
            SweepPlan::Handshake => Ok(None),
            SweepPlan::Custom => custom
                .cloned()
                .or_else(|| has_overrides.then(SweepGrid::full))
                .map(Some)
                .ok_or(ValidationError::MissingCustomGrid),
        }
    }
}

/// Axes of a Cartesian sweep. Axes missing from a config file fall back to
/// the full grid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepGrid {
    pub sub_qos: Vec<QosLevel>,
    pub qos: Vec<QosLevel>,
    pub delays: Vec<u64>,
    pub message_sizes: Vec<usize>,
    pub instance_counts: Vec<NonZeroU32>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self::full()
    }
}

impl SweepGrid {
    #[must_use]
    pub fn full() -> Self {
        Self {
            sub_qos: QosLevel::ALL.to_vec(),
            qos: QosLevel::ALL.to_vec(),
            delays: vec![0, 100],
            message_sizes: vec![0, 1000, 4000],
            instance_counts: counts(&[1, 5, 10]),
        }
    }

    #[must_use]
    pub fn reduced() -> Self {
        Self {
            sub_qos: vec![QosLevel::AtMostOnce],
            qos: vec![QosLevel::AtMostOnce, QosLevel::AtLeastOnce],
            delays: vec![0],
            message_sizes: vec![0],
            instance_counts: counts(&[1, 5]),
        }
    }

    /// Number of runs `expand` produces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sub_qos
            .len()
            .saturating_mul(self.qos.len())
            .saturating_mul(self.delays.len())
            .saturating_mul(self.message_sizes.len())
            .saturating_mul(self.instance_counts.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Errors
    ///
    /// Returns an error naming the first empty axis.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let axes = [
            ("sub_qos", self.sub_qos.is_empty()),
            ("qos", self.qos.is_empty()),
            ("delays", self.delays.is_empty()),
            ("message_sizes", self.message_sizes.is_empty()),
            ("instance_counts", self.instance_counts.is_empty()),
        ];
        axes.iter().find(|(_, empty)| *empty).map_or(Ok(()), |(axis, _)| {
            Err(ValidationError::EmptyGridAxis { axis: *axis })
        })
    }

    /// Cartesian product, subscriber QoS outermost and publisher count
    /// innermost.
    ///
    /// # Errors
    ///
    /// Returns an error when an axis is empty.
    pub fn expand(&self) -> Result<Vec<RunParameters>, ValidationError> {
        self.validate()?;
        let mut runs = Vec::with_capacity(self.len());
        for subscribe_qos in &self.sub_qos {
            for publish_qos in &self.qos {
                for delay_ms in &self.delays {
                    for payload_size in &self.message_sizes {
                        for publisher_count in &self.instance_counts {
                            runs.push(RunParameters {
                                publish_qos: *publish_qos,
                                subscribe_qos: *subscribe_qos,
                                delay_ms: *delay_ms,
                                payload_size: *payload_size,
                                publisher_count: *publisher_count,
                            });
                        }
                    }
                }
            }
        }
        Ok(runs)
    }
}

/// One run per QoS level with a single publisher, no delay and no filler,
/// subscribing at the same level it publishes at.
#[must_use]
pub fn handshake_runs() -> Vec<RunParameters> {
    QosLevel::ALL
        .iter()
        .map(|qos| RunParameters {
            publish_qos: *qos,
            subscribe_qos: *qos,
            delay_ms: 0,
            payload_size: 0,
            publisher_count: NonZeroU32::MIN,
        })
        .collect()
}

fn counts(values: &[u32]) -> Vec<NonZeroU32> {
    values.iter().copied().filter_map(NonZeroU32::new).collect()
}
