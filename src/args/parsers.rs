use std::num::NonZeroU32;
use std::time::Duration;

use super::types::{PositiveU32, PositiveUsize};
use crate::config::parse_duration_value;
use crate::domain::QosLevel;
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u32(s: &str) -> AppResult<PositiveU32> {
    s.parse::<PositiveU32>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::from)
}

pub(super) fn parse_qos_arg(s: &str) -> AppResult<QosLevel> {
    s.parse::<QosLevel>().map_err(AppError::from)
}

pub(super) fn parse_publisher_count(s: &str) -> AppResult<NonZeroU32> {
    let value = parse_positive_u32(s)?;
    NonZeroU32::new(value.get())
        .ok_or_else(|| AppError::validation(ValidationError::ValueTooSmall { min: 1 }))
}
