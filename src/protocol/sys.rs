use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One broker administrative value. Finite numeric payloads become numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SysValue {
    Number(f64),
    Text(String),
}

impl SysValue {
    #[must_use]
    pub fn parse(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => SysValue::Number(number),
            Ok(_) | Err(_) => SysValue::Text(text.into_owned()),
        }
    }
}

/// Side-channel bag keyed by full `$SYS/...` topic, passed through untouched.
pub type SysMetrics = BTreeMap<String, SysValue>;
