use std::fmt;

use url::Url;

use crate::error::ValidationError;

pub const DEFAULT_MQTT_PORT: u16 = 1883;

const MQTT_SCHEME: &str = "mqtt";
const TCP_SCHEME: &str = "tcp";
const MEMORY_SCHEME: &str = "memory";

/// Where the broker lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEndpoint {
    Mqtt { host: String, port: u16 },
    /// In-process broker; only meaningful when every participant shares the
    /// process.
    Memory,
}

impl std::str::FromStr for BrokerEndpoint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("{}://{}", MQTT_SCHEME, trimmed)
        };
        let url = Url::parse(&with_scheme).map_err(|err| ValidationError::InvalidBrokerUrl {
            value: trimmed.to_owned(),
            source: err,
        })?;
        match url.scheme() {
            MEMORY_SCHEME => Ok(BrokerEndpoint::Memory),
            MQTT_SCHEME | TCP_SCHEME => {
                let host = url
                    .host_str()
                    .filter(|host| !host.is_empty())
                    .ok_or_else(|| ValidationError::BrokerMissingHost {
                        value: trimmed.to_owned(),
                    })?;
                Ok(BrokerEndpoint::Mqtt {
                    host: host.to_owned(),
                    port: url.port().unwrap_or(DEFAULT_MQTT_PORT),
                })
            }
            other => Err(ValidationError::UnsupportedBrokerScheme {
                scheme: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerEndpoint::Mqtt { host, port } => write!(f, "mqtt://{}:{}", host, port),
            BrokerEndpoint::Memory => write!(f, "memory://"),
        }
    }
}
