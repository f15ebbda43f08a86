use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid QoS level '{value}'. Use 0, 1, or 2.")]
    InvalidQos { value: String },
    #[error("Unsupported broker scheme '{scheme}'. Use mqtt:// or memory://.")]
    UnsupportedBrokerScheme { scheme: String },
    #[error("Broker address '{value}' has no host.")]
    BrokerMissingHost { value: String },
    #[error("Invalid broker address '{value}': {source}")]
    InvalidBrokerUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("The in-process broker (memory://) is only available to the `local` command.")]
    MemoryBrokerNotAllowed,
    #[error("Sweep grid axis '{axis}' must not be empty.")]
    EmptyGridAxis { axis: &'static str },
    #[error("The custom sweep plan needs a [grid] config section or grid axes on the command line.")]
    MissingCustomGrid,
    #[error("Publisher ids must start at 1 (got {first}).")]
    PublisherIdZero { first: u32 },
    #[error("Publisher id range overflows (first {first}, count {count}).")]
    PublisherIdOverflow { first: u32, count: u32 },
}
