mod app;
mod config;
mod message;
mod sink;
mod transport;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use message::MessageError;
pub use sink::SinkError;
pub use transport::TransportError;
pub use validation::ValidationError;
