use thiserror::Error;

use super::devices::DeviceMask;
use super::usecase::{StreamId, UsecaseClass, UsecaseId};
use crate::routing::catalog::Route;

/// Errors surfaced by the routing engine and the stream lifecycle.
///
/// Resolution misses are not errors: resolvers degrade to "no route" or a
/// best-effort default and log instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("invalid device mask: {0}")]
    InvalidDeviceMask(DeviceMask),

    #[error("unknown usecase: {0}")]
    UnknownUsecase(UsecaseId),

    #[error("usecase already active: {0}")]
    UsecaseExists(UsecaseId),

    #[error("unknown stream: {0}")]
    UnknownStream(StreamId),

    #[error("route {0} disabled with reference count 0")]
    DoubleDisable(Route),

    #[error("no pcm profile for {class:?} on devices {devices}")]
    NoPcmProfile {
        class: UsecaseClass,
        devices: DeviceMask,
    },

    #[error("no primary output stream is open")]
    NoPrimaryOutput,

    #[error("invalid stream configuration: {0}")]
    InvalidStreamConfig(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    #[error("transport error: {0}")]
    Transport(String),
}
