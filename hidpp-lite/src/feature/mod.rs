//! Specific device feature implementations.

use std::error::Error;

use thiserror::Error;

use crate::channel::ChannelError;

pub mod change_host;
pub mod feature_set;
pub mod root;

/// Represents an error that can occur while calling a feature function.
#[derive(Error, Debug)]
pub enum FeatureError<T: Error> {
    /// The underlying channel failed to carry the request.
    #[error("channel error")]
    Channel(#[from] ChannelError<T>),

    /// The device does not support the requested feature.
    #[error("the device does not support the requested feature")]
    NotSupported,
}
