//! latrd-core: Core types for LATRD event reconstruction.
//!
//! This crate provides the types shared between the decoder and the
//! reconstruction pipeline: the output channels and the frames they emit,
//! the structure-of-arrays event batch a decoded packet fills, and the
//! common error type.
//!

pub mod error;
pub mod events;
pub mod frame;

pub use error::{Error, Result};
pub use events::EventBatch;
pub use frame::{Channel, ChannelData, DataType, OutputFrame};
