//! Bouncer Core - deterministic bounce transformations for pipeline fixtures
//!
//! A bounce call returns a transformed mirror of whatever it receives, so a
//! transformation pipeline sitting between a client and this service can be
//! verified end to end. This crate holds every rule and every call; hosts
//! (an RPC listener, the `bouncer` CLI, the golden runner) only move bytes.
//!
//! # Main Components
//!
//! - **Data model**: [`types`] records, schema-less [`value::DynamicValue`]
//!   trees and type-tagged [`any::AnyBox`] values
//! - **Transformers**: the [`transform::Bounce`] rules for scalars,
//!   wrappers, dynamic values and the recursive [`types::ComplexRecord`]
//! - **Field masks**: parsing, validation and post-transform pruning in
//!   [`field_mask`]
//! - **Calls**: the [`service::Bouncer`] trait, [`service::BounceService`]
//!   and JSON [`service::dispatch`]
//!
//! # Example
//!
//! ```
//! use bouncer_core::{dispatch, BounceService, Method};
//! use serde_json::json;
//!
//! # fn main() -> bouncer_core::Result<()> {
//! let response = dispatch(
//!     &BounceService::new(),
//!     Method::BounceScalars,
//!     &json!({"int32_val": 3, "string_val": "world", "bool_val": true}),
//!     None,
//! )?;
//!
//! assert_eq!(response["int32_val"], json!(6));
//! assert_eq!(response["string_val"], json!("hello world"));
//! assert_eq!(response["bool_val"], json!(false));
//! # Ok(())
//! # }
//! ```

pub mod any;
pub mod error;
pub mod field_mask;
mod float_json;
pub mod service;
pub mod time;
pub mod transform;
pub mod types;
pub mod value;

mod proptest_strategies;

pub use any::{AnyBox, KnownMessage, KnownType};
pub use error::{Error, Result, StatusCode};
pub use field_mask::{FieldMask, MaskTree};
pub use service::{dispatch, BounceService, Bouncer, Method};
pub use transform::Bounce;
pub use types::{
    BallIn, BallOut, Body, BounceGoodTimesRequest, BounceGoodTimesResponse,
    BounceMaskedFieldsRequest, BounceMaskedFieldsResponse, CallMetadata, ComplexRecord, Duration,
    EchoMsg, EnumValue, ExtraRecord, Header, Headers, HelloRequest, HelloResponse, ScalarRecord,
    Tail, WrappedString, WrapperRecord,
};
pub use value::{DynamicStruct, DynamicValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
