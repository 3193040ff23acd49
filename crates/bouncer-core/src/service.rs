//! The call surface: typed handlers and JSON dispatch
//!
//! [`Bouncer`] has one method per call. [`BounceService`] is the stateless
//! implementation every host uses; [`dispatch`] decodes a JSON request body
//! for a [`Method`], runs it and encodes the response.
//!
//! Copyright (c) 2025 Bouncer Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::field_mask::{self, MaskTree};
use crate::time;
use crate::transform::Bounce;
use crate::types::{
    BallIn, BallOut, Body, BounceGoodTimesRequest, BounceGoodTimesResponse,
    BounceMaskedFieldsRequest, BounceMaskedFieldsResponse, CallMetadata, EchoMsg, Header,
    Headers, HelloRequest, HelloResponse, ScalarRecord, WrapperRecord,
};
use crate::value::DynamicStruct;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, debug_span};

/// Name of the service the calls belong to
pub const SERVICE_NAME: &str = "targetservice.Bouncer";

/// Every call the service answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    SayHello,
    BounceIt,
    BounceGoodTimes,
    BounceScalars,
    BounceWrappers,
    BounceStruct,
    BounceMaskedFields,
    GrowTail,
    Echo,
    EchoHeaders,
}

impl Method {
    pub const ALL: [Method; 10] = [
        Method::SayHello,
        Method::BounceIt,
        Method::BounceGoodTimes,
        Method::BounceScalars,
        Method::BounceWrappers,
        Method::BounceStruct,
        Method::BounceMaskedFields,
        Method::GrowTail,
        Method::Echo,
        Method::EchoHeaders,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::SayHello => "SayHello",
            Method::BounceIt => "BounceIt",
            Method::BounceGoodTimes => "BounceGoodTimes",
            Method::BounceScalars => "BounceScalars",
            Method::BounceWrappers => "BounceWrappers",
            Method::BounceStruct => "BounceStruct",
            Method::BounceMaskedFields => "BounceMaskedFields",
            Method::GrowTail => "GrowTail",
            Method::Echo => "Echo",
            Method::EchoHeaders => "EchoHeaders",
        }
    }

    /// One-line summary for listings
    pub fn description(self) -> &'static str {
        match self {
            Method::SayHello => "Prefix the greeting with \"hello \"",
            Method::BounceIt => "Greet the message and report how long ago `when` was",
            Method::BounceGoodTimes => "Postpone `when` and report the delay from `now`",
            Method::BounceScalars => "Double, negate or prefix every scalar field",
            Method::BounceWrappers => "Bounce present wrapped scalars, keep absent ones absent",
            Method::BounceStruct => "Bounce a schema-less struct recursively",
            Method::BounceMaskedFields => "Bounce a recursive record, then prune it to a field mask",
            Method::GrowTail => "Increment tail.count by one",
            Method::Echo => "Return the request unchanged",
            Method::EchoHeaders => "List the call metadata as key/value headers",
        }
    }

    /// `/targetservice.Bouncer/SayHello`
    pub fn full_path(self) -> String {
        format!("/{}/{}", SERVICE_NAME, self.name())
    }

    /// Whether the call reads a field mask
    pub fn accepts_field_mask(self) -> bool {
        matches!(self, Method::BounceMaskedFields)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Accepts the bare name or a full RPC path; the last `/` segment decides
    fn from_str(s: &str) -> Result<Self> {
        let name = s.rsplit('/').next().unwrap_or(s).trim();
        Method::ALL
            .into_iter()
            .find(|method| method.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownMethod {
                method: s.to_string(),
            })
    }
}

/// One method per call
pub trait Bouncer {
    fn say_hello(&self, request: HelloRequest) -> HelloResponse;

    fn bounce_it(&self, ball: BallIn) -> BallOut;

    fn bounce_good_times(&self, request: BounceGoodTimesRequest)
        -> Result<BounceGoodTimesResponse>;

    fn bounce_scalars(&self, record: ScalarRecord) -> ScalarRecord;

    fn bounce_wrappers(&self, record: WrapperRecord) -> WrapperRecord;

    fn bounce_struct(&self, value: DynamicStruct) -> DynamicStruct;

    fn bounce_masked_fields(
        &self,
        request: BounceMaskedFieldsRequest,
    ) -> Result<BounceMaskedFieldsResponse>;

    fn grow_tail(&self, body: Body) -> Result<Body>;

    fn echo(&self, message: EchoMsg) -> EchoMsg;

    /// `None` means the call arrived without metadata
    fn echo_headers(&self, metadata: Option<&CallMetadata>) -> Result<Headers>;
}

/// Stateless implementation of every call
#[derive(Debug, Clone, Copy, Default)]
pub struct BounceService;

impl BounceService {
    pub fn new() -> Self {
        Self
    }
}

impl Bouncer for BounceService {
    fn say_hello(&self, request: HelloRequest) -> HelloResponse {
        HelloResponse {
            reply: request.greeting.bounce(),
            boolean_test: request.boolean_test,
        }
    }

    fn bounce_it(&self, ball: BallIn) -> BallOut {
        time::bounce_it(ball)
    }

    fn bounce_good_times(
        &self,
        request: BounceGoodTimesRequest,
    ) -> Result<BounceGoodTimesResponse> {
        time::bounce_good_times(request)
    }

    fn bounce_scalars(&self, record: ScalarRecord) -> ScalarRecord {
        record.bounce()
    }

    fn bounce_wrappers(&self, record: WrapperRecord) -> WrapperRecord {
        record.bounce()
    }

    fn bounce_struct(&self, value: DynamicStruct) -> DynamicStruct {
        value.bounce()
    }

    fn bounce_masked_fields(
        &self,
        request: BounceMaskedFieldsRequest,
    ) -> Result<BounceMaskedFieldsResponse> {
        // Reject a malformed mask up front, but only prune once the whole
        // input has been bounced.
        let tree = request
            .field_mask
            .as_ref()
            .map(MaskTree::parse)
            .transpose()?;

        let mut complex_value = request.complex_value.unwrap_or_default().bounce();
        if let Some(tree) = tree {
            field_mask::prune(&mut complex_value, &tree);
        }

        Ok(BounceMaskedFieldsResponse { complex_value })
    }

    fn grow_tail(&self, mut body: Body) -> Result<Body> {
        let tail = body
            .tail
            .as_mut()
            .ok_or_else(|| Error::invalid_argument("tail", "GrowTail needs a tail to grow"))?;
        tail.count = tail.count.wrapping_add(1);
        Ok(body)
    }

    fn echo(&self, message: EchoMsg) -> EchoMsg {
        message
    }

    fn echo_headers(&self, metadata: Option<&CallMetadata>) -> Result<Headers> {
        let metadata = metadata.ok_or_else(|| Error::DataLoss {
            message: "EchoHeaders: failed to get metadata".to_string(),
        })?;

        let headers = metadata
            .iter()
            .map(|(key, values)| Header {
                key: key.to_string(),
                value: values.join(", "),
            })
            .collect();

        Ok(Headers { headers })
    }
}

/// Run `method` on a JSON request body and return the JSON response
pub fn dispatch<B: Bouncer + ?Sized>(
    service: &B,
    method: Method,
    request: &Value,
    metadata: Option<&CallMetadata>,
) -> Result<Value> {
    let span = debug_span!("dispatch", method = %method);
    let _guard = span.enter();

    let response = route(service, method, request, metadata);
    match &response {
        Ok(_) => debug!("Call completed"),
        Err(err) => debug!(code = %err.code(), error = %err, "Call failed"),
    }
    response
}

fn route<B: Bouncer + ?Sized>(
    service: &B,
    method: Method,
    request: &Value,
    metadata: Option<&CallMetadata>,
) -> Result<Value> {
    match method {
        Method::SayHello => encode(service.say_hello(decode(method, request)?)),
        Method::BounceIt => encode(service.bounce_it(decode(method, request)?)),
        Method::BounceGoodTimes => encode(service.bounce_good_times(decode(method, request)?)?),
        Method::BounceScalars => encode(service.bounce_scalars(decode(method, request)?)),
        Method::BounceWrappers => encode(service.bounce_wrappers(decode(method, request)?)),
        Method::BounceStruct => encode(service.bounce_struct(decode(method, request)?)),
        Method::BounceMaskedFields => {
            encode(service.bounce_masked_fields(decode(method, request)?)?)
        }
        Method::GrowTail => encode(service.grow_tail(decode(method, request)?)?),
        Method::Echo => encode(service.echo(decode(method, request)?)),
        Method::EchoHeaders => encode(service.echo_headers(metadata)?),
    }
}

fn decode<T: DeserializeOwned>(method: Method, request: &Value) -> Result<T> {
    // A missing body is an empty message
    let body = if request.is_null() {
        Value::Object(Default::default())
    } else {
        request.clone()
    };

    serde_json::from_value(body).map_err(|err| {
        Error::invalid_argument("request", format!("not a valid {} request: {}", method, err))
    })
}

fn encode<T: Serialize>(response: T) -> Result<Value> {
    serde_json::to_value(response).map_err(|source| Error::Json {
        message: "failed to encode response".to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tail;
    use serde_json::json;

    #[test]
    fn test_method_parsing() {
        assert_eq!("SayHello".parse::<Method>().unwrap(), Method::SayHello);
        assert_eq!(
            "/targetservice.Bouncer/BounceMaskedFields".parse::<Method>().unwrap(),
            Method::BounceMaskedFields
        );
        assert_eq!("echoheaders".parse::<Method>().unwrap(), Method::EchoHeaders);
        assert!(matches!(
            "Nope".parse::<Method>(),
            Err(Error::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_full_path_roundtrip() {
        for method in Method::ALL {
            assert_eq!(method.full_path().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_grow_tail_twice() {
        let service = BounceService::new();
        let body = Body {
            name: "lizard".to_string(),
            tail: Some(Tail { count: 5 }),
        };
        let once = service.grow_tail(body).unwrap();
        assert_eq!(once.tail, Some(Tail { count: 6 }));
        let twice = service.grow_tail(once).unwrap();
        assert_eq!(twice.tail, Some(Tail { count: 7 }));
        assert_eq!(twice.name, "lizard");
    }

    #[test]
    fn test_grow_tail_wraps_and_requires_tail() {
        let service = BounceService::new();
        let grown = service
            .grow_tail(Body {
                name: String::new(),
                tail: Some(Tail { count: i32::MAX }),
            })
            .unwrap();
        assert_eq!(grown.tail.unwrap().count, i32::MIN);
        assert!(matches!(
            service.grow_tail(Body::default()),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_echo_headers() {
        let service = BounceService::new();
        let mut metadata = CallMetadata::new();
        metadata.insert("X-B", "2");
        metadata.insert("x-a", "1");
        metadata.insert("X-A", "one");

        let headers = service.echo_headers(Some(&metadata)).unwrap().headers;
        assert_eq!(
            headers,
            vec![
                Header { key: "x-a".into(), value: "1, one".into() },
                Header { key: "x-b".into(), value: "2".into() },
            ]
        );
        assert!(matches!(
            service.echo_headers(None),
            Err(Error::DataLoss { .. })
        ));
    }

    #[test]
    fn test_dispatch_rejects_malformed_body() {
        let err = dispatch(
            &BounceService,
            Method::BounceScalars,
            &json!({"int32_val": "three"}),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_dispatch_null_body_is_empty_message() {
        let response = dispatch(&BounceService, Method::SayHello, &Value::Null, None).unwrap();
        assert_eq!(response, json!({"reply": "hello ", "boolean_test": false}));
    }
}
