//! Reading the procedure name and input out of a request

use crate::error::RpcResult;
use crate::middleware::ProcedureType;
use crate::validation::check_input_size;
use crate::wire::INPUT_QUERY_PARAM;
use bytes::Bytes;
use http::Request;
use serde_json::Value;
use tracing::{debug, trace};

/// Procedure name from a path remainder: `/users.get/` becomes `users.get`.
pub(crate) fn procedure_name(pathname: &str) -> &str {
    pathname.trim_matches('/')
}

/// Extract the raw input for a procedure of kind `kind`.
///
/// Inputs that cannot be decoded become `null`; the input schema decides
/// whether that is acceptable. Oversized inputs are rejected before any
/// decoding.
pub(crate) fn extract_input(
    request: &Request<Bytes>,
    kind: ProcedureType,
    max_input_size: usize,
) -> RpcResult<Value> {
    match kind {
        ProcedureType::Query => {
            let Some(raw) = query_param(request, INPUT_QUERY_PARAM) else {
                trace!("No input parameter");
                return Ok(Value::Null);
            };
            check_input_size(raw.len(), max_input_size)?;
            Ok(decode_query_input(raw))
        }
        ProcedureType::Mutation => {
            let body = request.body();
            check_input_size(body.len(), max_input_size)?;
            Ok(decode_body_input(body))
        }
    }
}

fn query_param<'a>(request: &'a Request<Bytes>, name: &str) -> Option<&'a str> {
    request
        .uri()
        .query()?
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find_map(|(key, value)| (key == name).then_some(value))
}

fn decode_query_input(raw: &str) -> Value {
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(error = %e, "Input parameter is not valid percent-encoding; using null");
            return Value::Null;
        }
    };
    serde_json::from_str(&decoded).unwrap_or_else(|e| {
        debug!(error = %e, "Input parameter is not valid JSON; using null");
        Value::Null
    })
}

fn decode_body_input(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Request body is not valid JSON; using null");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RpcErrorCode;
    use serde_json::json;

    fn get(uri: &str) -> Request<Bytes> {
        Request::get(uri).body(Bytes::new()).unwrap()
    }

    fn post(body: &str) -> Request<Bytes> {
        Request::post("/p").body(Bytes::from(body.to_string())).unwrap()
    }

    #[test]
    fn test_procedure_name_trims_slashes() {
        assert_eq!(procedure_name("/hello"), "hello");
        assert_eq!(procedure_name("//users.get/"), "users.get");
        assert_eq!(procedure_name(""), "");
    }

    #[test]
    fn test_query_input_is_percent_decoded() {
        let encoded = urlencoding::encode(r#"{"name":"a b&c"}"#);
        let request = get(&format!("/p?x=1&input={encoded}&y=2"));
        let input = extract_input(&request, ProcedureType::Query, 1024).unwrap();
        assert_eq!(input, json!({"name": "a b&c"}));
    }

    #[test]
    fn test_missing_or_malformed_query_input_is_null() {
        let cases = ["/p", "/p?other=1", "/p?input", "/p?input=%7Bnope", "/p?input=%FF"];
        for uri in cases {
            let input = extract_input(&get(uri), ProcedureType::Query, 1024).unwrap();
            assert_eq!(input, Value::Null, "uri {uri}");
        }
    }

    #[test]
    fn test_body_input() {
        let input = extract_input(&post("[1,2]"), ProcedureType::Mutation, 1024).unwrap();
        assert_eq!(input, json!([1, 2]));

        assert_eq!(
            extract_input(&post(""), ProcedureType::Mutation, 1024).unwrap(),
            Value::Null
        );
        assert_eq!(
            extract_input(&post("{oops"), ProcedureType::Mutation, 1024).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_oversized_inputs_are_rejected() {
        let err = extract_input(&post(&"1".repeat(20)), ProcedureType::Mutation, 10).unwrap_err();
        assert_eq!(err.code, RpcErrorCode::PayloadTooLarge);

        let err = extract_input(&get(&format!("/p?input={}", "1".repeat(20))), ProcedureType::Query, 10)
            .unwrap_err();
        assert_eq!(err.code, RpcErrorCode::PayloadTooLarge);
    }
}
