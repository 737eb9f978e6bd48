//! Router dispatch and response encoding tests

use crate::prelude::*;
use crate::{RouterErrorDetails, RouterResponse};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Response, StatusCode};
use serde_json::{Value, json};
use std::sync::Mutex;

#[derive(Clone, Debug, Default)]
struct AppContext {
    admin: bool,
}

fn build_router(config: RouterConfig) -> Router<AppContext> {
    let (mut router, procedure) = crate::init_with_config::<AppContext>(config).unwrap();

    router
        .register(
            procedure
                .name("hello")
                .input(s::string().min_length(5).message("Too short"))
                .output(s::string())
                .query(|_ctx, name: String| async move { Ok(format!("hello {name}")) }),
        )
        .register(
            procedure
                .name("throw")
                .input(s::any())
                .query(|_ctx, _input: Value| async {
                    Err::<(), BoxError>(RpcError::unauthorized("Sign in first").into())
                }),
        )
        .register(
            procedure
                .name("greet")
                .input(s::optional(s::string()))
                .output(s::string())
                .query(|_ctx, name: Option<String>| async move {
                    Ok(name.unwrap_or_else(|| "anonymous".to_string()))
                }),
        )
        .register(
            procedure
                .name("users.create")
                .input(s::object().field("name", s::string()))
                .output(s::any())
                .mutation(|ctx: Context<AppContext>, user: serde_json::Map<String, Value>| async move {
                    Ok(json!({ "created": user["name"], "by_admin": ctx.admin }))
                }),
        )
        .register(procedure.name("explode").mutation(|_ctx, ()| async {
            if true {
                panic!("handler blew up");
            }
            Ok(())
        }))
        .register(procedure.name("traced").query(|_ctx, ()| async {
            Err::<(), BoxError>(
                RpcError::internal("Broken invariant").with_stack_trace("at traced::handler").into(),
            )
        }));
    router
}

fn router() -> Router<AppContext> {
    build_router(RouterConfig::default())
}

fn get(path: &str, input: Option<&Value>) -> http::Request<Bytes> {
    let uri = match input {
        Some(input) => format!(
            "{path}?input={}",
            urlencoding::encode(&serde_json::to_string(input).unwrap())
        ),
        None => path.to_string(),
    };
    http::Request::get(uri).body(Bytes::new()).unwrap()
}

fn request(method: Method, path: &str, body: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

fn body(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn test_query_success() {
    let response = router()
        .handle(AppContext::default(), get("/hello", Some(&json!("world"))))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(body(&response), json!({"result": {"data": "hello world"}}));
}

#[tokio::test]
async fn test_input_rejection_is_400_with_issues() {
    let response = router()
        .handle(AppContext::default(), get("/hello", Some(&json!("hi"))))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body(&response);
    assert_eq!(body["code"], -32700);
    assert_eq!(body["message"], "Error parsing input");
    assert_eq!(body["data"]["code"], "PARSE_ERROR");
    assert_eq!(body["data"]["httpStatus"], 400);
    assert_eq!(body["data"]["procedure"], "hello");
    assert_eq!(body["data"]["issues"][0]["message"], "Too short");
}

#[tokio::test]
async fn test_handler_error_status_mirrors_code() {
    let response = router()
        .handle(AppContext::default(), get("/throw", Some(&json!({"any": "thing"}))))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let decoded: RouterResponse = serde_json::from_slice(response.body()).unwrap();
    let RouterResponse::Failure(failure) = decoded else {
        panic!("expected failure body");
    };
    assert_eq!(failure.code, -32001);
    assert_eq!(failure.data.code, RpcErrorCode::Unauthorized);
    assert_eq!(failure.data.message, "Sign in first");
    assert_eq!(failure.data.input, Some(json!({"any": "thing"})));
}

#[tokio::test]
async fn test_unknown_procedure_is_404() {
    let router = router();
    let response = router.handle(AppContext::default(), get("/nope", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body(&response);
    assert_eq!(body["data"]["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Procedure not found!");
    assert_eq!(body["data"]["procedure"], "nope");

    let err = router.resolve("nope").err().expect("missing procedure");
    assert_eq!(err.code, RpcErrorCode::NotFound);
}

#[tokio::test]
async fn test_verb_mismatch_is_405() {
    let router = router();

    let response = router
        .handle(AppContext::default(), request(Method::POST, "/hello", "\"world\""))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body(&response);
    assert_eq!(body["data"]["code"], "METHOD_NOT_SUPPORTED");
    assert_eq!(body["message"], "Method POST not supported for procedure hello");

    let response = router
        .handle(AppContext::default(), get("/users.create", Some(&json!({"name": "ada"}))))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = router
        .handle(AppContext::default(), request(Method::PUT, "/hello", ""))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        self::body(&response)["message"],
        "Method PUT not supported for procedure hello"
    );
}

#[tokio::test]
async fn test_mutation_reads_body_and_context() {
    let response = router()
        .handle(
            AppContext { admin: true },
            request(Method::POST, "/users.create", r#"{"name":"ada","extra":1}"#),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(&response),
        json!({"result": {"data": {"created": "ada", "by_admin": true}}})
    );
}

#[tokio::test]
async fn test_malformed_input_is_treated_as_null() {
    let router = router();

    // Optional input accepts the substituted null.
    let response = router
        .handle(AppContext::default(), get("/greet?input=%7Bbroken", None))
        .await;
    assert_eq!(body(&response), json!({"result": {"data": "anonymous"}}));

    // A required string rejects it during validation.
    let response = router
        .handle(AppContext::default(), get("/hello?input=%7Bbroken", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(&response)["data"]["issues"][0]["message"],
        "Expected string, received null"
    );

    let response = router
        .handle(AppContext::default(), request(Method::POST, "/users.create", "not json"))
        .await;
    assert_eq!(body(&response)["data"]["code"], "PARSE_ERROR");
}

#[tokio::test]
async fn test_mount_prefix_is_stripped() {
    let router = build_router(RouterConfig::new().with_mount_prefix("/rpc/"));

    let response = router
        .handle(AppContext::default(), get("/rpc/hello/", Some(&json!("world"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .handle(AppContext::default(), get("/hello", Some(&json!("world"))))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .handle(AppContext::default(), get("/rpcx/hello", Some(&json!("world"))))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // `process` takes the pathname as given.
    let response = router
        .process("hello", AppContext::default(), get("/anything", Some(&json!("world"))))
        .await;
    assert_eq!(body(&response), json!({"result": {"data": "hello world"}}));
}

#[tokio::test]
async fn test_handler_panic_is_500() {
    let response = router()
        .handle(AppContext::default(), request(Method::POST, "/explode", ""))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body(&response);
    assert_eq!(body["data"]["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_stack_only_in_development_mode() {
    let dev = build_router(RouterConfig::new().with_error(ErrorConfig::development()));
    let response = dev.handle(AppContext::default(), get("/traced", None)).await;
    assert_eq!(body(&response)["data"]["stack"], "at traced::handler");

    let prod = build_router(RouterConfig::new().with_error(ErrorConfig::production()));
    let response = prod.handle(AppContext::default(), get("/traced", None)).await;
    let body = body(&response);
    assert_eq!(body["data"]["message"], "Broken invariant");
    assert!(body["data"].get("stack").is_none());
}

#[tokio::test]
async fn test_oversized_input_is_413() {
    let router = build_router(RouterConfig::new().with_max_input_size(16));
    let big = format!(r#"{{"name":"{}"}}"#, "a".repeat(64));

    let response = router
        .handle(AppContext::default(), request(Method::POST, "/users.create", &big))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body(&response)["data"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_router_tap_sees_failures_and_may_panic() {
    let seen = Arc::new(Mutex::new(Vec::<RouterErrorDetails>::new()));
    let sink = seen.clone();

    let mut router = router();
    router.tap_on_error(move |details: &RouterErrorDetails| {
        sink.lock().unwrap().push(details.clone());
        panic!("tap failure must not leak");
    });

    let ok = router
        .handle(AppContext::default(), get("/hello", Some(&json!("world"))))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(seen.lock().unwrap().is_empty());

    let failed = router.handle(AppContext::default(), get("/missing", None)).await;
    assert_eq!(failed.status(), StatusCode::NOT_FOUND);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].code, RpcErrorCode::NotFound);
    assert_eq!(seen[0].http_status, 404);
}

#[tokio::test]
async fn test_registration_overwrites_by_name() {
    let (mut router, procedure) = crate::init::<AppContext>();
    router
        .register(
            procedure
                .name("version")
                .output(s::integer())
                .query(|_ctx, ()| async { Ok(1) }),
        )
        .register(
            procedure
                .name("version")
                .output(s::integer())
                .query(|_ctx, ()| async { Ok(2) }),
        );

    assert_eq!(router.procedures(), vec!["version".to_string()]);
    let output = router
        .call("version", AppContext::default(), Value::Null)
        .await
        .unwrap();
    assert_eq!(output, json!(2));
}

#[tokio::test]
async fn test_listing_and_specs_are_sorted() {
    let router = router();
    assert_eq!(
        router.procedures(),
        vec!["explode", "greet", "hello", "throw", "traced", "users.create"]
    );
    assert!(router.contains("hello"));
    assert!(!router.contains("nope"));

    let specs = router.specs();
    let names: Vec<_> = specs.procedures.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, router.procedures());

    let exported = serde_json::to_value(&specs).unwrap();
    let hello = &exported["procedures"][2];
    assert_eq!(hello["name"], "hello");
    assert_eq!(hello["method"], "GET");
    assert_eq!(hello["inputSchema"]["type"], "string");
    assert_eq!(hello["inputSchema"]["minLength"], 5);
    assert_eq!(exported["procedures"][5]["method"], "POST");
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Router::<AppContext>::with_config(RouterConfig::new().with_max_input_size(0))
        .unwrap_err();
    assert_eq!(err, crate::ConfigValidationError::InvalidMaxInputSize);
    assert!(crate::init_with_config::<AppContext>(RouterConfig::new().with_mount_prefix("rpc")).is_err());
}
