//! End-to-end: client -> local transport -> router -> procedure and back.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use typed_rpc::prelude::*;
use typed_rpc::{ClientErrorKind, ValidationResult};

#[derive(Clone, Debug, Default)]
struct AppContext {
    request_count: Arc<std::sync::atomic::AtomicUsize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    title: String,
    starts_at: DateTime<Utc>,
    attendees: BTreeMap<String, Vec<u32>>,
    budget: Option<f64>,
}

impl Validate for Event {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new()
            .required("title", &self.title)
            .max_length("title", &self.title, 64)
            .build()
    }
}

struct Api {
    echo_event: Procedure<AppContext, Event, Event>,
    reschedule: Procedure<AppContext, Event, Event>,
    echo_text: Procedure<AppContext, String, String>,
    echo_number: Procedure<AppContext, f64, f64>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn serve() -> (RpcClient, Api, AppContext) {
    init_tracing();
    let config = RouterConfig::new().with_mount_prefix("/rpc");
    let (mut router, procedure) = typed_rpc::init_with_config::<AppContext>(config).unwrap();
    let counted = procedure.use_middleware(|ctx: Context<AppContext>| {
        let ctx = ctx.inner().clone();
        async move {
            ctx.request_count
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok::<_, BoxError>(ctx)
        }
    });

    let api = Api {
        echo_event: counted
            .name("events.echo")
            .input(s::typed::<Event>())
            .output(s::typed::<Event>())
            .query(|_ctx, event: Event| async move { Ok(event) }),
        reschedule: counted
            .name("events.reschedule")
            .input(s::typed::<Event>())
            .output(s::typed::<Event>())
            .mutation(|_ctx, mut event: Event| async move {
                event.starts_at += chrono::Duration::days(7);
                Ok(event)
            }),
        echo_text: procedure
            .name("text.echo")
            .input(s::string())
            .output(s::string())
            .query(|_ctx, text: String| async move { Ok(text) }),
        echo_number: procedure
            .name("number.echo")
            .input(s::number())
            .output(s::number())
            .query(|_ctx, n: f64| async move { Ok(n) }),
    };
    router
        .register(api.echo_event.clone())
        .register(api.reschedule.clone())
        .register(api.echo_text.clone())
        .register(api.echo_number.clone());

    let ctx = AppContext::default();
    let shared = ctx.clone();
    let transport = LocalTransport::new(Arc::new(router), move |_req| shared.clone());
    (RpcClient::new("http://localhost/rpc/", transport), api, ctx)
}

fn sample_event() -> Event {
    let mut attendees = BTreeMap::new();
    attendees.insert("ada".to_string(), vec![1, 2, 3]);
    attendees.insert("grace".to_string(), vec![]);
    Event {
        title: "Compiler night".to_string(),
        starts_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap(),
        attendees,
        budget: Some(125.5),
    }
}

#[tokio::test]
async fn query_round_trips_rich_values() {
    let (client, api, ctx) = serve();
    let event = sample_event();

    let echoed = client
        .procedure(api.echo_event.contract())
        .try_call(&event)
        .await
        .unwrap();
    assert_eq!(echoed, event);
    assert_eq!(
        ctx.request_count.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn mutation_round_trips_rich_values() {
    let (client, api, _ctx) = serve();
    let event = sample_event();

    let moved = client
        .procedure(api.reschedule.contract())
        .call::<BoxError>(&event)
        .await
        .unwrap();
    assert_eq!(moved.starts_at, event.starts_at + chrono::Duration::days(7));
    assert_eq!(moved.attendees, event.attendees);
}

#[tokio::test]
async fn struct_validation_runs_on_both_sides() {
    let (client, api, ctx) = serve();
    let mut event = sample_event();
    event.title = String::new();

    let err = client
        .procedure(api.echo_event.contract())
        .try_call(&event)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ClientErrorKind::Validation);
    assert_eq!(err.issues().unwrap()[0].path_string(), "title");
    assert_eq!(
        ctx.request_count.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn direct_caller_runs_without_transport() {
    let (_client, api, _ctx) = serve();
    let caller = DirectCaller::with_context(AppContext::default());

    let event = sample_event();
    let echoed = caller.try_call(&api.echo_event, event.clone()).await.unwrap();
    assert_eq!(echoed, event);

    let failing = DirectCaller::<AppContext>::new(|| async {
        Err::<AppContext, BoxError>(std::io::Error::other("no database").into())
    });
    let err = failing
        .try_call(&api.echo_text, "hi".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.code, RpcErrorCode::InternalServerError);
    assert_eq!(err.message, "no database");
    assert_eq!(err.procedure.as_deref(), Some("text.echo"));
}

fn finite_f64() -> impl Strategy<Value = f64> {
    use proptest::num::f64::{NEGATIVE, NORMAL, POSITIVE, SUBNORMAL, ZERO};
    POSITIVE | NEGATIVE | NORMAL | SUBNORMAL | ZERO
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_finite_number_survives_bit_for_bit(n in finite_f64()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (client, api, _ctx) = serve();

        let echoed = runtime.block_on(async {
            client.procedure(api.echo_number.contract()).try_call(&n).await
        });
        prop_assert_eq!(echoed.unwrap().to_bits(), n.to_bits());
    }

    #[test]
    fn any_text_survives_query_encoding(text in any::<String>()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (client, api, _ctx) = serve();

        let echoed = runtime.block_on(async {
            client.procedure(api.echo_text.contract()).try_call(&text).await
        });
        prop_assert_eq!(echoed.unwrap(), text);
    }

    #[test]
    fn any_keyed_collection_survives_a_mutation(
        attendees in proptest::collection::btree_map("[a-z]{1,8}", proptest::collection::vec(any::<u32>(), 0..4), 0..6),
        seconds in 0i64..4_000_000_000,
        budget in proptest::option::of(finite_f64()),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (client, api, _ctx) = serve();
        let event = Event {
            title: "generated".to_string(),
            starts_at: Utc.timestamp_opt(seconds, 0).unwrap(),
            attendees,
            budget,
        };

        let moved = runtime.block_on(async {
            client.procedure(api.reschedule.contract()).try_call(&event).await
        });
        let moved = moved.unwrap();
        prop_assert_eq!(moved.budget.map(f64::to_bits), event.budget.map(f64::to_bits));
        prop_assert_eq!(moved.attendees, event.attendees);
        prop_assert_eq!(moved.starts_at - event.starts_at, chrono::Duration::days(7));
    }
}
