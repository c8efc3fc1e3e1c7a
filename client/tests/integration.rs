//! Client against a live store over real HTTP.
//!
//! # Design
//! Starts the store on a random port, then drives the request builder and
//! parser through `UreqTransport`, and finally runs a `Session` end to end.
//! This is what catches schema drift between the two crates' DTOs.

use std::time::Duration;

use todo_client::transport::execute_with_timeout;
use todo_client::{
    ApiError, ClientConfig, CreateTodo, Filter, HttpRequest, HttpResponse, MutationKind, Session,
    TodoClient, UpdateTodo, Update, UreqTransport,
};

async fn start_store() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        todo_store::run(listener, todo_store::MemoryStore::new())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

async fn execute(transport: &UreqTransport, req: HttpRequest) -> HttpResponse {
    execute_with_timeout(transport, req)
        .await
        .expect("HTTP transport error")
}

#[tokio::test(flavor = "multi_thread")]
async fn crud_lifecycle() {
    let base = start_store().await;
    let client = TodoClient::new(&base);
    let transport = UreqTransport::new(Duration::from_secs(5));

    // Step 1: health.
    client
        .parse_health(execute(&transport, client.build_health()).await)
        .unwrap();

    // Step 2: list should be empty.
    let todos = client
        .parse_list_todos(execute(&transport, client.build_list_todos()).await)
        .unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Step 3: create a todo.
    let req = client
        .build_create_todo(&CreateTodo {
            title: "Integration test".to_string(),
        })
        .unwrap();
    let created = client.parse_create_todo(execute(&transport, req).await).unwrap();
    assert_eq!(created.title, "Integration test");
    assert!(!created.completed);
    let id = created.id;

    // Step 4: blank title is a validation error.
    let req = client
        .build_create_todo(&CreateTodo {
            title: "  ".to_string(),
        })
        .unwrap();
    let err = client.parse_create_todo(execute(&transport, req).await).unwrap_err();
    assert_eq!(err, ApiError::Validation("title must not be empty".into()));

    // Step 5: get the created todo.
    let fetched = client
        .parse_get_todo(execute(&transport, client.build_get_todo(id)).await)
        .unwrap();
    assert_eq!(fetched, created);

    // Step 6: update completed only.
    let req = client
        .build_update_todo(
            id,
            &UpdateTodo {
                title: None,
                completed: Some(true),
            },
        )
        .unwrap();
    let updated = client.parse_update_todo(execute(&transport, req).await).unwrap();
    assert_eq!(updated.title, "Integration test");
    assert!(updated.completed);

    // Step 7: stats.
    let stats = client
        .parse_stats(execute(&transport, client.build_stats()).await)
        .unwrap();
    assert_eq!((stats.total, stats.completed, stats.active), (1, 1, 0));
    assert_eq!(stats.completion_rate, 100.0);

    // Step 8: delete, then get and delete again, both NotFound.
    client
        .parse_delete_todo(execute(&transport, client.build_delete_todo(id)).await)
        .unwrap();
    let err = client
        .parse_get_todo(execute(&transport, client.build_get_todo(id)).await)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
    let err = client
        .parse_delete_todo(execute(&transport, client.build_delete_todo(id)).await)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

/// Drain updates until `done` matches one, failing after a wall-clock limit.
async fn wait_for(session: &mut Session<UreqTransport>, done: impl Fn(&Update) -> bool) -> Update {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let update = session.next_update().await.expect("session channel open");
            if done(&update) {
                return update;
            }
        }
    })
    .await
    .expect("update did not arrive in time")
}

#[tokio::test(flavor = "multi_thread")]
async fn session_round_trip_over_http() {
    let base = start_store().await;
    let config = ClientConfig::new(&base);
    let transport = UreqTransport::new(config.units(config.request_timeout));
    let mut session = Session::new(config, transport);

    session.start_monitor();
    wait_for(&mut session, |u| matches!(u, Update::Resynced { .. })).await;
    assert_eq!(session.status(), "Connected ✓");

    let key = session.create("Buy milk").unwrap();
    wait_for(&mut session, |u| {
        matches!(u, Update::Committed { kind: MutationKind::Create, .. })
    })
    .await;
    let entry = session.mirror().get(key).unwrap();
    assert_eq!(entry.id, Some(1));
    assert!(!entry.pending());

    session.toggle(key).unwrap();
    wait_for(&mut session, |u| {
        matches!(u, Update::Committed { kind: MutationKind::SetCompleted, .. })
    })
    .await;
    assert!(session.view(Filter::Active).visible.is_empty());
    assert_eq!(session.view(Filter::Completed).visible.len(), 1);

    let stats = session.fetch_stats().await.unwrap();
    assert_eq!(stats.completed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_store_rolls_back_create() {
    // Bind then drop to obtain a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ClientConfig::new(&format!("http://127.0.0.1:{port}"))
        .with_time_unit(Duration::from_millis(100));
    let transport = UreqTransport::new(config.units(config.request_timeout));
    let mut session = Session::new(config, transport);

    session.create("never stored").unwrap();
    let update = wait_for(&mut session, |u| matches!(u, Update::RolledBack { .. })).await;
    match update {
        Update::RolledBack { error, .. } => assert!(error.is_transport()),
        _ => unreachable!(),
    }
    assert!(session.mirror().is_empty());
    assert_eq!(session.status(), "Backend offline");
}
