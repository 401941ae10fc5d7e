//! Full lifecycle tests against the live todo server.
//!
//! # Design
//! Starts the server with the in-memory backend on a random port, then
//! exercises every client operation over real HTTP using ureq. Validates
//! that request building, response parsing and the store's state machine
//! work end-to-end with the actual server.

use std::cell::RefCell;
use std::net::SocketAddr;

use todo_core::{
    ApiError, CreateTodo, FiltersUpdate, HttpMethod, HttpRequest, HttpResponse, LoadState,
    Notifier, Toast, TodoClient, TodoFilters, TodoStatus, TodoStore, Transport,
};

/// Executes requests with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let body = req.body.unwrap_or_default();
        let result = match req.method {
            HttpMethod::Get => self.agent.get(&req.path).call(),
            HttpMethod::Delete => self.agent.delete(&req.path).call(),
            HttpMethod::Post => self
                .agent
                .post(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
            HttpMethod::Patch => self
                .agent
                .patch(&req.path)
                .content_type("application/json")
                .send(body.as_bytes()),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

#[derive(Default)]
struct Toasts(RefCell<Vec<Toast>>);

impl Notifier for Toasts {
    fn notify(&self, toast: Toast) {
        self.0.borrow_mut().push(toast);
    }
}

impl Toasts {
    fn texts(&self) -> Vec<String> {
        self.0.borrow().iter().map(|t| t.text.clone()).collect()
    }
}

/// Start the server on a random port with a fresh in-memory backend.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener, todo_server::memory_app(), std::future::pending()).await
        })
        .unwrap();
    });

    addr
}

fn new_todo(title: &str, description: Option<&str>) -> CreateTodo {
    CreateTodo {
        title: title.to_string(),
        description: description.map(str::to_string),
    }
}

#[test]
fn client_crud_lifecycle() {
    let addr = start_server();
    let client = TodoClient::new(&format!("http://{addr}"));
    let transport = UreqTransport::new();
    let execute = |req: HttpRequest| transport.execute(req).unwrap();

    // Step 1: list before the index exists.
    let req = client.build_list_todos(&TodoFilters::default());
    let list = client.parse_list_todos(execute(req)).unwrap();
    assert!(list.data.is_empty(), "expected empty list");
    assert_eq!(list.pagination.total, 0);
    assert_eq!(list.stats.total, 0);

    // Step 2: get before the index exists.
    let req = client.build_get_todo("missing");
    let err = client.parse_get_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    // Step 3: create.
    let req = client
        .build_create_todo(&new_todo("Buy milk", Some("Two litres")))
        .unwrap();
    let created = client.parse_create_todo(execute(req)).unwrap();
    assert!(created.success);
    assert_eq!(created.data.title, "Buy milk");
    assert_eq!(created.data.description.as_deref(), Some("Two litres"));
    assert_eq!(created.data.status, TodoStatus::Planned);
    assert_eq!(created.stats.total, 1);
    assert_eq!(created.stats.planned_percentage, 100.0);
    let id = created.data.id.clone();

    // Step 4: get.
    let req = client.build_get_todo(&id);
    let fetched = client.parse_get_todo(execute(req)).unwrap();
    assert_eq!(fetched, created.data);

    // Step 5: update status.
    let req = client
        .build_update_status(&id, TodoStatus::Completed)
        .unwrap();
    let updated = client.parse_update_status(execute(req)).unwrap();
    assert_eq!(updated.data.status, TodoStatus::Completed);
    assert_eq!(updated.data.created_at, created.data.created_at);
    assert_eq!(updated.stats.completed, 1);

    // Step 6: search with a typo and a status filter.
    let filters = TodoFilters {
        status: Some(TodoStatus::Completed),
        search: Some("milx".to_string()),
        ..TodoFilters::default()
    };
    let req = client.build_list_todos(&filters);
    let list = client.parse_list_todos(execute(req)).unwrap();
    assert_eq!(list.data.len(), 1);
    let search = list.search.unwrap();
    assert_eq!(search.query, "milx");
    assert_eq!(search.results, 1);

    // Step 7: delete.
    let req = client.build_delete_todo(&id);
    let deleted = client.parse_delete_todo(execute(req)).unwrap();
    assert_eq!(deleted.deleted_id, id);
    assert_eq!(deleted.message, "TO-DO deleted successfully");
    assert_eq!(deleted.stats.total, 0);

    // Step 8: get and delete after delete.
    let req = client.build_get_todo(&id);
    let err = client.parse_get_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    let req = client.build_delete_todo(&id);
    let err = client.parse_delete_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));

    // Step 9: invalid query is rejected with a message.
    let filters = TodoFilters {
        limit: Some(500),
        ..TodoFilters::default()
    };
    let req = client.build_list_todos(&filters);
    let err = client.parse_list_todos(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, .. }));
    assert!(err.server_message().is_some());
}

#[test]
fn store_lifecycle() {
    let addr = start_server();
    let transport = UreqTransport::new();
    let toasts = Toasts::default();
    let mut store = TodoStore::new(TodoClient::new(&format!("http://{addr}")), &transport, &toasts);

    assert!(store.load_todos());
    assert_eq!(store.state(), &LoadState::Loaded);
    assert!(store.todos().is_empty());

    for title in ["Buy milk", "Walk the dog", "Write report"] {
        assert!(store.create_todo(new_todo(title, None)));
    }
    assert_eq!(store.todos()[0].title, "Write report");
    assert_eq!(store.pagination().total, 3);
    assert_eq!(store.stats().planned, 3);

    let dog = store.todos()[1].id.clone();
    assert!(store.update_status(&dog, TodoStatus::Completed));
    assert_eq!(store.todos()[1].status, TodoStatus::Completed);
    assert_eq!(store.stats().completed, 1);

    assert!(store.update_filters(FiltersUpdate::status(Some(TodoStatus::Completed))));
    assert_eq!(store.todos().len(), 1);
    assert_eq!(store.todos()[0].id, dog);

    assert!(store.update_filters(FiltersUpdate::status(None)));
    assert!(store.update_filters(FiltersUpdate::search("report")));
    assert_eq!(store.todos().len(), 1);
    assert_eq!(store.todos()[0].title, "Write report");

    assert!(store.update_filters(FiltersUpdate::search("")));
    assert!(store.update_filters(FiltersUpdate::limit(2)));
    assert_eq!(store.todos().len(), 2);
    assert_eq!(store.pagination().total_pages, 2);
    assert!(store.update_filters(FiltersUpdate::page(2)));
    assert_eq!(store.todos().len(), 1);
    assert_eq!(store.todos()[0].title, "Buy milk");

    assert!(store.delete_todo(&dog));
    assert!(!store.delete_todo(&dog));
    assert!(store.error().is_none());

    assert_eq!(
        toasts.texts(),
        [
            "TO-DO created successfully",
            "TO-DO created successfully",
            "TO-DO created successfully",
            "TO-DO marked as completed",
            "TO-DO deleted successfully",
            "TO-DO not found",
        ]
    );
}
