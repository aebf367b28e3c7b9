//! Login and menu lifecycle against the live mock server.
//!
//! Starts the mock server on a random port, then drives both clients over
//! real HTTP through the ureq transport.

use std::net::SocketAddr;
use std::time::Duration;

use dashboard_core::{
    config, ApiError, ApiResponse, AuthClient, AuthError, BasicCredentials, Environment, ErrorCategory, Menu,
    Parameters, ResourceClient, Restaurant, ServiceUrls, Settings, Tag, User,
};
use serde_json::json;

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
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn settings_for(addr: SocketAddr) -> Settings {
    let base = format!("http://{addr}");
    Settings::for_environment(Environment::Development)
        .with_urls(ServiceUrls {
            api: base.clone(),
            auth: base,
        })
        .with_timeout(Duration::from_secs(5))
        .unwrap()
}

fn demo_credentials() -> BasicCredentials {
    BasicCredentials {
        username: mock_server::DEMO_USERNAME.to_string(),
        password: mock_server::DEMO_PASSWORD.to_string(),
    }
}

fn params(value: serde_json::Value) -> Parameters {
    value.as_object().cloned().unwrap()
}

#[test]
fn login_and_menu_lifecycle() {
    let settings = settings_for(start_server());

    // Step 1: log in.
    let auth = AuthClient::new(&settings);
    let token = auth.login(&demo_credentials(), "basic").unwrap();
    assert!(!token.is_empty());

    let client = ResourceClient::new(token, &settings);

    // Step 2: read-only collections.
    let menus: Vec<Menu> = client.invoke("get_menus", &Parameters::new()).unwrap().decode().unwrap();
    assert_eq!(menus.len(), 2);
    let restaurants: Vec<Restaurant> = client
        .invoke("get_restaurants", &Parameters::new())
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(restaurants[0].name, "Corner Bistro");
    let tags: Vec<Tag> = client.invoke("get_tags", &Parameters::new()).unwrap().decode().unwrap();
    assert_eq!(tags.len(), 2);
    let user: User = client
        .invoke("get_user", &params(json!({"id": 1})))
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(user.username, mock_server::DEMO_USERNAME);

    // Step 3: get one menu.
    let menu: Menu = client
        .invoke("get_menu", &params(json!({"id": 1})))
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(menu.name, "Breakfast");

    // Step 4: update it. The body carries the remaining parameters.
    let updated: Menu = client
        .invoke("update_menu", &params(json!({"id": 1, "name": "Brunch"})))
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(updated.name, "Brunch");
    assert_eq!(updated.items, menu.items);

    // Step 5: delete it. 204 has an empty body, returned as text.
    let deleted = client
        .invoke("delete_menu", &params(json!({"id": 1})))
        .unwrap();
    assert_eq!(deleted, ApiResponse::Text(String::new()));

    // Step 6: get after delete is a 404.
    let err = client
        .invoke("get_menu", &params(json!({"id": 1})))
        .unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }), "{err}");

    // Step 7: one menu left.
    let menus: Vec<Menu> = client.invoke("get_menus", &Parameters::new()).unwrap().decode().unwrap();
    assert_eq!(menus.len(), 1);
}

#[test]
fn wrong_password_is_unauthorized() {
    let settings = settings_for(start_server());
    let auth = AuthClient::new(&settings);
    let err = auth
        .login_basic(&json!({"username": "demo", "password": "wrong"}))
        .unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailed { status: Some(401), .. }));
    assert_eq!(err.category(), ErrorCategory::Unauthorized);
}

#[test]
fn foreign_token_is_unauthorized() {
    let settings = settings_for(start_server());
    let client = ResourceClient::new("not-issued", &settings);
    let err = client.invoke("get_tags", &Parameters::new()).unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.category(), ErrorCategory::Unauthorized);
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = settings_for(addr);
    let err = ResourceClient::new("t", &settings)
        .invoke("get_menus", &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err}");

    let err = AuthClient::new(&settings).login_basic(&demo_credentials()).unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailed { status: None, .. }));
}

#[test]
fn installed_settings_are_shared_by_auth_clients() {
    let addr = start_server();
    config::install(settings_for(addr)).unwrap();

    let first = AuthClient::from_installed().unwrap();
    let second = AuthClient::from_installed().unwrap();
    assert_eq!(first.base_url(), format!("http://{addr}"));
    assert_eq!(first.base_url(), second.base_url());

    let token = second.login_basic(&demo_credentials()).unwrap();
    let client = ResourceClient::new(token, &config::installed().unwrap());
    assert!(client.invoke("get_menus", &Parameters::new()).is_ok());
}
