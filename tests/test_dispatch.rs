//! Tests for routing requests to their handlers

use sensible_server::config::ServerConfig;
use sensible_server::handler::{ALLOWED_METHODS, DispatchError, Dispatcher, brew};
use sensible_server::http::request::{Method, Request, RequestBuilder};
use sensible_server::http::response::{Response, StatusCode};
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn site(cgi: bool) -> (TempDir, Dispatcher) {
    let root = tempdir().unwrap();
    fs::write(root.path().join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(root.path().join("notes.txt"), "some notes").unwrap();

    let config = Arc::new(ServerConfig::new(root.path(), cgi).unwrap());
    (root, Dispatcher::new(config))
}

fn request(method: Method, path: &str) -> Request {
    RequestBuilder::new().method(method).path(path).build().unwrap()
}

#[tokio::test]
async fn test_get_dispatches_to_static_handler() {
    let (_root, dispatcher) = site(false);

    let response = dispatcher
        .dispatch(&request(Method::GET, "/notes.txt"), peer())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"some notes".to_vec());
}

#[tokio::test]
async fn test_head_dispatches_without_body() {
    let (_root, dispatcher) = site(false);

    let get = dispatcher
        .dispatch(&request(Method::GET, "/notes.txt"), peer())
        .await
        .unwrap();
    let head = dispatcher
        .dispatch(&request(Method::HEAD, "/notes.txt"), peer())
        .await
        .unwrap();

    assert_eq!(head.status, get.status);
    assert_eq!(head.headers, get.headers);
    assert!(head.body.is_empty());
}

#[tokio::test]
async fn test_brew_is_always_a_teapot() {
    let (_root, dispatcher) = site(true);

    for path in ["/", "/notes.txt", "/missing", "/../../etc"] {
        let req = RequestBuilder::new()
            .method(Method::BREW)
            .path(path)
            .header("Accept", "coffee/pot")
            .build()
            .unwrap();

        let response = dispatcher.dispatch(&req, peer()).await.unwrap();

        assert_eq!(response.status, StatusCode::ImATeapot);
        assert!(response.body.is_empty());
    }
}

#[test]
fn test_brew_handler_ignores_input() {
    let response = brew("/anything", &HashMap::new());

    assert_eq!(response.status, StatusCode::ImATeapot);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_unknown_method_is_dispatch_error() {
    let (_root, dispatcher) = site(false);

    for verb in ["POST", "PUT", "DELETE", "get"] {
        let result = dispatcher
            .dispatch(&request(Method::parse(verb), "/notes.txt"), peer())
            .await;

        assert_eq!(
            result.unwrap_err(),
            DispatchError::MethodNotAllowed(verb.to_string())
        );
    }
}

#[test]
fn test_dispatch_error_maps_to_405() {
    let response = Response::from(DispatchError::MethodNotAllowed("POST".to_string()));

    assert_eq!(response.status, StatusCode::MethodNotAllowed);
    assert_eq!(response.header("Allow"), Some(ALLOWED_METHODS));
}

#[tokio::test]
async fn test_directory_request_serves_html_index() {
    let (_root, dispatcher) = site(true);

    let response = dispatcher
        .dispatch(&request(Method::GET, "/"), peer())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cgi_only_runs_when_enabled() {
    use std::os::unix::fs::PermissionsExt;

    for cgi in [true, false] {
        let root = tempdir().unwrap();
        let script = root.path().join("run.py");
        fs::write(&script, "#!/bin/sh\nprintf 'Content-Type: text/plain\\n\\nran'\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let dispatcher = Dispatcher::new(Arc::new(ServerConfig::new(root.path(), cgi).unwrap()));
        let response = dispatcher
            .dispatch(&request(Method::GET, "/run.py"), peer())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::Ok);
        if cgi {
            assert_eq!(response.body, b"ran".to_vec());
        } else {
            // Served as a static file: the script source itself
            assert!(response.body.starts_with(b"#!/bin/sh"));
        }
    }
}
