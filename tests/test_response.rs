use sensible_server::http::response::{Response, ResponseBuilder, StatusCode};
use sensible_server::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::NotAcceptable.as_u16(), 406);
    assert_eq!(StatusCode::ImATeapot.as_u16(), 418);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(StatusCode::NotAcceptable.reason_phrase(), "Not Acceptable");
    assert_eq!(StatusCode::ImATeapot.reason_phrase(), "I'm a teapot");
}

#[test]
fn test_status_code_from_u16() {
    assert_eq!(StatusCode::from_u16(404), Some(StatusCode::NotFound));
    assert_eq!(StatusCode::from_u16(418), Some(StatusCode::ImATeapot));
    assert_eq!(StatusCode::from_u16(299), None);
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Custom", "value")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.header("x-custom"), Some("value"));
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    assert_eq!(
        response.header("Content-Length"),
        Some(body.len().to_string().as_str())
    );
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .build();

    // HEAD responses advertise the length of the omitted body
    assert_eq!(response.header("Content-Length"), Some("999"));
    assert!(response.body.is_empty());
}

#[test]
fn test_response_builder_keeps_header_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .header("X-Frame-Options", "DENY")
        .body(b"{}".to_vec())
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        names,
        vec!["Content-Type", "Cache-Control", "X-Frame-Options", "Content-Length"]
    );
}

#[test]
fn test_response_builder_replaces_duplicate_header_in_place() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("X-Other", "1")
        .header("content-type", "text/html")
        .build();

    assert_eq!(response.headers[0], ("Content-Type".to_string(), "text/html".to_string()));
    assert_eq!(response.headers.len(), 3);
}

#[test]
fn test_error_helpers_have_empty_bodies() {
    for (response, status) in [
        (Response::bad_request(), StatusCode::BadRequest),
        (Response::not_found(), StatusCode::NotFound),
        (Response::not_acceptable(), StatusCode::NotAcceptable),
        (Response::internal_error(), StatusCode::InternalServerError),
    ] {
        assert_eq!(response.status, status);
        assert!(response.body.is_empty());
        assert_eq!(response.header("Content-Length"), Some("0"));
    }
}

#[test]
fn test_method_not_allowed_lists_allowed_methods() {
    let response = Response::method_not_allowed("GET, HEAD, BREW");

    assert_eq!(response.status, StatusCode::MethodNotAllowed);
    assert_eq!(response.header("Allow"), Some("GET, HEAD, BREW"));
}

#[test]
fn test_without_body_keeps_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"hello".to_vec())
        .build()
        .without_body();

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("5"));
}

#[test]
fn test_serialize_error_response() {
    let wire = serialize_response(&Response::not_found());

    assert_eq!(wire, b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_vec());
}
