//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use roster_core::usecase::{prepare_create_class, prepare_create_school};
use roster_core::{
    ApiClient, ClassEntity, CreateClass, CreateSchool, HttpMethod, HttpRequest, HttpResponse,
    RosterApi, RosterError, School,
};

const BASE_URL: &str = "http://localhost:3000";

fn api() -> RosterApi {
    RosterApi::new(ApiClient::new(BASE_URL))
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Vec<serde_json::Value> {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn simulated(case: &serde_json::Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn check_request(name: &str, req: &HttpRequest, expected: &serde_json::Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => {
            let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn check_error(name: &str, err: RosterError, expected: &str) {
    match expected {
        "Validation" => assert!(matches!(err, RosterError::Validation { .. }), "{name}: expected Validation, got {err}"),
        "Http" => assert!(matches!(err, RosterError::Http { .. }), "{name}: expected Http, got {err}"),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_schools_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/list_schools.json")) {
        let name = case["name"].as_str().unwrap();
        let req = api.schools.build_list(case["search"].as_str().unwrap()).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = api.schools.parse_list(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => check_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<School> = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn list_classes_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/list_classes.json")) {
        let name = case["name"].as_str().unwrap();
        let req = api.classes.build_list(case["search"].as_str().unwrap()).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = api.classes.parse_list(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => check_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: Vec<ClassEntity> =
                    serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_school_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/create_school.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CreateSchool = serde_json::from_value(case["input"].clone()).unwrap();

        let built = prepare_create_school(&api.schools, &input);
        if case.get("expected_request").is_none() {
            check_error(name, built.unwrap_err(), case["expected_error"].as_str().unwrap());
            continue;
        }
        check_request(name, &built.unwrap(), &case["expected_request"]);

        let result = api.schools.parse_create(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => check_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: School = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}

#[test]
fn create_class_vectors() {
    let api = api();
    for case in load(include_str!("../../test-vectors/create_class.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CreateClass = serde_json::from_value(case["input"].clone()).unwrap();

        let built = prepare_create_class(&api.classes, &input);
        if case.get("expected_request").is_none() {
            check_error(name, built.unwrap_err(), case["expected_error"].as_str().unwrap());
            continue;
        }
        check_request(name, &built.unwrap(), &case["expected_request"]);

        let result = api.classes.parse_create(simulated(&case));
        match case.get("expected_error") {
            Some(expected) => check_error(name, result.unwrap_err(), expected.as_str().unwrap()),
            None => {
                let expected: ClassEntity = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }
    }
}
