use axum::http::StatusCode;

use crate::setup_environment;

#[tokio::test]
async fn test_lookup_open_access() {
    let env = setup_environment(StatusCode::CREATED);

    let info = env.services.lookup.lookup("10.1000/oa").await.unwrap();

    assert_eq!(info.manuscripts.len(), 1);
    let manuscript = &info.manuscripts[0];
    assert_eq!(manuscript.location, env.open_access_url());
    assert_eq!(manuscript.name, "Open Access.pdf");
    assert_eq!(manuscript.mime_type, "application/pdf");
    assert_eq!(manuscript.source, "Unpaywall");
    assert_eq!(manuscript.repository_institution, "Example University");
}

#[tokio::test]
async fn test_lookup_is_cached() {
    let env = setup_environment(StatusCode::CREATED);

    let first = env.services.lookup.lookup("10.1000/oa").await.unwrap();
    let second = env.services.lookup.lookup("10.1000/oa").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(env.unpaywall_hits(), 1);
}

#[tokio::test]
async fn test_lookup_closed_access() {
    let env = setup_environment(StatusCode::CREATED);

    let info = env.services.lookup.lookup("10.1000/closed").await.unwrap();

    assert!(info.manuscripts.is_empty());
}

#[tokio::test]
async fn test_lookup_unknown_doi() {
    let env = setup_environment(StatusCode::CREATED);

    let error = env.services.lookup.lookup("10.1000/unknown").await.unwrap_err();
    assert!(error.is_bad_input());

    // failures are not cached
    env.services.lookup.lookup("10.1000/unknown").await.unwrap_err();
    assert_eq!(env.unpaywall_hits(), 2);
}
