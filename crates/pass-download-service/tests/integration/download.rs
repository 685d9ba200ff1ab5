use axum::http::StatusCode;
use pass_download_service::download::DownloadFailure;
use pass_download_test::read_fixture;

use crate::{PUBLIC_BASE_URL, setup_environment};

#[tokio::test]
async fn test_download() {
    let env = setup_environment(StatusCode::CREATED);

    let location = env
        .services
        .download
        .download("10.1000/oa", &env.open_access_url())
        .await
        .unwrap();

    assert_eq!(location, format!("{PUBLIC_BASE_URL}/bin/ab/cd"));

    let deposits = env.deposits();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].content_type, "application/pdf");
    assert_eq!(deposits[0].user_agent, "pass-download-service");
    assert_eq!(deposits[0].body, read_fixture("manuscripts/sample.pdf"));
    assert_eq!(env.content.accesses(), 1);
}

#[tokio::test]
async fn test_download_mismatched_url() {
    let env = setup_environment(StatusCode::CREATED);
    let url = env.content.url("pdf/Somewhere%20Else.pdf").to_string();

    let error = env
        .services
        .download
        .download("10.1000/oa", &url)
        .await
        .unwrap_err();

    assert!(error.is_bad_input());
    assert_eq!(env.content.accesses(), 0);
    assert!(env.deposits().is_empty());
}

#[tokio::test]
async fn test_download_unknown_doi() {
    let env = setup_environment(StatusCode::CREATED);

    let error = env
        .services
        .download
        .download("10.1000/unknown", &env.open_access_url())
        .await
        .unwrap_err();

    assert!(error.is_bad_input());
    assert_eq!(env.content.accesses(), 0);
}

#[tokio::test]
async fn test_download_missing_content() {
    let env = setup_environment(StatusCode::CREATED);
    let url = env.content.url("respond_statuscode/404/gone.pdf").to_string();

    let error = env
        .services
        .download
        .download("10.1000/gone", &url)
        .await
        .unwrap_err();

    assert!(!error.is_bad_input());
    assert!(matches!(error.failure(), DownloadFailure::Fetch(_)));
    assert!(env.deposits().is_empty());
}

#[tokio::test]
async fn test_download_rejected_by_fedora() {
    let env = setup_environment(StatusCode::FORBIDDEN);

    let error = env
        .services
        .download
        .download("10.1000/oa", &env.open_access_url())
        .await
        .unwrap_err();

    assert!(!error.is_bad_input());
    assert!(matches!(error.failure(), DownloadFailure::Store(_)));
    assert_eq!(env.deposits().len(), 1);
}
