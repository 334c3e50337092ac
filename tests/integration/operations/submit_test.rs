// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for SUBMIT

use crate::integration::{fixtures, write_config, MockCertsrvServer, PATH_SUBMIT};
use certmonger_certsrv::{operations, CertsrvClient, Environment, ExitStatus};
use wiremock::matchers::{any, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

fn submit_env(csr: &str, profile: Option<&str>) -> Environment {
    let mut pairs = vec![
        ("CERTMONGER_OPERATION", "SUBMIT".to_string()),
        ("CERTMONGER_CSR", csr.to_string()),
    ];
    if let Some(profile) = profile {
        pairs.push(("CERTMONGER_CA_PROFILE", profile.to_string()));
    }
    Environment::from_pairs(pairs)
}

#[tokio::test]
async fn test_submit_issued_returns_certificate() {
    let mock = MockCertsrvServer::start().await;
    let (_, pem) = fixtures::self_signed("host.example.com");
    mock.mock_submit_issued("1187").await;
    mock.mock_certificate("1187", &pem).await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = submit_env(&fixtures::csr_pem("host.example.com"), Some("WebServer"));

    let response = operations::run(&env, &loader, CertsrvClient::new).await;

    assert_eq!(response.status, ExitStatus::Success);
    assert_eq!(
        response.stdout,
        format!("{}\n", pem.replace("\r\n", "\n").trim_end())
    );
}

#[tokio::test]
async fn test_submit_pending_returns_request_id() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_submit_pending("1188").await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = submit_env(&fixtures::csr_pem("host.example.com"), Some("WebServer"));

    let response = operations::run(&env, &loader, CertsrvClient::new).await;

    assert_eq!(response.status, ExitStatus::Pending);
    assert_eq!(response.stdout, "1188\n");
}

#[tokio::test]
async fn test_submit_denied_returns_message() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_submit_denied("Denied by Policy Module  0x80094012").await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = submit_env(&fixtures::csr_pem("host.example.com"), Some("User"));

    let response = operations::run(&env, &loader, CertsrvClient::new).await;

    assert_eq!(response.status, ExitStatus::Rejected);
    assert_eq!(response.stdout, "Denied by Policy Module  0x80094012\n");
}

#[tokio::test]
async fn test_submit_posts_enrollment_form() {
    let mock = MockCertsrvServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(body_string_contains("Mode=newreq"))
        .and(body_string_contains("CertAttrib=CertificateTemplate%3AMachine"))
        .and(body_string_contains("TargetStoreFlags=0"))
        .and(body_string_contains("SaveCert=yes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                crate::integration::pages::pending("42"),
                "text/html",
            ),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = submit_env(&fixtures::csr_pem("host.example.com"), Some("Machine"));

    let response = operations::run(&env, &loader, CertsrvClient::new).await;
    assert_eq!(response.status, ExitStatus::Pending);
}

#[tokio::test]
async fn test_submit_without_profile_uses_default_template() {
    let mock = MockCertsrvServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SUBMIT))
        .and(body_string_contains("CertAttrib=CertificateTemplate%3AWebServer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                crate::integration::pages::pending("43"),
                "text/html",
            ),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = submit_env(&fixtures::csr_pem("host.example.com"), None);

    let response = operations::run(&env, &loader, CertsrvClient::new).await;
    assert_eq!(response.status, ExitStatus::Pending);
    assert_eq!(response.stdout, "43\n");
}

#[tokio::test]
async fn test_submit_without_csr_never_contacts_ca() {
    let mock = MockCertsrvServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(mock.inner())
        .await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = Environment::from_pairs([
        ("CERTMONGER_OPERATION", "SUBMIT"),
        ("CERTMONGER_CA_PROFILE", "WebServer"),
    ]);

    let response = operations::run(&env, &loader, CertsrvClient::new).await;
    assert_eq!(response.status, ExitStatus::Failure);
    assert!(response.stdout.contains("CERTMONGER_CSR"));
}

#[tokio::test]
async fn test_unset_operation_means_submit() {
    let mock = MockCertsrvServer::start().await;
    mock.mock_submit_pending("44").await;

    let dir = tempfile::tempdir().unwrap();
    let loader = write_config(dir.path(), &mock.url(), "WebServer");
    let env = Environment::from_pairs([
        ("CERTMONGER_CSR", fixtures::csr_pem("host.example.com")),
        ("CERTMONGER_CA_PROFILE", "WebServer".to_string()),
    ]);

    let response = operations::run(&env, &loader, CertsrvClient::new).await;
    assert_eq!(response.status, ExitStatus::Pending);
    assert_eq!(response.stdout, "44\n");
}
