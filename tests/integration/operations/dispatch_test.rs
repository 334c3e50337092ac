//! Integration tests for operation dispatch
//!
//! These use a scripted adapter so every exit path can be reached without a
//! server.

use crate::integration::{missing_config, ScriptedAdapter};
use certmonger_certsrv::operations::{self, Context};
use certmonger_certsrv::{
    CaReply, CertsrvError, Credentials, Environment, ExitStatus, Operation, Response,
};
use url::Url;

const ALL_OPERATIONS: [&str; 8] = [
    "SUBMIT",
    "POLL",
    "IDENTIFY",
    "GET-NEW-REQUEST-REQUIREMENTS",
    "GET-RENEW-REQUEST-REQUIREMENTS",
    "GET-DEFAULT-TEMPLATE",
    "GET-SUPPORTED-TEMPLATES",
    "FETCH-ROOTS",
];

fn credentials(default_template: &str) -> Credentials {
    let endpoint = Url::parse("https://ca.example.com").unwrap();
    Credentials::new("svc", "secret", endpoint).with_default_template(default_template)
}

fn env_for(operation: &str) -> Environment {
    Environment::from_pairs([
        ("CERTMONGER_OPERATION", operation),
        ("CERTMONGER_CSR", "-----BEGIN CERTIFICATE REQUEST-----\n"),
        ("CERTMONGER_CA_PROFILE", "WebServer"),
        ("CERTMONGER_CA_COOKIE", "1188"),
    ])
}

async fn dispatch(operation: &str, ctx: &Context<ScriptedAdapter>) -> Response {
    let env = env_for(operation);
    operations::dispatch(env.operation(), &env, ctx).await
}

#[tokio::test]
async fn test_unknown_operations_exit_6_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let loader = missing_config(dir.path());

    for name in ["", "RENEW", "submit", "GET-TEMPLATES", "IDENTIFY "] {
        let env = Environment::from_pairs([("CERTMONGER_OPERATION", name)]);
        if env.operation() == Operation::Submit {
            continue;
        }

        let mut connected = false;
        let response = operations::run(&env, &loader, |_: &Credentials| {
            connected = true;
            Ok(ScriptedAdapter::new())
        })
        .await;

        assert_eq!(response.status, ExitStatus::NotImplemented, "{:?}", name);
        assert!(response.stdout.is_empty());
        assert!(!connected);
    }
}

#[tokio::test]
async fn test_each_ca_operation_calls_adapter_once() {
    for name in ["SUBMIT", "POLL", "GET-SUPPORTED-TEMPLATES", "FETCH-ROOTS"] {
        let ctx = Context::new(credentials("WebServer"), ScriptedAdapter::new());
        dispatch(name, &ctx).await;
        assert_eq!(ctx.adapter.calls(), 1, "{}", name);
    }

    let ctx = Context::new(credentials("WebServer"), ScriptedAdapter::new());
    dispatch("GET-DEFAULT-TEMPLATE", &ctx).await;
    assert_eq!(ctx.adapter.calls(), 0);
}

#[tokio::test]
async fn test_missing_configuration_exits_3_without_ca_call() {
    let dir = tempfile::tempdir().unwrap();
    let loader = missing_config(dir.path());

    for name in [
        "SUBMIT",
        "POLL",
        "GET-DEFAULT-TEMPLATE",
        "GET-SUPPORTED-TEMPLATES",
        "FETCH-ROOTS",
    ] {
        let mut connected = false;
        let response = operations::run(&env_for(name), &loader, |_: &Credentials| {
            connected = true;
            Ok(ScriptedAdapter::new())
        })
        .await;

        assert_eq!(response.status, ExitStatus::ConfigError, "{}", name);
        assert!(response.stdout.contains("--config"));
        assert!(!connected, "{} built an adapter", name);
    }
}

#[tokio::test]
async fn test_local_operations_need_no_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let loader = missing_config(dir.path());

    for name in [
        "IDENTIFY",
        "GET-NEW-REQUEST-REQUIREMENTS",
        "GET-RENEW-REQUEST-REQUIREMENTS",
    ] {
        let response = operations::run(&env_for(name), &loader, |_: &Credentials| {
            Ok(ScriptedAdapter::new())
        })
        .await;
        assert_eq!(response.status, ExitStatus::Success, "{}", name);
    }
}

#[tokio::test]
async fn test_local_answers_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let loader = missing_config(dir.path());

    for name in ["IDENTIFY", "GET-NEW-REQUEST-REQUIREMENTS"] {
        let mut outputs = Vec::new();
        for _ in 0..3 {
            let response = operations::run(&env_for(name), &loader, |_: &Credentials| {
                Ok(ScriptedAdapter::new())
            })
            .await;
            outputs.push(response.stdout);
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]), "{}", name);
    }
}

#[tokio::test]
async fn test_requirements() {
    let ctx = Context::new(credentials("WebServer"), ScriptedAdapter::new());
    let new = dispatch("GET-NEW-REQUEST-REQUIREMENTS", &ctx).await;
    let renew = dispatch("GET-RENEW-REQUEST-REQUIREMENTS", &ctx).await;

    assert_eq!(
        new.stdout,
        "CERTMONGER_CA_PROFILE\nCERTMONGER_CSR\nCERTMONGER_OPERATION\n"
    );
    assert_eq!(new, renew);
}

#[tokio::test]
async fn test_default_template() {
    let ctx = Context::new(credentials("WebServer"), ScriptedAdapter::new());
    let response = dispatch("GET-DEFAULT-TEMPLATE", &ctx).await;
    assert_eq!(response.status, ExitStatus::Success);
    assert_eq!(response.stdout, "WebServer\n");
}

#[tokio::test]
async fn test_empty_default_template_is_not_implemented() {
    let ctx = Context::new(credentials(""), ScriptedAdapter::new());
    let response = dispatch("GET-DEFAULT-TEMPLATE", &ctx).await;
    assert_eq!(response.status, ExitStatus::NotImplemented);
    assert!(response.stdout.is_empty());
}

#[tokio::test]
async fn test_supported_templates() {
    let adapter = ScriptedAdapter::new()
        .on_templates(Ok(vec!["User".to_string(), "WebServer".to_string()]));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("GET-SUPPORTED-TEMPLATES", &ctx).await;
    assert_eq!(response.status, ExitStatus::Success);
    assert_eq!(response.stdout, "User\nWebServer\n");
}

#[tokio::test]
async fn test_supported_templates_not_supported() {
    let adapter =
        ScriptedAdapter::new().on_templates(Err(CertsrvError::not_supported("template listing")));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("GET-SUPPORTED-TEMPLATES", &ctx).await;
    assert_eq!(response.status, ExitStatus::NotImplemented);
    assert!(response.stdout.is_empty());
}

#[tokio::test]
async fn test_submit_uses_profile_template() {
    let adapter = ScriptedAdapter::new().on_submit(Ok(CaReply::Pending {
        request_id: "1188".to_string(),
    }));
    let ctx = Context::new(credentials("Default"), adapter);
    let response = dispatch("SUBMIT", &ctx).await;

    assert_eq!(response.status, ExitStatus::Pending);
    assert_eq!(ctx.adapter.last_template().as_deref(), Some("WebServer"));
}

#[tokio::test]
async fn test_submit_transport_fault_exits_4() {
    let adapter = ScriptedAdapter::new().on_submit(Err(CertsrvError::server_error(503, "busy")));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("SUBMIT", &ctx).await;

    assert_eq!(response.status, ExitStatus::Failure);
    assert_eq!(response.stdout, "Server error 503: busy\n");
}

#[tokio::test]
async fn test_submit_not_retrieved_is_rejected_not_pending() {
    let adapter = ScriptedAdapter::new().on_submit(Ok(CaReply::NotRetrieved {
        message: "Taken Under Submission".to_string(),
    }));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("SUBMIT", &ctx).await;

    assert_eq!(response.status, ExitStatus::Rejected);
}

#[tokio::test]
async fn test_poll_uses_cookie() {
    let adapter = ScriptedAdapter::new().on_poll(Ok(CaReply::NotRetrieved {
        message: "Taken Under Submission".to_string(),
    }));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("POLL", &ctx).await;

    assert_eq!(ctx.adapter.last_request_id().as_deref(), Some("1188"));
    assert_eq!(response.status, ExitStatus::Pending);
    assert_eq!(response.stdout, "1188\n");
}

#[tokio::test]
async fn test_poll_denied() {
    let adapter = ScriptedAdapter::new().on_poll(Ok(CaReply::Denied {
        message: "Denied by Policy Module".to_string(),
    }));
    let ctx = Context::new(credentials("WebServer"), adapter);
    let response = dispatch("POLL", &ctx).await;

    assert_eq!(response.status, ExitStatus::Rejected);
    assert_eq!(response.stdout, "Denied by Policy Module\n");
}

#[tokio::test]
async fn test_every_recognized_name_parses() {
    for name in ALL_OPERATIONS {
        let operation = env_for(name).operation();
        assert_ne!(operation, Operation::Unknown, "{}", name);
        assert_eq!(operation.as_str(), name);
    }
}
