//! Operation dispatch.
//!
//! Exactly one handler runs per invocation. Handlers that talk to the CA go
//! through the [`CaAdapter`] in the [`Context`], classify what came back and
//! render it through the exit contract.

pub mod classify;
pub mod roots;

pub use classify::{classify_poll, classify_submission, is_taken_under_submission};
pub use roots::assemble_roots;

use crate::adapter::CaAdapter;
use crate::config::{ConfigLoader, Credentials};
use crate::env::{self, Environment};
use crate::error::Result;
use crate::exit::Response;
use crate::types::{CaOutcome, ChainEncoding, Operation};

/// Variables a new or renewal request needs, as listed to certmonger.
pub const REQUEST_REQUIREMENTS: [&str; 3] = [env::CA_PROFILE, env::CSR, env::OPERATION];

/// Everything a handler may use, built once per invocation.
#[derive(Debug)]
pub struct Context<A> {
    /// Loaded connection settings.
    pub credentials: Credentials,
    /// CA capability.
    pub adapter: A,
}

impl<A> Context<A> {
    /// Create a new context.
    pub fn new(credentials: Credentials, adapter: A) -> Self {
        Self {
            credentials,
            adapter,
        }
    }
}

/// Answer operations that need neither configuration nor CA.
///
/// Returns `None` for operations that do.
pub fn answer_locally(operation: Operation) -> Option<Response> {
    match operation {
        Operation::Identify => Some(Response::success(crate::PRODUCT)),
        Operation::GetNewRequestRequirements | Operation::GetRenewRequestRequirements => {
            Some(Response::lines(REQUEST_REQUIREMENTS))
        }
        Operation::Unknown => Some(Response::not_implemented()),
        Operation::Submit
        | Operation::Poll
        | Operation::GetDefaultTemplate
        | Operation::GetSupportedTemplates
        | Operation::FetchRoots => None,
    }
}

/// Run the handler for `operation`.
pub async fn dispatch<A: CaAdapter>(
    operation: Operation,
    env: &Environment,
    ctx: &Context<A>,
) -> Response {
    match operation {
        Operation::Submit => submit(env, ctx).await,
        Operation::Poll => poll(env, ctx).await,
        Operation::GetDefaultTemplate => default_template(&ctx.credentials),
        Operation::GetSupportedTemplates => supported_templates(&ctx.adapter).await,
        Operation::FetchRoots => fetch_roots(&ctx.adapter).await,
        Operation::Identify
        | Operation::GetNewRequestRequirements
        | Operation::GetRenewRequestRequirements
        | Operation::Unknown => answer_locally(operation).unwrap_or_else(Response::not_implemented),
    }
}

/// Handle one helper invocation end to end.
///
/// Local operations are answered straight away. Everything else loads the
/// configuration first; if that fails the adapter is never built and the
/// result is exit 3.
pub async fn run<A, F>(env: &Environment, loader: &ConfigLoader, connect: F) -> Response
where
    A: CaAdapter,
    F: FnOnce(&Credentials) -> Result<A>,
{
    let operation = env.operation();
    tracing::info!("Operation {}", operation);

    if let Some(response) = answer_locally(operation) {
        return response;
    }

    let credentials = match loader.load() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Response::config_error(&e);
        }
    };

    let adapter = match connect(&credentials) {
        Ok(adapter) => adapter,
        Err(e) => {
            tracing::error!("Failed to set up CA client: {}", e);
            return if e.is_config() {
                Response::config_error(&e)
            } else {
                Response::failure(&e)
            };
        }
    };

    let ctx = Context::new(credentials, adapter);
    dispatch(operation, env, &ctx).await
}

async fn submit<A: CaAdapter>(env: &Environment, ctx: &Context<A>) -> Response {
    let request = match env.submission(&ctx.credentials.default_template) {
        Ok(request) => request,
        Err(e) => return Response::failure(&e),
    };

    tracing::info!("Submitting request for template {}", request.template);
    let result = ctx.adapter.submit(&request.csr, &request.template).await;
    Response::from_outcome(classify_submission(result))
}

async fn poll<A: CaAdapter>(env: &Environment, ctx: &Context<A>) -> Response {
    let request = match env.poll() {
        Ok(request) => request,
        Err(e) => return Response::failure(&e),
    };
    let request_id = request.request_id.as_deref().unwrap_or_default();

    tracing::info!("Polling request {}", request_id);
    let result = ctx.adapter.poll(request_id).await;
    Response::from_outcome(classify_poll(result, request_id))
}

fn default_template(credentials: &Credentials) -> Response {
    let template = credentials.default_template.trim();
    if template.is_empty() {
        return Response::not_implemented();
    }

    Response::success(template)
}

async fn supported_templates<A: CaAdapter>(adapter: &A) -> Response {
    match adapter.templates().await {
        Ok(templates) => Response::lines(templates),
        Err(e) if e.is_not_supported() => {
            tracing::info!("{}", e);
            Response::not_implemented()
        }
        Err(e) => Response::from_outcome(CaOutcome::unexpected(e.to_string())),
    }
}

async fn fetch_roots<A: CaAdapter>(adapter: &A) -> Response {
    let assembled = match adapter.chain(ChainEncoding::Base64).await {
        Ok(bundle) => assemble_roots(&bundle),
        Err(e) => Err(e),
    };

    match assembled {
        Ok(text) => Response::verbatim(text),
        Err(e) => Response::from_outcome(CaOutcome::unexpected(e.to_string())),
    }
}
