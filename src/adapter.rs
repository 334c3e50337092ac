//! CA capability seam.
//!
//! The operation handlers only ever talk to the CA through [`CaAdapter`].
//! [`crate::client::CertsrvClient`] is the HTTP implementation; tests plug in
//! scripted adapters.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CaReply, ChainEncoding};

/// Capabilities a web-enrollment CA offers the helper.
///
/// Every method answers either with what the CA said or, on the `Err` side,
/// with a transport fault (network, HTTP, malformed page). Nothing is
/// retried.
#[async_trait]
pub trait CaAdapter: Send + Sync {
    /// Submit a PEM-encoded CSR for the given template.
    async fn submit(&self, csr: &str, template: &str) -> Result<CaReply>;

    /// Ask for the certificate of an earlier request.
    async fn poll(&self, request_id: &str) -> Result<CaReply>;

    /// Fetch the CA's PKCS#7 chain bundle.
    async fn chain(&self, encoding: ChainEncoding) -> Result<Vec<u8>>;

    /// List the templates the CA offers.
    ///
    /// Adapters without a listing answer [`crate::CertsrvError::NotSupported`].
    async fn templates(&self) -> Result<Vec<String>>;
}
