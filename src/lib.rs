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

//! # certmonger-certsrv
//!
//! A certmonger CA helper for Microsoft Active Directory Certificate Services
//! web enrollment (`/certsrv`).
//!
//! certmonger starts the helper once per operation, passes the request in
//! `CERTMONGER_*` environment variables and reads the answer from stdout and
//! the exit status. The helper submits CSRs, polls pending requests and
//! fetches the CA chain by driving the same pages a browser would.
//!
//! ## Operations
//!
//! | `CERTMONGER_OPERATION`             | Needs CA |
//! |------------------------------------|----------|
//! | `SUBMIT` (also when unset)         | yes      |
//! | `POLL`                             | yes      |
//! | `IDENTIFY`                         | no       |
//! | `GET-NEW-REQUEST-REQUIREMENTS`     | no       |
//! | `GET-RENEW-REQUEST-REQUIREMENTS`   | no       |
//! | `GET-DEFAULT-TEMPLATE`             | yes      |
//! | `GET-SUPPORTED-TEMPLATES`          | yes      |
//! | `FETCH-ROOTS`                      | yes      |
//!
//! Anything else exits 6 without output.
//!
//! ## Exit Codes
//!
//! - `0`: success, stdout carries the answer
//! - `1`: pending, stdout carries the request id to poll with
//! - `2`: rejected by the CA
//! - `3`: configuration missing or invalid
//! - `4`: unexpected failure
//! - `6`: operation not implemented
//!
//! ## Library Use
//!
//! ```no_run
//! use certmonger_certsrv::{operations, CertsrvClient, ConfigLoader, Environment};
//!
//! # async fn example() {
//! let env = Environment::from_process();
//! let loader = ConfigLoader::new();
//! let response = operations::run(&env, &loader, CertsrvClient::new).await;
//! println!("exit {}: {}", response.status.code(), response.stdout);
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod exit;
pub mod logging;
pub mod operations;
pub mod setup;
pub mod tls;
pub mod types;

// Re-export main types at crate root for convenience
pub use adapter::CaAdapter;
pub use client::CertsrvClient;
pub use config::{ConfigFile, ConfigLoader, Credentials};
pub use env::Environment;
pub use error::{CertsrvError, Result};
pub use exit::{ExitStatus, Response};
pub use types::{CaOutcome, CaReply, ChainEncoding, Operation};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("certmonger-certsrv/", env!("CARGO_PKG_VERSION"));

/// Product line answered to IDENTIFY.
pub const PRODUCT: &str = concat!("certmonger-certsrv ", env!("CARGO_PKG_VERSION"));
