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

//! certmonger CA helper for Microsoft certsrv.
//!
//! # Usage
//!
//! ```text
//! certmonger-certsrv [OPTIONS]
//!
//! Options:
//!       --config               Interactively create or update the configuration
//!       --config-file <PATH>   Path to configuration file
//!   -h, --help                 Print help
//!   -V, --version              Print version
//! ```
//!
//! Without `--config` the helper reads `CERTMONGER_OPERATION` and friends from
//! the environment, as certmonger sets them:
//!
//! ```bash
//! getcert add-ca -c certsrv -e /usr/libexec/certmonger/certmonger-certsrv
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use certmonger_certsrv::exit::{ExitStatus, Response};
use certmonger_certsrv::{logging, operations, setup, CertsrvClient, ConfigLoader, Environment};

/// certmonger helper for Microsoft AD CS web enrollment
#[derive(Parser)]
#[command(name = "certmonger-certsrv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "certmonger CA helper for Microsoft certsrv", long_about = None)]
struct Cli {
    /// Interactively create or update the configuration
    #[arg(long)]
    config: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is best effort; certmonger only sees stdout and the exit code.
    let _ = logging::init_audit_log(&logging::audit_log_path());

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config_file {
        loader = loader.with_path(path);
    }

    if cli.config {
        return setup::run_interactive(&loader).emit();
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create async runtime: {}", e);
            return Response {
                stdout: format!("Failed to create async runtime: {}\n", e),
                status: ExitStatus::Failure,
            }
            .emit();
        }
    };

    let env = Environment::from_process();
    logging::log_environment(&env);

    runtime
        .block_on(operations::run(&env, &loader, CertsrvClient::new))
        .emit()
}
