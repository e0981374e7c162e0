//! # CLI Module
//!
//! Command-line access to the resolver for trying out manifests.
//!
//! ## Commands
//!
//! ### `resolve`
//!
//! Resolve one request against a manifest:
//!
//! ```bash
//! brrtresolver resolve --manifest resources.yaml -X GET --path /widgets/7 --accept application/json
//! ```
//!
//! Prints the selected resource and operation, the locators followed, the
//! bound template variables, the negotiated response type and the
//! resolution stack. A request that does not resolve prints its status
//! (and `Allow` listing for a 405) and exits with an error.
//!
//! ### `inspect`
//!
//! List every resource and operation a manifest declares:
//!
//! ```bash
//! brrtresolver inspect --manifest resources.yaml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtresolver::cli::{run, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run(&cli, &mut std::io::stdout())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run, run_cli, Cli, Commands};
