use crate::config::ResolverConfig;
use crate::context::RequestContext;
use crate::registry::{load_manifest, Registry};
use crate::resolver::{Engine, Resolution};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface for the resolver
///
/// Resolves ad-hoc requests against a resource manifest and lists what a
/// manifest declares.
#[derive(Parser, Debug)]
#[command(name = "brrtresolver")]
#[command(about = "BRRTResolver CLI", long_about = None, version)]
pub struct Cli {
    /// Log filter, e.g. `debug` or `brrtresolver=trace`
    #[arg(long, global = true, env = "BRRTR_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one request and print the selected operation
    Resolve {
        /// Resource manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request path, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// Content-Type of the request body
        #[arg(long)]
        content_type: Option<String>,

        /// Accept header
        #[arg(long)]
        accept: Option<String>,

        /// Resolver settings (YAML); `BRRTR_*` environment variables otherwise
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List every resource and operation of a manifest
    Inspect {
        /// Resource manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

/// Parse the process arguments and run the command, printing to stdout.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(&cli, &mut io::stdout().lock())
}

/// Run `cli`, writing the report to `out`.
///
/// # Errors
///
/// Fails when the manifest or configuration cannot be loaded, when the
/// method is not a valid HTTP method, and when the request does not
/// resolve (except an `OPTIONS` request answered with an `Allow` listing).
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Resolve {
            manifest,
            method,
            path,
            content_type,
            accept,
            config,
        } => {
            let registry = load_manifest(manifest)?;
            let config = match config {
                Some(file) => ResolverConfig::from_yaml_file(file)?,
                None => ResolverConfig::from_env(),
            };
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;

            let mut ctx = RequestContext::new(method, path);
            if let Some(ct) = content_type {
                ctx = ctx.with_header("Content-Type", ct);
            }
            if let Some(accept) = accept {
                ctx = ctx.with_header("Accept", accept);
            }

            let engine = Engine::new(Arc::new(registry)).with_config(config);
            match engine.resolve(&mut ctx) {
                Ok(resolution) => {
                    write_resolution(out, &resolution)?;
                    for frame in ctx.resolution_stack() {
                        writeln!(
                            out,
                            "frame:     {} {} [{}]",
                            frame.resource_name,
                            frame.operation,
                            frame.template_values.join(", ")
                        )?;
                    }
                    Ok(())
                }
                Err(err) => {
                    writeln!(out, "status:    {}", err.status())?;
                    if let Some(allow) = err.allow_header() {
                        writeln!(out, "allow:     {allow}")?;
                    }
                    if err.is_options_fallback() {
                        return Ok(());
                    }
                    Err(anyhow!(err).context(format!("{} {} did not resolve", ctx.method(), path)))
                }
            }
        }
        Commands::Inspect { manifest } => {
            let registry = load_manifest(manifest)?;
            write_inventory(out, &registry)?;
            Ok(())
        }
    }
}

fn write_resolution(out: &mut dyn Write, resolution: &Resolution<'_>) -> io::Result<()> {
    writeln!(out, "resource:  {}", resolution.resource().name())?;
    writeln!(out, "operation: {}", resolution.operation().name())?;
    if !resolution.locators.is_empty() {
        let chain: Vec<&str> = resolution.locators.iter().map(|l| l.name()).collect();
        writeln!(out, "locators:  {}", chain.join(" -> "))?;
    }
    for (name, values) in resolution.values().vars() {
        writeln!(out, "variable:  {name}={}", values.join(","))?;
    }
    if let Some(response_type) = resolution.response_type() {
        writeln!(out, "produces:  {response_type}")?;
    }
    Ok(())
}

fn join_types(types: &[crate::media::MediaType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn write_inventory(out: &mut dyn Write, registry: &Registry) -> io::Result<()> {
    for resource in registry.resources() {
        let role = if resource.is_root() { "root" } else { "sub" };
        writeln!(out, "{} {} ({role})", resource.name(), resource.template())?;
        for op in resource.operations() {
            match op.locates().and_then(|id| registry.resource(id)) {
                Some(target) => writeln!(
                    out,
                    "  LOCATE {} {} -> {}",
                    op.template(),
                    op.name(),
                    target.name()
                )?,
                None => writeln!(
                    out,
                    "  {} {} {} consumes={} produces={}",
                    op.method().map_or("-", |m| m.as_str()),
                    op.template(),
                    op.name(),
                    join_types(op.consumes()),
                    join_types(op.produces())
                )?,
            }
        }
    }
    Ok(())
}
