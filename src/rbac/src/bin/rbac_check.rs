//! # rbac-check
//!
//! Command line front end for the RBAC engine. Loads a role configuration and
//! answers grant checks, mainly for operators validating a role hierarchy
//! before rolling it out.
//!
//! ```text
//! rbac-check --config rbac.toml check contributor admin.settings
//! rbac-check --config rbac.toml check editor admin.publish -a tenant=acme -r tenant=acme
//! rbac-check --config rbac.toml roles
//! rbac-check --config rbac.toml permissions editor
//! ```
//!
//! `check` exits with status 1 when access is denied.
//!
//! Attribute values given with `-a`/`-r` are parsed as JSON when possible
//! (`level=3`, `active=true`) and taken as plain strings otherwise.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cretoai_rbac::{AccessContext, Assertion, AssertionError, Authorizer, RbacConfig, Role, RoleGraph};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// RBAC decision CLI
#[derive(Parser)]
#[command(name = "rbac-check")]
#[command(about = "Evaluate role-based access decisions against an RBAC configuration")]
#[command(version)]
struct Cli {
    /// Path to the RBAC configuration file (TOML or JSON)
    #[arg(short, long, default_value = "/etc/cretoai/rbac.toml", env = "RBAC_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether a role may access a resource
    Check {
        /// Role name
        role: String,

        /// Resource (permission) identifier
        resource: String,

        /// Context attribute passed to the check (repeatable)
        #[arg(short = 'a', long = "attribute", value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, Value)>,

        /// Attribute the context must carry for access to be granted (repeatable)
        #[arg(short = 'r', long = "require", value_name = "KEY=VALUE", value_parser = parse_attribute)]
        requirements: Vec<(String, Value)>,
    },

    /// List roles with the roles they inherit from
    Roles,

    /// Show direct and inherited permissions of a role
    Permissions {
        /// Role name
        role: String,
    },
}

/// Parse `key=value`; the value is JSON if it parses as such, a string otherwise
fn parse_attribute(arg: &str) -> std::result::Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", arg))?;
    if key.is_empty() {
        return Err(format!("empty attribute name in {:?}", arg));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Every required attribute must be present in the context with the given value
struct RequiredAttributes(Vec<(String, Value)>);

impl Assertion for RequiredAttributes {
    fn assert(
        &self,
        _graph: &RoleGraph,
        _role: &Role,
        _resource: &str,
        context: Option<&AccessContext>,
    ) -> std::result::Result<bool, AssertionError> {
        Ok(self.0.iter().all(|(key, expected)| {
            context
                .and_then(|ctx| ctx.get(key))
                .is_some_and(|value| value == expected)
        }))
    }
}

/// Execute a subcommand, writing its report to `out`
///
/// Returns `false` when a `check` is denied.
fn run(command: Command, authorizer: &Authorizer, out: &mut impl Write) -> Result<bool> {
    match command {
        Command::Check {
            role,
            resource,
            attributes,
            requirements,
        } => {
            let context: AccessContext = attributes.into_iter().collect();
            let context = (!context.is_empty()).then_some(context);

            let decision = if requirements.is_empty() {
                authorizer.is_granted(&role, &resource, context.as_ref())
            } else {
                let required = RequiredAttributes(requirements);
                authorizer.is_granted_with(&role, &resource, context.as_ref(), &required)
            };
            let granted = decision.context("Authorization check failed")?;

            let verdict = if granted { "granted" } else { "denied" };
            writeln!(out, "{}: {} -> {}", verdict, role, resource)?;
            Ok(granted)
        }
        Command::Roles => {
            let graph = authorizer.graph();
            for role in graph.roles() {
                let ancestors = graph.ancestors(role.name())?;
                if ancestors.is_empty() {
                    writeln!(out, "{}", role.name())?;
                } else {
                    writeln!(out, "{} <- {}", role.name(), ancestors.join(", "))?;
                }
            }
            Ok(true)
        }
        Command::Permissions { role } => {
            let graph = authorizer.graph();
            let direct = graph.get_role(&role)?;

            for permission in graph.effective_permissions(&role)? {
                if direct.has_direct_permission(permission) {
                    writeln!(out, "{}", permission)?;
                } else {
                    writeln!(out, "{} (inherited)", permission)?;
                }
            }
            Ok(true)
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},cretoai_rbac={}", log_level, log_level).into()),
        )
        .with_target(true)
        .with_line_number(true)
        .with_writer(io::stderr)
        .init();

    let config = RbacConfig::load(&cli.config)
        .with_context(|| format!("Failed to load RBAC configuration from {:?}", cli.config))?;
    let authorizer = Authorizer::from_config(&config).context("Invalid RBAC configuration")?;
    info!(roles = authorizer.graph().len(), "RBAC configuration loaded");

    let mut stdout = io::stdout().lock();
    if run(cli.command, &authorizer, &mut stdout)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
