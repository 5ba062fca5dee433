//! Schema Registry CLI
//!
//! Query a schema manifest: parse identifiers, look up descriptors, list
//! family versions, and check whether an API schema applies to a type.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use schema_versioning::{
    is_allowed_schema_family, is_allowed_schema_identifier, make_schema_identifier,
    parse_family_and_version, RegistryConfig, SchemaObject, SchemaRef, SchemaRegistry,
    SchemaVersion, VersionPolicy,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Query versioned schema descriptors")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    /// Schema manifest (overrides config)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an identifier into family and version
    Parse {
        identifier: String,
    },

    /// Build the identifier for a family and version
    Make {
        family: String,
        version: SchemaVersion,
    },

    /// Show the descriptor for an identifier, or for a family and version
    Info {
        /// Identifier, or family when a version is given
        name: String,
        version: Option<SchemaVersion>,
    },

    /// List the versions registered in a family
    Family {
        family: String,
        /// Reference version for the policy
        #[arg(short, long, default_value_t = 0)]
        version: SchemaVersion,
        /// all, greater-than, greater-than-or-equal, less-than, less-than-or-equal
        #[arg(short, long, default_value_t = VersionPolicy::All)]
        policy: VersionPolicy,
    },

    /// List every registered schema
    List,

    /// Check whether an API schema can be applied to an object of a type
    Check {
        /// Identifier of the object's concrete type
        object_type: String,
        /// Identifier of the API schema
        api: String,
        #[arg(short, long)]
        instance: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match RegistryConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: RegistryConfig) -> anyhow::Result<()> {
    let manifest = cli.manifest.unwrap_or_else(|| config.manifest_path());
    let load = || -> anyhow::Result<Arc<SchemaRegistry>> {
        let registry = SchemaRegistry::load(&manifest)
            .with_context(|| format!("loading schema manifest {}", manifest.display()))?;
        Ok(Arc::new(registry))
    };

    let value = match cli.command {
        Commands::Parse { identifier } => {
            let (family, version) = parse_family_and_version(&identifier);
            json!({
                "identifier": identifier,
                "family": family,
                "version": version,
                "familyAllowed": is_allowed_schema_family(&family),
                "identifierAllowed": is_allowed_schema_identifier(&identifier),
            })
        }

        Commands::Make { family, version } => {
            json!({
                "family": family,
                "version": version,
                "identifier": make_schema_identifier(&family, version),
                "familyAllowed": is_allowed_schema_family(&family),
            })
        }

        Commands::Info { name, version } => {
            let registry = load()?;
            let schema = match version {
                Some(version) => SchemaRef::FamilyVersion(&name, version),
                None => SchemaRef::Identifier(&name),
            };
            match schema.resolve(&registry) {
                Some(info) => serde_json::to_value(info)?,
                None => bail!("no schema registered for {}", schema),
            }
        }

        Commands::Family { family, version, policy } => {
            let registry = load()?;
            let infos = registry.find_schema_infos_in_family(&family, version, policy);
            serde_json::to_value(infos)?
        }

        Commands::List => {
            let registry = load()?;
            let infos: Vec<_> = registry.iter().collect();
            serde_json::to_value(infos)?
        }

        Commands::Check { object_type, api, instance } => {
            let object = SchemaObject::new(load()?, object_type.as_str())?;
            let verdict = object.check_can_apply_api(api.as_str(), instance.as_deref());
            json!({
                "objectType": object.type_info().identifier,
                "api": api,
                "instance": instance,
                "canApply": verdict.is_ok(),
                "reason": verdict.err().map(|reason| reason.to_string()),
            })
        }
    };

    println!("{}", config.output.render(&value)?);
    Ok(())
}
