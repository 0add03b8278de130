//! cfs - feature vector definition tools
//!
//! Inspect definitions, dump default and encoded vectors, reorder
//! properties, and pack definitions into checksummed binary bundles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cfs_core::persistence::{self, BundleMetadata};
use cfs_core::{EncoderConfig, FeatureVectorDefinition};

#[derive(Parser)]
#[command(name = "cfs")]
#[command(about = "Object property feature vector tools", long_about = None, version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the slot layout of a definition
    Inspect {
        /// Definition file (.json / .yaml)
        #[arg(long)]
        definition: PathBuf,
    },

    /// Print the default feature vector as JSON
    Defaults {
        #[arg(long)]
        definition: PathBuf,
    },

    /// Print the feature vector of one provider as JSON
    Encode {
        #[arg(long)]
        definition: PathBuf,

        /// Provider file (.json / .yaml)
        #[arg(long)]
        provider: PathBuf,

        /// Encoder config (noise, seed)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Reorder properties and write the definition back out
    Reorder {
        #[arg(long)]
        definition: PathBuf,

        /// Comma separated property names; unlisted properties keep their
        /// relative order after the listed ones
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,

        #[arg(long)]
        out: PathBuf,
    },

    /// Pack a definition into a binary bundle
    Pack {
        #[arg(long)]
        definition: PathBuf,

        /// Output bundle path
        #[arg(long)]
        out: PathBuf,

        /// Read the bundle back and check it after writing
        #[arg(long, default_value = "false")]
        verify: bool,
    },

    /// Unpack a binary bundle into a text definition
    Unpack {
        #[arg(long)]
        bundle: PathBuf,

        /// Output definition path (.json / .yaml)
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the JSON Schema of definition documents
    Schema,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { definition } => {
            let def = load_definition(&definition)?;
            print_layout(&def);
        }

        Commands::Defaults { definition } => {
            let def = load_definition(&definition)?;
            println!("{}", serde_json::to_string(&def.default_vector())?);
        }

        Commands::Encode { definition, provider, config } => {
            let def = Arc::new(load_definition(&definition)?);
            let mut provider = persistence::load_provider(&provider)
                .with_context(|| format!("Failed to load provider: {}", provider.display()))?;
            // Documents carry bare values; code-books and lengths come from the definition.
            if provider.belongs_to(&def) {
                provider.refresh(&def);
            } else {
                warn!(
                    provider_definition = %provider.definition_id(),
                    definition = %def.id(),
                    "provider was built for another definition, encoding defaults"
                );
            }
            let config = match config {
                Some(path) => persistence::load_config(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => EncoderConfig::default(),
            };

            let requester = config.requester(def);
            let mut rng = config.rng();
            let vector = requester.request(Some(&provider), &mut rng)?;
            debug!(length = vector.len(), noise = ?config.noise, "encoded provider");
            println!("{}", serde_json::to_string(&vector)?);
        }

        Commands::Reorder { definition, order, out } => {
            let mut def = load_definition(&definition)?;
            def.set_order(&order);
            info!(order = ?def.property_order(), "reordered definition");
            persistence::save_document(&out, &def)
                .with_context(|| format!("Failed to write definition: {}", out.display()))?;

            println!("🔀 Reordered {} properties", def.len());
            println!("   Order:  {}", def.property_order().join(", "));
            println!("   Output: {}", out.display());
        }

        Commands::Pack { definition, out, verify } => {
            println!("🔨 Packing definition...");
            println!("   Input:  {}", definition.display());
            println!("   Output: {}", out.display());

            let def = load_definition(&definition)?;
            let (bundle, meta) = persistence::pack_definition(&def)?;
            persistence::write_bundle(&out, &bundle)
                .with_context(|| format!("Failed to write bundle: {}", out.display()))?;

            print_metadata(&meta);

            if verify {
                verify_bundle(&out, &def)?;
            }
        }

        Commands::Unpack { bundle, out } => {
            let packed = persistence::read_bundle(&bundle)
                .with_context(|| format!("Failed to read bundle: {}", bundle.display()))?;
            let def = persistence::unpack_definition(&packed)
                .with_context(|| format!("Invalid bundle: {}", bundle.display()))?;
            persistence::save_document(&out, &def)
                .with_context(|| format!("Failed to write definition: {}", out.display()))?;

            println!("📦 Unpacked {} properties ({} floats)", def.len(), def.total_length());
            println!("   Checksum: {}", packed.checksum);
            println!("   Output:   {}", out.display());
        }

        Commands::Schema => {
            let schema = FeatureVectorDefinition::json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn load_definition(path: &Path) -> Result<FeatureVectorDefinition> {
    let def = persistence::load_definition(path)
        .with_context(|| format!("Failed to load definition: {}", path.display()))?;
    debug!(
        path = %path.display(),
        id = %def.id(),
        properties = def.len(),
        total_length = def.total_length(),
        "loaded definition"
    );
    Ok(def)
}

fn print_layout(def: &FeatureVectorDefinition) {
    println!("Definition {}", def.id());
    println!("{:>5}  {:<24} {:<20} {:>6} {:>6}", "index", "name", "kind", "offset", "length");
    for slot in def.layout() {
        println!(
            "{:>5}  {:<24} {:<20} {:>6} {:>6}",
            slot.index,
            slot.name,
            slot.kind.as_str(),
            slot.offset,
            slot.length
        );
    }
    println!("Total length: {}", def.total_length());
}

fn print_metadata(meta: &BundleMetadata) {
    println!("\n✅ Bundle written!");
    println!("   Properties:      {}", meta.property_count);
    println!("   Vector length:   {}", meta.total_length);
    println!("   Original size:   {} bytes", meta.original_size);
    println!("   Compressed size: {} bytes", meta.compressed_size);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

fn verify_bundle(path: &Path, expected: &FeatureVectorDefinition) -> Result<()> {
    println!("\n🔍 Verifying bundle...");
    let bundle = persistence::read_bundle(path)?;
    let restored = persistence::unpack_definition(&bundle)?;

    if &restored == expected {
        println!("✅ Bundle verification passed");
        Ok(())
    } else {
        anyhow::bail!("❌ Bundle verification failed - definition differs after unpack")
    }
}
