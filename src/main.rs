use anyhow::{Context, Result};
use careguide::{CareRecordSource, GuideBundle, GuideConfig, GuideGenerator, GuideType};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample bundle and configuration
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Generate a guide from a record bundle
    Generate {
        /// Guide type: child, family, babysitter, school or grandparent
        #[arg(short = 't', long = "type")]
        guide_type: String,

        /// Path to the JSON or YAML record bundle
        #[arg(short, long)]
        bundle: PathBuf,

        /// Child id for child guides
        #[arg(long)]
        child: Option<String>,

        /// Write the guide to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => init_project(&path)?,
        Commands::Generate {
            guide_type,
            bundle,
            child,
            output,
        } => {
            let config = match cli.config {
                Some(path) => GuideConfig::load(&path).context("Failed to load config")?,
                None => GuideConfig::default(),
            };
            generate(config, &guide_type, &bundle, child.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Writing sample careguide files to {:?}", path);
    std::fs::create_dir_all(path)?;

    let config_content = r#"poison_control: "**Poison Control:** 1-800-222-1222"
footer_format: "%B %-d, %Y at %H:%M UTC"

audiences:
  school:
    title: "School Pack"
    child_fields:
      - health.allergies
      - health.reaction_protocol
      - routines.meals
    household:
      - emergency.emergency_plan
"#;
    std::fs::write(path.join("careguide.yaml"), config_content)?;

    let bundle_content = r#"{
  "children": [
    {"id": "kid-1", "name": "Sam", "birthdate": "2024-01-02"}
  ],
  "child_records": [
    {
      "id": "rec-1",
      "child_id": "kid-1",
      "routines": {"bedtime": "7:30pm", "meals": "Dinner at 5:30"},
      "health": {"allergies": ["peanuts"], "reaction_protocol": "EpiPen, then call 911"},
      "health_redacted_fields": [],
      "comfort": {"calming_tips": "Sing the moon song"},
      "safety": {"cannot_do": "Climb the bookshelf"}
    }
  ],
  "family_record": {
    "id": "fam-1",
    "home_base": {"street": "12 Elm St", "city": "Springfield", "wifi_network": "Home", "wifi_password": "secret"},
    "home_base_redacted_fields": ["street"],
    "emergency": {"emergency_plan": "Meet at the mailbox"}
  }
}
"#;
    std::fs::write(path.join("bundle.json"), bundle_content)?;

    info!("✓ Sample files written");
    info!("  Run: careguide generate -t babysitter -b bundle.json");

    Ok(())
}

fn generate(
    config: GuideConfig,
    guide_type: &str,
    bundle_path: &Path,
    child_id: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let guide_type: GuideType = guide_type.parse()?;

    info!("Loading records from {:?}", bundle_path);
    let bundle = GuideBundle::load(bundle_path).context("Failed to load record bundle")?;
    let inputs = bundle.inputs_for(guide_type, child_id)?;

    let generator = GuideGenerator::with_config(config);
    let guide = generator
        .generate(guide_type, &inputs)
        .with_context(|| format!("Could not generate {} guide", guide_type))?;

    match output {
        Some(path) => {
            std::fs::write(path, &guide)
                .with_context(|| format!("Failed to write guide to {:?}", path))?;
            info!("{:?}", path);
        }
        None => println!("{}", guide),
    }

    Ok(())
}
