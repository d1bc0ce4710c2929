use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use unity3d_builder::builder::LOGS_DIR;
use unity3d_builder::config::{BuilderConfig, CONFIG_FILE_NAME};
use unity3d_builder::{
    editor, host_path, log_util, Archiver, ArchiverKind, BuildOptions, Platform, Tools,
    Unity3DBuilder, UnityEditor,
};

/// Create Unity3D standalone players of a project for Windows, OS X and Linux
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Unity Project Folder Path
    #[arg(short, long)]
    project: String,

    /// Output folder for the zipped players
    #[arg(short, long, required_unless_present = "write_default_config")]
    dest: Option<String>,

    /// Unity editor executable (defaults to the Unity Hub install for the project's version)
    #[arg(long)]
    editor: Option<String>,

    /// 7-Zip executable
    #[arg(long)]
    seven_zip: Option<String>,

    #[arg(long, value_enum)]
    archiver: Option<ArchiverKind>,

    /// Platforms to build, all of them when omitted
    #[arg(long = "platform", value_enum)]
    platforms: Vec<Platform>,

    /// Stop at the first failed platform (`--fail-fast=false` overrides the config)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    fail_fast: Option<bool>,

    /// Settings file (defaults to <project>/.builder_config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Write a default settings file into the project and exit
    #[arg(long)]
    write_default_config: bool,
}

fn fail_fast(flag: Option<bool>, config: &BuilderConfig) -> bool {
    flag.or(config.fail_fast).unwrap_or(false)
}

fn resolve_opt(path: Option<String>) -> Result<Option<PathBuf>> {
    Ok(match path {
        Some(p) => Some(host_path::resolve(&p)?),
        None => None,
    })
}

async fn build_players(args: Args) -> Result<()> {
    let project_path = host_path::resolve(&args.project)?;
    if !project_path.is_dir() {
        return Err(anyhow::anyhow!(
            "Invalid project path: {}",
            project_path.display()
        ));
    }

    let config_file = match &args.config {
        Some(c) => host_path::resolve(c)?,
        None => project_path.join(CONFIG_FILE_NAME),
    };

    if args.write_default_config {
        BuilderConfig::write_default(&config_file)?;
        println!("default config written to {}", config_file.display());
        return Ok(());
    }

    let dest = args
        .dest
        .ok_or_else(|| anyhow::anyhow!("--dest is required"))?;
    let dest_dir = host_path::resolve(&dest)?;
    let _guards = log_util::init(&dest_dir.join(LOGS_DIR))?;

    let config = if args.config.is_some() {
        BuilderConfig::load(&config_file)?
    } else {
        BuilderConfig::load_or_default(&config_file)?
    };
    let stop_on_failure = fail_fast(args.fail_fast, &config);

    let editor_path = resolve_opt(args.editor.or(config.editor_path))?;
    let editor_path = editor::locate_editor(&project_path, editor_path.as_deref())?;
    tracing::info!("unity_path: {}", editor_path.display());

    let seven_zip = resolve_opt(args.seven_zip.or(config.seven_zip_path))?;
    let archiver_kind = args.archiver.or(config.archiver).unwrap_or_default();
    let archiver = Archiver::select(archiver_kind, seven_zip.as_deref())?;
    tracing::info!("archiver: {:?}", archiver);

    let platforms = if !args.platforms.is_empty() {
        args.platforms
    } else {
        config.platforms.unwrap_or_else(|| Platform::ALL.to_vec())
    };
    if platforms.is_empty() {
        return Err(anyhow::anyhow!("No platforms to build"));
    }

    let builder = Unity3DBuilder::new(
        &args.project,
        &dest,
        Tools {
            editor: UnityEditor::new(editor_path),
            archiver,
        },
    )?
    .with_options(BuildOptions {
        platforms,
        fail_fast: stop_on_failure,
    });

    let report = builder.create().await?;
    for (platform, zip_file) in report.archives.iter() {
        tracing::info!("{}: {}", platform, zip_file.display());
    }
    tracing::info!("DONE!");

    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Args = Args::parse();
    match build_players(args).await {
        Ok(_) => {}
        Err(e) => {
            tracing::error!("{}", e);
            println!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
