use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sheetscan::assist::{organize_sections, validate_clusters, CommandAssistant};
use sheetscan::config::{load_config, save_config, AppConfig};
use sheetscan::core::category::Category;
use sheetscan::core::raster::SheetImage;
use sheetscan::export::{read_bundle, SectionBundle};
use sheetscan::ocr::{CommandOcr, DisabledOcr, OcrService};
use sheetscan::pipeline::{export_sheet, SheetProcessor};
use sheetscan::report::{
    render_report, with_metadata, AssistantRenderer, ReportMetadata, ReportRenderer,
};
use sheetscan::sections::{SectionEdit, SectionStore};
use sheetscan::LayoutAnalyzer;

#[derive(Parser, Debug)]
#[command(name = "sheetscan")]
#[command(version, about = "Split scanned proposal sheets into sections, transcribe and classify them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment, transcribe and classify one sheet
    Process {
        /// Scanned sheet image
        input: PathBuf,

        /// Output directory (default: ./<input_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// OCR program, overrides the configuration
        #[arg(long)]
        ocr_command: Option<String>,
    },

    /// Process several sheets
    Batch {
        /// Scanned sheet images
        inputs: Vec<PathBuf>,

        /// Output directory for all results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// OCR program, overrides the configuration
        #[arg(long)]
        ocr_command: Option<String>,
    },

    /// Print the detected section bounds as JSON
    Segment {
        /// Scanned sheet image
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Correct exported sections and group them into issue clusters
    Organize {
        /// sections.json files written by `process`
        bundles: Vec<PathBuf>,

        /// Clusters file to write
        #[arg(short, long, default_value = "clusters.json")]
        output: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Assistant program, overrides the configuration
        #[arg(long)]
        assistant_command: Option<String>,

        /// Reference text passed along with every correction
        #[arg(long = "reference")]
        references: Vec<String>,
    },

    /// Render clustered issues as a Markdown report
    Report {
        /// JSON list of issue clusters
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Assistant program, overrides the configuration
        #[arg(long)]
        assistant_command: Option<String>,

        /// Number of source images, shown in the report header
        #[arg(long, default_value_t = 0)]
        images: usize,
    },

    /// Correct one section of an exported sections.json in place
    Edit {
        /// sections.json written by `process`
        bundle: PathBuf,

        /// Section id (1-based)
        id: String,

        /// Replace the recognized text
        #[arg(long)]
        content: Option<String>,

        /// Set the category (label or slug, e.g. 課題 or issue)
        #[arg(long, conflicts_with = "reclassify")]
        category: Option<Category>,

        /// Replace the title
        #[arg(long)]
        title: Option<String>,

        /// Classify the content again
        #[arg(long)]
        reclassify: bool,
    },

    /// Write the default configuration
    InitConfig {
        #[arg(default_value = "sheetscan.toml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            ocr_command,
        } => {
            let config = resolve_config(config.as_deref(), ocr_command)?;
            process_single(&input, output, &config, cli.quiet)
        }
        Commands::Batch {
            inputs,
            output,
            config,
            ocr_command,
        } => {
            let config = resolve_config(config.as_deref(), ocr_command)?;
            process_batch(inputs, output, &config)
        }
        Commands::Segment { input, config } => {
            let config = resolve_config(config.as_deref(), None)?;
            show_segments(&input, &config)
        }
        Commands::Organize {
            bundles,
            output,
            config,
            assistant_command,
            references,
        } => {
            let mut config = resolve_config(config.as_deref(), None)?;
            if assistant_command.is_some() {
                config.assist.command = assistant_command;
            }
            organize_bundles(&bundles, &output, &config, &references)
        }
        Commands::Report {
            input,
            output,
            config,
            assistant_command,
            images,
        } => {
            let mut config = resolve_config(config.as_deref(), None)?;
            if assistant_command.is_some() {
                config.assist.command = assistant_command;
            }
            render_clusters(&input, output, &config, images)
        }
        Commands::Edit {
            bundle,
            id,
            content,
            category,
            title,
            reclassify,
        } => {
            let mut edits = Vec::new();
            edits.extend(content.map(SectionEdit::SetContent));
            if reclassify {
                edits.push(SectionEdit::Reclassify);
            }
            edits.extend(category.map(SectionEdit::SetCategory));
            edits.extend(title.map(SectionEdit::SetTitle));
            edit_bundle(&bundle, &id, edits)
        }
        Commands::InitConfig { path } => {
            save_config(&AppConfig::default(), &path)?;
            println!("[✓] Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(path: Option<&Path>, ocr_command: Option<String>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if ocr_command.is_some() {
        config.ocr.command = ocr_command;
    }
    config.validate()?;
    Ok(config)
}

fn ocr_service(config: &AppConfig) -> Box<dyn OcrService> {
    match &config.ocr.command {
        Some(program) => Box::new(
            CommandOcr::new(program.clone(), config.ocr.work_dir.clone())
                .with_args(config.ocr.args.clone()),
        ),
        None => Box::new(DisabledOcr),
    }
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string())
}

fn open_sheet(input: &Path) -> Result<SheetImage> {
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }
    SheetImage::open(input).with_context(|| format!("Failed to open image: {}", input.display()))
}

fn process_single(
    input: &Path,
    output: Option<PathBuf>,
    config: &AppConfig,
    quiet: bool,
) -> Result<()> {
    let output_dir =
        output.unwrap_or_else(|| PathBuf::from(format!("{}_output", input_stem(input))));

    if !quiet {
        println!("[*] Processing: {}", input.display());
        println!("[*] Output: {}", output_dir.display());
        if config.ocr.command.is_none() {
            println!("[!] No OCR command configured, sections will be left empty");
        }
    }

    let sheet_image = open_sheet(input)?;
    let ocr = ocr_service(config);
    let processor = SheetProcessor::from_config(config, ocr.as_ref());

    let sheet = processor
        .process(&sheet_image, &mut |done, total| {
            if !quiet {
                println!("[+] OCR {done}/{total}");
            }
        })
        .with_context(|| format!("Failed to process sheet: {}", input.display()))?;

    export_sheet(&sheet, &output_dir, &config.output)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        for entry in sheet.store.category_summary() {
            println!(
                "    {}: {} ({:.1}%)",
                entry.category, entry.count, entry.percentage
            );
        }
        println!(
            "\n[✓] Done! {} section(s), {:.0}% with text. Results saved to: {}",
            sheet.store.len(),
            sheet.store.success_rate() * 100.0,
            output_dir.display()
        );
    }

    Ok(())
}

fn process_batch(inputs: Vec<PathBuf>, output: Option<PathBuf>, config: &AppConfig) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_output"));

    println!("[*] Batch processing {} file(s)", inputs.len());
    println!("[*] Base output: {}\n", base_output.display());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, inputs.len(), input.display());

        let output_dir = base_output.join(input_stem(input));
        match process_single(input, Some(output_dir), config, true) {
            Ok(()) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {e:#}");
                failed += 1;
            }
        }
    }

    println!("\n[*] Summary: {success} succeeded, {failed} failed");

    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed to process");
    }

    Ok(())
}

fn show_segments(input: &Path, config: &AppConfig) -> Result<()> {
    let sheet_image = open_sheet(input)?;
    let bounds = LayoutAnalyzer::from_config(&config.segmentation).analyze(&sheet_image);
    println!("{}", serde_json::to_string_pretty(&bounds)?);
    Ok(())
}

fn organize_bundles(
    bundles: &[PathBuf],
    output: &Path,
    config: &AppConfig,
    references: &[String],
) -> Result<()> {
    if bundles.is_empty() {
        anyhow::bail!("No bundles specified");
    }
    let Some(program) = &config.assist.command else {
        anyhow::bail!(
            "No assistant command configured: set [assist].command or pass --assistant-command"
        );
    };
    let assistant = CommandAssistant::new(program.clone()).with_args(config.assist.args.clone());

    let mut sections = Vec::new();
    for path in bundles {
        let bundle = read_bundle(path)?;
        println!("[*] {}: {} section(s)", path.display(), bundle.total_sections);
        sections.extend(bundle.to_sections());
    }

    let clusters = organize_sections(&assistant, &sections, references)
        .context("Failed to organize sections")?;
    let validation = validate_clusters(&clusters);
    for issue in &validation.issues {
        tracing::warn!(%issue, "cluster validation");
    }

    fs::write(output, serde_json::to_string_pretty(&clusters)?)
        .with_context(|| format!("Failed to write clusters: {}", output.display()))?;
    println!(
        "[✓] {} issue(s), {} with solutions. Clusters saved to: {}",
        validation.total_problems,
        validation.problems_with_solutions,
        output.display()
    );
    Ok(())
}

/// Accepts either a bare list or an organizer reply with a `data` list.
fn cluster_list(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("expected a list of clusters or an object with a `data` list"),
        },
        _ => anyhow::bail!("expected a list of clusters"),
    }
}

fn render_clusters(
    input: &Path,
    output: Option<PathBuf>,
    config: &AppConfig,
    images: usize,
) -> Result<()> {
    let data = fs::read_to_string(input)
        .with_context(|| format!("Failed to read clusters: {}", input.display()))?;
    let value: Value = serde_json::from_str(&data)
        .with_context(|| format!("Clusters are not valid JSON: {}", input.display()))?;
    let clusters = cluster_list(value)?;

    let validation = validate_clusters(&Value::Array(clusters.clone()));
    for issue in &validation.issues {
        tracing::warn!(%issue, "cluster validation");
    }

    let assistant = config
        .assist
        .command
        .as_ref()
        .filter(|_| config.assist.ai_report)
        .map(|program| CommandAssistant::new(program.clone()).with_args(config.assist.args.clone()));
    let renderer = assistant.as_ref().map(|a| AssistantRenderer::new(a));
    let report = render_report(
        renderer.as_ref().map(|r| r as &dyn ReportRenderer),
        &clusters,
    );
    if let Some(err) = &report.ai_error {
        eprintln!("[!] AI report failed, used the built-in formatter: {err}");
    }

    let markdown = with_metadata(
        &report.markdown,
        &ReportMetadata {
            timestamp: Local::now(),
            image_count: images,
            problem_count: validation.total_problems,
        },
    );

    match output {
        Some(path) => {
            fs::write(&path, markdown)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            println!("[✓] Report ({}) saved to: {}", report.method, path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}

fn edit_bundle(path: &Path, id: &str, edits: Vec<SectionEdit>) -> Result<()> {
    if edits.is_empty() {
        anyhow::bail!("Nothing to change: pass --content, --category, --title or --reclassify");
    }

    let bundle = read_bundle(path)?;
    let mut store = SectionStore::new(bundle.to_sections());
    for edit in edits {
        store.apply(id, edit)?;
    }

    let mut updated = SectionBundle::from_sections(
        store.as_slice(),
        bundle.analysis_timestamp,
        true,
    )
    .with_summary(&store);
    updated.image_info = bundle.image_info;
    fs::write(path, serde_json::to_string_pretty(&updated)?)
        .with_context(|| format!("Failed to write bundle: {}", path.display()))?;

    if let Some(section) = store.get(id) {
        println!("[✓] {}: {}", section.title, section.category);
    }
    Ok(())
}
