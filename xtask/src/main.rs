use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use web_shell_infra::assets::{archive_name, asset_files, AssetManifest};
use web_shell_infra::config::StackConfig;
use web_shell_infra::graph::StackGraph;
use web_shell_infra::log::{log_error, log_info};
use web_shell_infra::template::synthesize;
use web_shell_infra::web_shell::build_web_shell;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the web-shell stack workspace",
    long_about = "A unified CLI for synthesizing the web-shell stack template,\n\
                  packaging its code assets, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct StackArgs {
    /// JSON stack config; defaults apply to every missing field
    #[arg(long, env = "WEB_SHELL_CONFIG")]
    config: Option<PathBuf>,
    /// Directory that code asset paths are relative to
    #[arg(long)]
    asset_root: Option<PathBuf>,
    /// Bucket the asset archives are uploaded to
    #[arg(long, env = "WEB_SHELL_ASSET_BUCKET")]
    asset_bucket: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the stack and write its template
    Synth {
        #[command(flatten)]
        stack: StackArgs,
        /// Output file path
        #[arg(long, default_value = "cdk.out/WebShellMgStack.template.json")]
        output: PathBuf,
    },
    /// Print the resolved resource graph
    Graph {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// Zip every code asset into `<dist>/<hash>.zip`
    PackageAssets {
        #[command(flatten)]
        stack: StackArgs,
        /// Directory receiving the archives
        #[arg(long, default_value = "cdk.out/assets")]
        dist: PathBuf,
    },
    /// Run CI checks (fmt, clippy, tests, synth)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Validate the default stack graph
    Graph,
    /// Run check + graph
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn fail(event: &str, error: impl std::fmt::Display) -> ! {
    log_error("xtask", event, json!({ "error": error.to_string() }));
    exit(1);
}

fn load_config(args: &StackArgs) -> StackConfig {
    let mut config = match &args.config {
        Some(path) => StackConfig::load(path).unwrap_or_else(|error| fail("config_invalid", error)),
        None => StackConfig::default(),
    };
    if let Some(root) = &args.asset_root {
        config.asset_root = root.clone();
    }
    if let Some(bucket) = &args.asset_bucket {
        config.asset_bucket = bucket.clone();
    }
    config
}

fn build_graph(config: &StackConfig) -> StackGraph {
    build_web_shell(config).unwrap_or_else(|error| fail("stack_invalid", error))
}

fn collect_assets(graph: &StackGraph, config: &StackConfig) -> AssetManifest {
    AssetManifest::collect(graph, &config.asset_root, &config.asset_bucket)
        .unwrap_or_else(|error| fail("asset_hash_failed", error))
}

// ── commands ───────────────────────────────────────────────────────

fn synth(args: &StackArgs, output: &Path) {
    let config = load_config(args);
    let graph = build_graph(&config);
    let manifest = collect_assets(&graph, &config);
    let template =
        synthesize(&graph, &manifest).unwrap_or_else(|error| fail("synth_failed", error));
    let body = template
        .to_json_pretty()
        .unwrap_or_else(|error| fail("synth_failed", error));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).expect("failed to create template output directory");
    }
    fs::write(output, body).expect("failed to write template");

    log_info(
        "xtask",
        "template_written",
        json!({
            "stack": graph.name(),
            "output": output.display().to_string(),
            "resources": template.resources.len(),
        }),
    );
}

fn print_graph(args: &StackArgs) {
    let config = load_config(args);
    let graph = build_graph(&config);
    let rendered =
        serde_json::to_string_pretty(&graph.summary()).expect("graph summary serializes");
    println!("{rendered}");
}

fn package_assets(args: &StackArgs, dist: &Path) {
    let config = load_config(args);
    let graph = build_graph(&config);
    let manifest = collect_assets(&graph, &config);

    step("Package code assets");
    fs::create_dir_all(dist).expect("failed to create asset dist directory");

    for (path, hash) in manifest.entries() {
        let source = config.asset_root.join(path);
        let archive = dist.join(format!("{hash}.zip"));
        package_asset_zip(&source, &archive);
        eprintln!("- {} -> {}", path.display(), archive.display());
    }
}

fn package_asset_zip(source_dir: &Path, zip_path: &Path) {
    let files = asset_files(source_dir).unwrap_or_else(|error| fail("asset_list_failed", error));

    let file = fs::File::create(zip_path).expect("failed to create asset zip");
    let mut zip = ZipWriter::new(file);
    // Fixed timestamp: equal content hashes must give byte-identical archives.
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    for relative in files {
        let contents = fs::read(source_dir.join(&relative)).expect("failed to read asset file");
        zip.start_file(archive_name(&relative), options)
            .expect("failed to start asset zip entry");
        zip.write_all(&contents)
            .expect("failed to write asset zip entry");
    }
    zip.finish().expect("failed to finish asset zip");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test web_shell_infra");
    run_cargo(&["test", "-p", "web_shell_infra"]);
}

fn ci_graph() {
    step("Validate default stack graph");
    run_cargo(&["run", "-p", "xtask", "--", "graph"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { stack, output } => synth(&stack, &output),
        Commands::Graph { stack } => print_graph(&stack),
        Commands::PackageAssets { stack, dist } => package_assets(&stack, &dist),
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Graph => ci_graph(),
                CiJob::All => {
                    ci_check();
                    ci_graph();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
