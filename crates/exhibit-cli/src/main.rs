use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exhibit_core::ComposerConfig;
use exhibit_ir::spatial::{SpatialConstraint, SpatialObject};
use exhibit_ir::{build_scene_graph_with_config, validate_with_evidence, BuildOutput, SpatialSolver};
use serde::Deserialize;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "exhibit.toml";

#[derive(Parser)]
#[command(
    name = "exhibit",
    version,
    about = "Exhibit - deterministic scene composition for evidence presentations",
    long_about = "Exhibit turns a compiled presentation timeline into a 3D scene graph.\nEvidence is blocked on stage, cameras are animated, and the result is written as USD text."
)]
struct Cli {
    /// Composer configuration (TOML). Defaults to ./exhibit.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a scene graph from a timeline and write its USD description
    Build {
        /// Path to the compiled timeline JSON
        #[arg()]
        timeline: PathBuf,

        /// Output file for the USD text (default: <timeline>.usda)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the full scene graph and validation report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Build a timeline and report validation issues without writing output
    Validate {
        /// Path to the compiled timeline JSON
        #[arg()]
        timeline: PathBuf,

        /// Evidence ids known to the evidence store; others are reported
        #[arg(long = "evidence", value_name = "ID")]
        evidence: Vec<String>,
    },

    /// Run the spatial solver on a standalone problem file
    Solve {
        /// JSON file with `objects` and `constraints` lists
        #[arg()]
        problem: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Deserialize)]
struct SolveProblem {
    #[serde(default)]
    objects: Vec<SpatialObject>,
    #[serde(default)]
    constraints: Vec<SpatialConstraint>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            timeline,
            output,
            report,
        } => cmd_build(&config, &timeline, output, report),
        Commands::Validate { timeline, evidence } => cmd_validate(&config, &timeline, evidence),
        Commands::Solve { problem } => cmd_solve(&config, &problem),
        Commands::Config => {
            print!(
                "{}",
                config
                    .to_toml_string()
                    .context("failed to render configuration")?
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ComposerConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(ComposerConfig::default());
            }
            fallback
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = ComposerConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

fn build(config: &ComposerConfig, timeline: &Path) -> Result<BuildOutput> {
    let text = std::fs::read_to_string(timeline)
        .with_context(|| format!("failed to read timeline: {}", timeline.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("timeline is not valid JSON: {}", timeline.display()))?;
    build_scene_graph_with_config(value, config)
        .with_context(|| format!("failed to build scene graph from {}", timeline.display()))
}

fn cmd_build(
    config: &ComposerConfig,
    timeline: &Path,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
) -> Result<()> {
    let out = build(config, timeline)?;
    let output = output.unwrap_or_else(|| timeline.with_extension("usda"));
    std::fs::write(&output, &out.serialized_text)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if let Some(report) = report {
        let json = serde_json::to_string_pretty(&out).context("failed to encode build report")?;
        std::fs::write(&report, json)
            .with_context(|| format!("failed to write {}", report.display()))?;
    }

    let graph = &out.scene_graph;
    println!("Built {}", timeline.display());
    println!(
        "   {} scene(s), {} object(s), {} camera(s), {} light(s)",
        graph.scenes.len(),
        graph.objects.len(),
        graph.cameras.len(),
        graph.lights.len()
    );
    println!("   Duration: {}s @ {} fps", graph.duration, graph.fps);
    println!("   Hash: {}", out.content_hash);
    println!("   Wrote {} ({}ms)", output.display(), out.processing_time_ms);
    print_findings(&out.validation_results.issues, &out.validation_results.warnings);
    Ok(())
}

fn cmd_validate(config: &ComposerConfig, timeline: &Path, evidence: Vec<String>) -> Result<()> {
    let out = build(config, timeline)?;
    let report = if evidence.is_empty() {
        out.validation_results
    } else {
        let known: BTreeSet<String> = evidence.into_iter().collect();
        validate_with_evidence(&out.scene_graph, &known)
    };

    println!("Validating {}", timeline.display());
    print_findings(&report.issues, &report.warnings);
    if !report.valid {
        anyhow::bail!("scene graph is invalid ({} issue(s))", report.issues.len());
    }
    println!("   OK: {} scene(s), {} object(s)", report.scene_count, report.object_count);
    Ok(())
}

fn cmd_solve(config: &ComposerConfig, problem: &Path) -> Result<()> {
    let text = std::fs::read_to_string(problem)
        .with_context(|| format!("failed to read problem: {}", problem.display()))?;
    let problem: SolveProblem =
        serde_json::from_str(&text).context("problem must hold `objects` and `constraints` lists")?;

    let mut solver = SpatialSolver::with_settings(config.solver.clone());
    for object in problem.objects {
        solver.add_object(object);
    }
    for constraint in problem.constraints {
        solver.add_constraint(constraint);
    }
    let solution = solver.solve();
    println!(
        "{}",
        serde_json::to_string_pretty(&solution).context("failed to encode solution")?
    );
    Ok(())
}

fn print_findings(issues: &[String], warnings: &[String]) {
    for issue in issues {
        println!("   error: {}", issue);
    }
    for warning in warnings {
        println!("   warning: {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["exhibit", "build", "t.json", "-o", "t.usda"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { output: Some(_), .. }));

        let cli = Cli::try_parse_from([
            "exhibit",
            "validate",
            "t.json",
            "--evidence",
            "document_1",
            "--evidence",
            "image_2",
        ])
        .unwrap();
        match cli.command {
            Commands::Validate { evidence, .. } => assert_eq!(evidence, vec!["document_1", "image_2"]),
            _ => panic!("expected validate"),
        }

        let cli = Cli::try_parse_from(["exhibit", "--config", "c.toml", "config"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn test_solve_problem_decodes() {
        let problem: SolveProblem = serde_json::from_str(
            r#"{
                "objects": [
                    {"id": "a", "kind": "evidence", "position": [0, 0, 0]},
                    {"id": "b", "kind": "evidence", "position": [0.2, 0, 0]}
                ],
                "constraints": [
                    {"id": "c", "kind": "collision", "objects": ["a", "b"], "target": 1.0}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(problem.objects.len(), 2);
        assert_eq!(problem.constraints[0].weight, 1.0);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/exhibit.toml"))).is_err());
    }
}
