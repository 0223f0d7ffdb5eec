use clap::Parser;
use element_watcher::{ReplayDetection, Scenario};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "detect")]
#[command(about = "Replays a document mutation scenario and reports the elements each watch detects")]
struct Cli {
	/// Scenario file (JSON)
	#[arg(short, long)]
	scenario: PathBuf,

	/// Enable verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Print detections as JSON lines on stdout
	#[arg(short, long)]
	json: bool,

	/// Only report detections for this watch
	#[arg(short, long)]
	watch: Option<String>,
}

fn describe(detection: &ReplayDetection) -> String {
	let phase = match detection.batch {
		Some(batch) => format!("batch {batch}"),
		None => "initial scan".to_string(),
	};
	let id = detection
		.detection
		.element_id
		.as_deref()
		.map(|id| format!("#{id}"))
		.unwrap_or_default();
	format!(
		"[{}] {} matched <{}{}> ({})",
		phase, detection.watch, detection.detection.tag, id, detection.detection.node
	)
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// Initialize tracing
	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.init();

	info!("Loading scenario: {:?}", cli.scenario);
	let scenario = Scenario::load(&cli.scenario)?;
	let report = scenario.run()?;

	let selected = report
		.detections
		.iter()
		.filter(|d| cli.watch.as_deref().map_or(true, |name| d.watch == name));
	for detection in selected {
		if cli.json {
			println!("{}", serde_json::to_string(detection)?);
		} else {
			println!("{}", describe(detection));
		}
	}

	info!(
		"Replayed {} batches, {} detections",
		report.batches,
		report.detections.len()
	);
	Ok(())
}
