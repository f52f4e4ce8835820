use std::path::Path;

use crate::device::accessor::DeviceAccessor;
use crate::device::u2::U2Device;
use crate::error::TraversalError;
use crate::explorer::catalog::ElementCatalog;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::explorer::Traverser;
use crate::explorer::report::TraversalReport;
use crate::record::recorder::FileRecorder;
use crate::state::identity::page_signature;
use crate::trace::logger::TraceLogger;

pub const TRACE_FILE: &str = "traversal_trace.jsonl";
pub const REPORT_FILE: &str = "traversal_report.json";

// ============================================================================
// traverse subcommand
// ============================================================================

pub fn cmd_traverse(
    config: ExplorerConfig,
    out_dir: &str,
    serial: Option<&str>,
    endpoint: Option<&str>,
) -> Result<TraversalReport, Box<dyn std::error::Error>> {
    if config.max_depth == 0 {
        return Err(TraversalError::Config("max depth must be at least 1".into()).into());
    }

    let device = U2Device::connect(serial, endpoint)?;
    let recorder = FileRecorder::new(out_dir)?;
    let tracer = TraceLogger::new(Path::new(out_dir).join(TRACE_FILE));

    tracing::info!(
        app = %config.app_identifier,
        max_depth = config.max_depth,
        out = out_dir,
        "starting traversal"
    );

    let mut traverser = Traverser::new(device, config)
        .with_recorder(Box::new(recorder))
        .with_tracer(tracer);
    let report = traverser.run()?;

    let report_path = Path::new(out_dir).join(REPORT_FILE);
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

    println!("{}", report.summary());
    if let Some(window) = &report.final_window {
        println!("Final window: {}", window);
    }
    println!(
        "Traversal complete, output saved in: {}",
        std::fs::canonicalize(out_dir)
            .unwrap_or_else(|_| Path::new(out_dir).to_path_buf())
            .display()
    );
    Ok(report)
}

// ============================================================================
// inspect subcommand
// ============================================================================

pub fn cmd_inspect(
    config: &ExplorerConfig,
    serial: Option<&str>,
    endpoint: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = U2Device::connect(serial, endpoint)?;
    let window = device.current_window()?;
    let page = page_signature(&mut device)?;

    println!("Device: {}", device.endpoint());
    println!("Window: {}", window);
    println!("Page signature: {}", page);

    let catalog = ElementCatalog::new(config);
    let elements = catalog.discover_interactable_elements(&mut device)?;
    println!("{} interactable elements:", elements.len());
    for (i, d) in elements.iter().enumerate() {
        let b = &d.element.bounds;
        println!(
            "  {:>3}. {:?} [{},{}][{},{}] {}",
            i + 1,
            d.element.kind,
            b.left,
            b.top,
            b.right,
            b.bottom,
            d.signature
        );
    }
    Ok(())
}
