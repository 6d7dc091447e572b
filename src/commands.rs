//! CLI command implementations

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use graphfmt_core::ConversionStats;
use graphfmt_decoder::get_decoder;
use graphfmt_printer::{CompiledTemplate, Printer, TemplateError};
use graphfmt_server::DiagnosticsServer;
use tokio::sync::oneshot;

use crate::config::ConvertSettings;
use crate::coordinator::{Coordinator, CoordinatorConfig, RunSummary};

/// Printed after a template error.
pub const FORMAT_HELP: &str = "\
Format directives:
  %%            a literal percent sign
  %n            number of nodes
  %m            number of edges
  %a            adjacency matrix, one row per line
  %[cost]w      node costs on a single line
  %[cost]N      node list, one `id [cost]` per line
  %[cost]M      edge list, one `source target [cost]` per line

A cost function is an optional ratio followed by an optional rounding mode:
  X  no rounding (default)    F  round down
  R  round to nearest         C  round up
e.g. `%.5RN` lists nodes with half their cost, rounded. Without a cost
function N and M omit the cost column and w prints costs unchanged.
";

pub async fn convert(settings: ConvertSettings, inputs: Vec<PathBuf>) -> anyhow::Result<()> {
    if inputs.is_empty() {
        tracing::info!("No input files given, nothing to do");
        return Ok(());
    }

    let printer = Printer::parse(&settings.format).map_err(template_error)?;
    let stats = Arc::new(ConversionStats::new(inputs.len()));
    let coordinator = Arc::new(Coordinator::new(
        printer,
        get_decoder(settings.decoder),
        CoordinatorConfig {
            output_dir: settings.output_dir.clone(),
            extension: settings.extension.clone(),
            jobs: settings.jobs,
            progress: settings.progress,
        },
        Arc::clone(&stats),
    ));
    let cancel = coordinator.cancel_flag();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let diagnostics = match settings.diagnostics {
        Some(addr) => match DiagnosticsServer::bind(addr, Arc::clone(&stats)).await {
            Ok(server) => Some(tokio::spawn(server.serve(async move {
                stop_rx.await.ok();
            }))),
            Err(e) => {
                tracing::warn!("Diagnostics endpoint disabled, cannot bind {}: {}", addr, e);
                None
            }
        },
        None => None,
    };

    let mut worker = tokio::task::spawn_blocking({
        let coordinator = Arc::clone(&coordinator);
        move || coordinator.run(&inputs)
    });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = shutdown_signal() => {
            tracing::warn!("Cancellation requested, finishing files in progress");
            cancel.store(true, Ordering::SeqCst);
            (&mut worker).await
        }
    };

    let _ = stop_tx.send(());
    if let Some(handle) = diagnostics {
        match handle.await {
            Ok(Err(e)) => tracing::warn!("Diagnostics endpoint failed: {}", e),
            Err(e) => tracing::warn!("Diagnostics task join error: {}", e),
            Ok(Ok(())) => {}
        }
    }

    let outcome = joined.map_err(|e| anyhow::anyhow!("Conversion task join error: {}", e))?;
    match outcome {
        Ok(summary) => {
            report(&summary, &settings);
            Ok(())
        }
        Err(err) => {
            tracing::error!("Conversion stopped: {}", err);
            Err(err.into())
        }
    }
}

fn report(summary: &RunSummary, settings: &ConvertSettings) {
    if summary.cancelled {
        tracing::warn!(
            "Cancelled after converting {} of {} file(s)",
            summary.converted,
            summary.total
        );
    } else {
        tracing::info!(
            "Converted {} file(s) into {} ({} bytes)",
            summary.converted,
            settings.output_dir.display(),
            summary.bytes_written
        );
    }
}

/// Compile `format` and print one line per directive.
pub fn check(format: &str) -> anyhow::Result<()> {
    let template = CompiledTemplate::compile(format).map_err(template_error)?;
    for directive in template.directives() {
        println!("{directive}");
    }
    Ok(())
}

/// Print the compile error followed by the directive reference.
fn template_error(err: TemplateError) -> anyhow::Error {
    eprintln!("{err}\n\n{FORMAT_HELP}");
    anyhow::anyhow!("Invalid format string: {}", err.explanation())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

