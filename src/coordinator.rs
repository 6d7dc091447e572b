//! Fans input files out to a worker pool of decode + print jobs

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use graphfmt_core::ConversionStats;
use graphfmt_decoder::{DecodeError, GraphDecoder};
use graphfmt_printer::Printer;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;

/// Why a run stopped early.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("failed to write {}", path.display())]
    Print {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ConvertError {
    /// The file the error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConvertError::Open { path, .. }
            | ConvertError::Create { path, .. }
            | ConvertError::Decode { path, .. }
            | ConvertError::Print { path, .. } => Some(path),
            ConvertError::Pool(_) => None,
        }
    }
}

/// Where converted files go and how the run is executed.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub output_dir: PathBuf,
    pub extension: String,
    pub jobs: usize,
    pub progress: bool,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub converted: usize,
    pub bytes_written: u64,
    /// Stopped by a cancellation request before every file was converted.
    pub cancelled: bool,
}

/// `dir/name.ext` → `<output_dir>/name.<extension>`.
pub fn output_path(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(extension);
    output_dir.join(name)
}

pub struct Coordinator {
    printer: Printer,
    decoder: Box<dyn GraphDecoder>,
    config: CoordinatorConfig,
    stats: Arc<ConversionStats>,
    cancel: Arc<AtomicBool>,
}

impl Coordinator {
    pub fn new(
        printer: Printer,
        decoder: Box<dyn GraphDecoder>,
        config: CoordinatorConfig,
        stats: Arc<ConversionStats>,
    ) -> Self {
        Self {
            printer,
            decoder,
            config,
            stats,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that, once set, stops workers from taking new files.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Convert every input, stopping at the first failure.
    ///
    /// Files already being converted when a failure or cancellation
    /// happens are allowed to finish.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<RunSummary, ConvertError> {
        fs::create_dir_all(&self.config.output_dir).map_err(|source| ConvertError::Create {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let jobs = self.config.jobs.clamp(1, inputs.len().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("graphfmt-worker-{i}"))
            .build()?;

        tracing::info!(
            "Converting {} file(s) with {} worker(s) using the {} decoder",
            inputs.len(),
            jobs,
            self.decoder.name()
        );

        let progress = self.progress_bar(inputs.len());
        let converted = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<ConvertError>> = Mutex::new(None);

        pool.install(|| {
            inputs.par_iter().for_each(|input| {
                if self.cancel.load(Ordering::Relaxed) || failed.load(Ordering::Relaxed) {
                    return;
                }
                match self.convert_file(input) {
                    Ok(bytes) => {
                        self.stats.record_converted(bytes);
                        converted.fetch_add(1, Ordering::Relaxed);
                        progress.inc(1);
                    }
                    Err(err) => {
                        self.stats.record_failed();
                        failed.store(true, Ordering::Relaxed);
                        let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                    }
                }
            });
        });

        let first_error = first_error.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = first_error {
            progress.abandon();
            return Err(err);
        }
        progress.finish_and_clear();

        let converted = converted.into_inner();
        Ok(RunSummary {
            total: inputs.len(),
            converted,
            bytes_written: self.stats.snapshot().bytes_written,
            cancelled: converted < inputs.len(),
        })
    }

    /// Decode one file and print it next to its siblings in the output directory.
    ///
    /// Returns the number of bytes written.
    pub fn convert_file(&self, input: &Path) -> Result<usize, ConvertError> {
        let output = output_path(input, &self.config.output_dir, &self.config.extension);
        tracing::debug!("Converting {} -> {}", input.display(), output.display());

        let file = File::open(input).map_err(|source| ConvertError::Open {
            path: input.to_path_buf(),
            source,
        })?;
        let graph = self
            .decoder
            .decode(&mut BufReader::new(file))
            .map_err(|source| ConvertError::Decode {
                path: input.to_path_buf(),
                source,
            })?;

        let sink = File::create(&output).map_err(|source| ConvertError::Create {
            path: output.clone(),
            source,
        })?;
        let bytes = self
            .printer
            .print(BufWriter::new(sink), &graph)
            .map_err(|source| ConvertError::Print { path: output, source })?;

        tracing::debug!(
            "Converted {} ({} nodes, {} edges, {} bytes)",
            input.display(),
            graph.node_count(),
            graph.edge_count(),
            bytes
        );
        Ok(bytes)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("█▓▒░  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("converting");
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfmt_decoder::{get_decoder, DecodeErrorKind, DecoderKind};

    const TRIANGLE: &str = r#"<graph>
        <node id="1"><cost>1.5</cost></node>
        <node id="2"><cost>0.2</cost></node>
        <node id="3"><cost>4</cost></node>
        <edge><source>1</source><target>2</target><cost>0.3</cost></edge>
        <edge><source>1</source><target>3</target></edge>
        <edge directed="yes"><source>2</source><target>3</target></edge>
    </graph>"#;

    fn coordinator(output_dir: &Path, format: &str, jobs: usize) -> Coordinator {
        Coordinator::new(
            Printer::parse(format).unwrap(),
            get_decoder(DecoderKind::Streaming),
            CoordinatorConfig {
                output_dir: output_dir.to_path_buf(),
                extension: "in".to_string(),
                jobs,
                progress: false,
            },
            Arc::new(ConversionStats::new(0)),
        )
    }

    fn write_inputs(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("graph{i}.xml"));
                fs::write(&path, TRIANGLE).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_output_path() {
        let out = Path::new("out");
        assert_eq!(output_path(Path::new("data/g1.xml"), out, "in"), PathBuf::from("out/g1.in"));
        assert_eq!(output_path(Path::new("g.tar.xml"), out, "in"), PathBuf::from("out/g.tar.in"));
        assert_eq!(output_path(Path::new("plain"), out, "txt"), PathBuf::from("out/plain.txt"));
        assert_eq!(output_path(Path::new(".hidden"), out, "in"), PathBuf::from("out/.hidden.in"));
    }

    #[test]
    fn test_converts_all_files() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let nested = output_dir.path().join("a/b");
        let inputs = write_inputs(input_dir.path(), 5);

        let coordinator = coordinator(&nested, "%n %m\n%M\n", 3);
        let summary = coordinator.run(&inputs).unwrap();
        assert_eq!(summary.converted, 5);
        assert!(!summary.cancelled);

        for i in 0..5 {
            let text = fs::read_to_string(nested.join(format!("graph{i}.in"))).unwrap();
            assert_eq!(text, "3 3\n1 2\n1 3\n2 3\n");
        }
        assert_eq!(summary.bytes_written, 5 * "3 3\n1 2\n1 3\n2 3\n".len() as u64);
    }

    #[test]
    fn test_first_failure_is_reported() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let bad = input_dir.path().join("bad.xml");
        fs::write(&bad, "<graph><edge><source>1</source></edge></graph>").unwrap();

        let err = coordinator(output_dir.path(), "%n", 1).run(&[bad.clone()]).unwrap_err();
        assert_eq!(err.path(), Some(bad.as_path()));
        match err {
            ConvertError::Decode { source, .. } => {
                assert_eq!(source.kind(), DecodeErrorKind::MissingRequiredField)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_input() {
        let output_dir = tempfile::tempdir().unwrap();
        let missing = output_dir.path().join("missing.xml");
        let err = coordinator(output_dir.path(), "%n", 2).run(&[missing]).unwrap_err();
        assert!(matches!(err, ConvertError::Open { .. }), "{err}");
    }

    #[test]
    fn test_cancelled_run_takes_no_files() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let inputs = write_inputs(input_dir.path(), 4);

        let coordinator = coordinator(output_dir.path(), "%n", 2);
        coordinator.cancel_flag().store(true, Ordering::SeqCst);
        let summary = coordinator.run(&inputs).unwrap();
        assert_eq!(summary.converted, 0);
        assert!(summary.cancelled);
        assert!(!output_dir.path().join("graph0.in").exists());
    }

    #[test]
    fn test_empty_input_list() {
        let output_dir = tempfile::tempdir().unwrap();
        let summary = coordinator(output_dir.path(), "%n", 4).run(&[]).unwrap();
        assert_eq!(summary.total, 0);
        assert!(!summary.cancelled);
    }
}
