//! Batch conversion pipeline
//!
//! Runs one conversion job over an ordered file list: detect the source
//! encoding, gate on confidence, re-encode, and account per-file success
//! and failure. Strictly sequential; an individual file's failure never
//! aborts the batch.

use crate::detect::{CharsetDetector, DetectionOutcome};
use crate::display;
use crate::encoding::EncodingSpec;
use crate::validate;
use crate::{ConvError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Detected source encodings below this confidence are not trusted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.6;

/// One file accepted into a batch.
///
/// `real_path` is used for all I/O; `display_path` is derived once at
/// ingestion and is purely cosmetic.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub real_path: PathBuf,
    pub display_path: String,
}

impl FileEntry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let real_path = path.into();
        let display_path = display::abbreviate(&real_path, display::DEFAULT_KEEP_LEVELS, true);
        Self {
            real_path,
            display_path,
        }
    }

    /// Basename for log lines, falling back to the full path when the path
    /// has no filename component.
    fn file_name(&self) -> String {
        self.real_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.real_path.display().to_string())
    }
}

/// Immutable snapshot of one conversion invocation.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Files to convert, in processing order.
    pub files: Vec<FileEntry>,
    /// Encoding every output is written in.
    pub target: EncodingSpec,
    /// Destination directory, or None for in-place overwrite.
    pub dest_dir: Option<PathBuf>,
}

/// Final accounting for one job.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub total: usize,
    pub succeeded: usize,
    /// One line per skipped or failed file, in processing order.
    pub log: Vec<String>,
}

/// The conversion pipeline. Holds the process-wide busy flag: while a job
/// runs, further jobs and detection queries are refused.
pub struct BatchConverter<D> {
    detector: D,
    busy: Mutex<()>,
}

impl<D: CharsetDetector> BatchConverter<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            busy: Mutex::new(()),
        }
    }

    /// Detect the encoding of a single file on behalf of the host.
    ///
    /// Refused while a job holds the busy flag; detection mid-batch would
    /// contend for the same file handles and report stale results.
    pub fn inspect(&self, path: &Path) -> Result<Option<DetectionOutcome>> {
        let _guard = self.busy.try_lock().ok_or(ConvError::Busy)?;
        self.detector.detect(path)
    }

    /// Run one job to completion.
    ///
    /// `progress` receives `(0, total)` up front and `(succeeded, total)`
    /// after every successful write. Per-file failures are absorbed into
    /// the report; `Err` is returned only for pre-flight refusals (busy,
    /// duplicate output names).
    pub fn convert(
        &self,
        job: &ConversionJob,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ConversionReport> {
        // RAII guard: the busy flag drops back to idle on every exit path.
        let _guard = self.busy.try_lock().ok_or(ConvError::Busy)?;

        if job.dest_dir.is_some() {
            let paths: Vec<&Path> = job.files.iter().map(|f| f.real_path.as_path()).collect();
            let duplicates = validate::find_duplicate_basenames(&paths);
            if !duplicates.is_empty() {
                return Err(ConvError::DuplicateNames(
                    duplicates.keys().cloned().collect(),
                ));
            }
        }

        let total = job.files.len();
        let mut report = ConversionReport {
            total,
            ..Default::default()
        };
        progress(0, total);

        for entry in &job.files {
            // The file may have vanished since ingestion; not worth a log line.
            if !entry.real_path.exists() {
                tracing::debug!("skipping missing file: {}", entry.real_path.display());
                continue;
            }

            let name = entry.file_name();
            let outcome = match self.detector.detect(&entry.real_path) {
                Ok(Some(outcome)) => outcome,
                Ok(None) => {
                    report.log.push(format!("{name}: detection failed"));
                    continue;
                }
                Err(e) => {
                    tracing::warn!("detector error on {}: {e}", entry.display_path);
                    report.log.push(format!("{name}: detection failed"));
                    continue;
                }
            };

            if outcome.confidence < CONFIDENCE_THRESHOLD {
                report.log.push(format!(
                    "{name}: detection confidence too low ({:.2}: {})",
                    outcome.confidence, outcome.name
                ));
                continue;
            }

            match self.convert_one(entry, &outcome, job) {
                Ok(()) => {
                    report.succeeded += 1;
                    progress(report.succeeded, total);
                }
                Err(e) => {
                    tracing::warn!("conversion failed for {}: {e}", entry.display_path);
                    report.log.push(format!("{name}: {e}"));
                }
            }
        }

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            "batch finished"
        );
        Ok(report)
    }

    fn convert_one(
        &self,
        entry: &FileEntry,
        outcome: &DetectionOutcome,
        job: &ConversionJob,
    ) -> Result<()> {
        let bytes = std::fs::read(&entry.real_path)?;
        let text = outcome.encoding.decode(&bytes);

        let dest = match &job.dest_dir {
            Some(dir) => {
                let name = entry.real_path.file_name().ok_or_else(|| {
                    ConvError::InvalidPath(entry.real_path.display().to_string())
                })?;
                dir.join(name)
            }
            None => entry.real_path.clone(),
        };

        let encoded = job.target.encode(&text)?;
        std::fs::write(&dest, encoded)?;

        tracing::debug!(
            "converted {} ({} -> {})",
            entry.display_path,
            outcome.name,
            job.target.name()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectedEncoding;
    use crate::ChardetngDetector;
    use std::collections::HashMap;
    use std::fs;

    /// Detector returning the same fixed outcome for every file.
    struct FixedDetector {
        confidence: f32,
    }

    impl CharsetDetector for FixedDetector {
        fn detect(&self, _path: &Path) -> Result<Option<DetectionOutcome>> {
            Ok(Some(DetectionOutcome {
                encoding: DetectedEncoding::Known(EncodingSpec::Utf8),
                name: "UTF-8".to_string(),
                confidence: self.confidence,
            }))
        }
    }

    /// Detector with per-basename outcomes; unknown files detect as nothing.
    struct MapDetector {
        outcomes: HashMap<String, Option<DetectionOutcome>>,
    }

    impl CharsetDetector for MapDetector {
        fn detect(&self, path: &Path) -> Result<Option<DetectionOutcome>> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            Ok(self.outcomes.get(&name).cloned().flatten())
        }
    }

    fn outcome(spec: EncodingSpec, confidence: f32) -> DetectionOutcome {
        DetectionOutcome {
            name: spec.name().to_string(),
            encoding: DetectedEncoding::Known(spec),
            confidence,
        }
    }

    fn in_place_job(files: Vec<FileEntry>, target: EncodingSpec) -> ConversionJob {
        ConversionJob {
            files,
            target,
            dest_dir: None,
        }
    }

    #[test]
    fn test_confidence_boundary_is_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();

        let accepted = BatchConverter::new(FixedDetector { confidence: 0.6 });
        let report = accepted
            .convert(
                &in_place_job(vec![FileEntry::new(&file)], EncodingSpec::Utf8),
                |_, _| {},
            )
            .unwrap();
        assert_eq!(report.succeeded, 1);
        assert!(report.log.is_empty());

        let rejected = BatchConverter::new(FixedDetector { confidence: 0.599 });
        let report = rejected
            .convert(
                &in_place_job(vec![FileEntry::new(&file)], EncodingSpec::Utf8),
                |_, _| {},
            )
            .unwrap();
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.log.len(), 1);
        assert!(report.log[0].contains("confidence too low"));
        assert!(report.log[0].contains("UTF-8"));
    }

    #[test]
    fn test_end_to_end_mixed_batch() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.txt");
        let murky = dir.path().join("murky.txt");
        let korean = dir.path().join("korean.txt");

        fs::write(&murky, b"\x80\x81\x82").unwrap();
        let (euc_kr, _, _) = encoding_rs::EUC_KR.encode("안녕하세요");
        fs::write(&korean, &euc_kr).unwrap();

        let mut outcomes = HashMap::new();
        outcomes.insert(
            "murky.txt".to_string(),
            Some(outcome(EncodingSpec::EucKr, 0.4)),
        );
        outcomes.insert(
            "korean.txt".to_string(),
            Some(outcome(EncodingSpec::EucKr, 0.95)),
        );

        let converter = BatchConverter::new(MapDetector { outcomes });
        let job = in_place_job(
            vec![
                FileEntry::new(&missing),
                FileEntry::new(&murky),
                FileEntry::new(&korean),
            ],
            EncodingSpec::Utf8,
        );

        let report = converter.convert(&job, |_, _| {}).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        // The missing file is silent; only the low-confidence file logs.
        assert_eq!(report.log.len(), 1);
        assert!(report.log[0].starts_with("murky.txt"));

        assert_eq!(fs::read(&korean).unwrap(), "안녕하세요".as_bytes());
    }

    #[test]
    fn test_duplicate_basenames_refuse_job_before_writes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let out = dir.path().join("out");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(a.join("x.txt"), "one").unwrap();
        fs::write(b.join("x.txt"), "two").unwrap();

        let converter = BatchConverter::new(FixedDetector { confidence: 1.0 });
        let job = ConversionJob {
            files: vec![
                FileEntry::new(a.join("x.txt")),
                FileEntry::new(b.join("x.txt")),
            ],
            target: EncodingSpec::Utf8,
            dest_dir: Some(out.clone()),
        };

        let err = converter.convert(&job, |_, _| {}).unwrap_err();
        match err {
            ConvError::DuplicateNames(names) => assert_eq!(names, vec!["x.txt"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_save_to_directory_keeps_sources() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(&src, "plain ascii").unwrap();

        let converter = BatchConverter::new(FixedDetector { confidence: 1.0 });
        let job = ConversionJob {
            files: vec![FileEntry::new(&src)],
            target: EncodingSpec::Utf8Bom,
            dest_dir: Some(out.clone()),
        };

        let report = converter.convert(&job, |_, _| {}).unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(fs::read(&src).unwrap(), b"plain ascii");
        assert_eq!(
            fs::read(out.join("src.txt")).unwrap(),
            [&[0xEF, 0xBB, 0xBF], b"plain ascii".as_slice()].concat()
        );
    }

    #[test]
    fn test_utf16le_in_place_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("u16.txt");
        let bytes = EncodingSpec::Utf16Le.encode("signed text\n").unwrap();
        fs::write(&file, &bytes).unwrap();

        let converter = BatchConverter::new(ChardetngDetector::new());
        let report = converter
            .convert(
                &in_place_job(vec![FileEntry::new(&file)], EncodingSpec::Utf16Le),
                |_, _| {},
            )
            .unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(fs::read(&file).unwrap(), bytes);
    }

    #[test]
    fn test_progress_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let converter = BatchConverter::new(FixedDetector { confidence: 1.0 });
        let mut ticks = Vec::new();
        converter
            .convert(
                &in_place_job(
                    vec![FileEntry::new(&a), FileEntry::new(&b)],
                    EncodingSpec::Utf8,
                ),
                |done, total| ticks.push((done, total)),
            )
            .unwrap();
        assert_eq!(ticks, vec![(0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_inspect_refused_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let converter = BatchConverter::new(FixedDetector { confidence: 1.0 });
        let mut refused = false;
        converter
            .convert(
                &in_place_job(vec![FileEntry::new(&file)], EncodingSpec::Utf8),
                |_, _| {
                    refused = matches!(converter.inspect(&file), Err(ConvError::Busy));
                },
            )
            .unwrap();
        assert!(refused);

        // Released after the job: the query works again.
        assert!(converter.inspect(&file).is_ok());
    }

    #[test]
    fn test_succeeded_never_exceeds_total() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.txt");
        fs::write(&real, "x").unwrap();

        let converter = BatchConverter::new(FixedDetector { confidence: 1.0 });
        let report = converter
            .convert(
                &in_place_job(
                    vec![
                        FileEntry::new(dir.path().join("phantom.txt")),
                        FileEntry::new(&real),
                    ],
                    EncodingSpec::Utf8,
                ),
                |_, _| {},
            )
            .unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 1);
        assert!(report.succeeded <= report.total);
    }
}
