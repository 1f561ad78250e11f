//! CSV export of timing records
//!
//! One header row, then one row per completed probe in the order results
//! arrive. Rows are written by a single consumer; analysis happens elsewhere.

use crate::{
    error::{AppError, Result},
    models::TimingRecord,
};
use csv::Writer;
use std::{fs::File, io::Write, path::Path};

/// Column names of the result file
pub const HEADER: [&str; 3] = ["elapsed(μs)", "job", "worker"];

/// Sequential writer for timing records
pub struct ResultCollector<W: Write> {
    writer: Writer<W>,
    rows: u64,
}

/// Create (or truncate) a result file
pub fn create_output_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| AppError::output(format!("failed to open {}: {}", path.display(), e)))
}

impl ResultCollector<File> {
    /// Create (or truncate) the result file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        Self::new(create_output_file(path)?)
    }
}

impl<W: Write> ResultCollector<W> {
    /// Wrap a sink and write the header row
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = Writer::from_writer(sink);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one record
    pub fn record(&mut self, record: &TimingRecord) -> Result<()> {
        self.writer.write_record(&[
            record.elapsed_micros().to_string(),
            record.job.to_string(),
            record.worker.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush everything and hand back the sink
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AppError::output(format!("failed to flush results: {}", e.error())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkerId;
    use std::io;
    use std::time::Duration;

    struct Unwritable;

    impl Write for Unwritable {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(micros: u64, job: u64, worker: usize) -> TimingRecord {
        TimingRecord::new(Duration::from_micros(micros), job, WorkerId(worker))
    }

    #[test]
    fn test_header_and_rows() {
        let mut collector = ResultCollector::new(Vec::new()).unwrap();
        collector.record(&record(1520, 3, 1)).unwrap();
        collector.record(&record(987, 0, 0)).unwrap();
        assert_eq!(collector.rows(), 2);

        let bytes = collector.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "elapsed(μs),job,worker\n1520,3,1\n987,0,0\n");
    }

    #[test]
    fn test_header_only_when_empty() {
        let collector = ResultCollector::new(Vec::new()).unwrap();
        let text = String::from_utf8(collector.finish().unwrap()).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["elapsed(μs),job,worker"]);
    }

    #[test]
    fn test_write_failure_is_output_error() {
        let mut collector = ResultCollector::new(Unwritable).unwrap();
        let _ = collector.record(&record(1, 0, 0));
        let err = collector.finish().err().unwrap();
        assert!(matches!(err, AppError::Output(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut collector = ResultCollector::create(&path).unwrap();
        collector.record(&record(42, 9, 4)).unwrap();
        collector.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("42,9,4"));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        assert!(matches!(ResultCollector::create(&path), Err(AppError::Output(_))));
    }
}
