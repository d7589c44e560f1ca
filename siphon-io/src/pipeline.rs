//! The streaming conversion pipeline
//!
//! One run walks `Init → OpenSource → Streaming → Flushing → Persisting →
//! Done`, failing over to cleanup from any state. Decoding runs on its own
//! worker thread and feeds the write side through a bounded channel;
//! encoding, staging writes, and the record counter all live on the pull
//! side, so the counter needs no synchronization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::sync_channel;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use siphon_codec::{AnnotationPolicy, Encoder, RecordStream};
use siphon_format::{Charset, Result, SiphonError, Value};

use crate::config::ConvertOptions;
use crate::metrics::{MetricsSink, RECORDS_COUNTER};
use crate::source::SourceResolver;
use crate::staging::StagingFile;
use crate::storage::StorageSink;
use crate::{ConvertRequest, ConvertSummary};

/// Shared cancellation signal for one run.
///
/// Raising it stops further reads and writes, discards the staged partial
/// file, and fails the run with [`SiphonError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, unraised token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancellation signal.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Execute one conversion run.
pub(crate) fn execute(request: ConvertRequest<'_>) -> Result<ConvertSummary> {
    let ConvertRequest {
        options,
        resolver,
        storage,
        metrics,
        cancel,
    } = request;

    // Init: validate everything before any I/O
    options.validate()?;
    if cancel.is_cancelled() {
        return Err(SiphonError::Cancelled);
    }
    let charset = Charset::from_name(&options.charset)?;
    let policy = AnnotationPolicy::from_keep_flag(options.keep_annotations);
    let mut encoder = Encoder::new(options.target_format, &options.encode_options())?;

    debug!(
        from = %options.from,
        source = options.source_format.name(),
        target = options.target_format.name(),
        charset = charset.name(),
        "starting conversion"
    );

    // OpenSource
    let source = resolver.open(&options.from)?;

    // Streaming: decode worker feeds the write side through a bounded queue
    let mut staging = StagingFile::create(options.staging_dir.as_deref())?;
    let (tx, rx) = sync_channel::<Result<Value>>(options.queue_capacity);

    let decode_cancel = cancel.clone();
    let source_format = options.source_format;
    let limits = options.limits.clone();
    let decoder = thread::Builder::new()
        .name("siphon-decode".to_string())
        .spawn(move || {
            let stream = RecordStream::open(source_format, source, limits);
            for record in stream {
                if decode_cancel.is_cancelled() {
                    return;
                }
                let failed = record.is_err();
                let record = record.map(|value| policy.apply(value));
                if tx.send(record).is_err() {
                    // The write side stopped; its error is the primary one.
                    return;
                }
                if failed {
                    return;
                }
            }
        })?;

    let mut records = 0u64;
    let mut failure: Option<SiphonError> = None;
    for item in rx.iter() {
        if cancel.is_cancelled() {
            failure = Some(SiphonError::Cancelled);
            break;
        }
        match item {
            Ok(value) => match append_record(&mut encoder, &charset, &mut staging, &value, records)
            {
                Ok(()) => records += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            },
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    // A cancellation raised while the queue was draining still aborts the run.
    if failure.is_none() && cancel.is_cancelled() {
        failure = Some(SiphonError::Cancelled);
    }

    if let Some(error) = failure {
        // Dropping the receiver unblocks the decode side; dropping the
        // staging file removes the partial output.
        drop(rx);
        let _ = decoder.join();
        warn!(
            records_converted = records,
            error = %error,
            "conversion failed, discarding staged output"
        );
        return Err(error);
    }

    decoder
        .join()
        .map_err(|_| SiphonError::Io(std::io::Error::other("decode worker panicked")))?;

    // Flushing: trailer, then durably flush the staged file
    if let Some(trailer) = encoder.finish()? {
        let encoded = charset.encode(&trailer).map_err(|e| e.at_record(records))?;
        staging.append(&encoded)?;
    }
    staging.close()?;

    // Persisting: hand off to durable storage, then report the metric
    let bytes_staged = staging.bytes_written();
    let staged = staging.into_temp_path()?;
    let output = storage.persist(&staged)?;
    drop(staged);

    metrics.record(RECORDS_COUNTER, records);
    info!(records, bytes_staged, output = %output, "conversion complete");

    Ok(ConvertSummary {
        output,
        records,
        bytes_staged,
    })
}

/// Encode one record, transcode it to the output charset, and append it to
/// the staging file. The running count is only advanced by the caller after
/// this returns success.
fn append_record(
    encoder: &mut Encoder,
    charset: &Charset,
    staging: &mut StagingFile,
    value: &Value,
    record_index: u64,
) -> Result<()> {
    let chunk = encoder.encode(value, record_index)?;
    let encoded = charset
        .encode(&chunk)
        .map_err(|e| e.at_record(record_index))?;
    staging.append(&encoded)?;
    Ok(())
}
