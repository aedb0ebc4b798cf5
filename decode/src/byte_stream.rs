use std::io::{ErrorKind, Read};

use common::{FormatError, NalUnit};
use log::{debug, trace};

use crate::errors::DecodingError;

/// Bounds and read granularity of a `ByteStream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteStreamConfig {
    max_unit_size: usize,
    read_chunk_size: usize,
}

impl ByteStreamConfig {
    pub const DEFAULT_MAX_UNIT_SIZE: usize = 512 * 1024;
    pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

    pub fn new(max_unit_size: usize, read_chunk_size: usize) -> Result<Self, DecodingError> {
        if max_unit_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "max_unit_size must be greater than zero".to_string(),
            ));
        }
        if read_chunk_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            max_unit_size,
            read_chunk_size,
        })
    }

    pub fn max_unit_size(&self) -> usize {
        self.max_unit_size
    }

    pub fn read_chunk_size(&self) -> usize {
        self.read_chunk_size
    }
}

impl Default for ByteStreamConfig {
    fn default() -> Self {
        Self {
            max_unit_size: Self::DEFAULT_MAX_UNIT_SIZE,
            read_chunk_size: Self::DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// `ByteStream` is an encapsulation of a NAL unit stream containing `START_CODE_PREFIX` and `NalUnit`.
///
/// Units are pulled one at a time from the underlying reader. Each returned unit owns its bytes, so
/// the internal buffer only holds the unit currently being delimited, its zero padding and one
/// read chunk.
pub struct ByteStream<R> {
    reader: R,
    config: ByteStreamConfig,
    buffer: Vec<u8>,

    /// first byte of the unit being delimited.
    unit_start: usize,

    /// scanning resumes here; everything in `unit_start..scan_from` is known not to begin a
    /// `START_CODE_PREFIX`.
    scan_from: usize,

    end_of_input: bool,
    finished: bool,
}

impl<R: Read> ByteStream<R> {
    /// `reader` must yield an ordered stream of bytes consisting of a sequence of byte stream
    /// `NalUnit` syntax structures.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ByteStreamConfig::default())
    }

    pub fn with_config(reader: R, config: ByteStreamConfig) -> Self {
        Self {
            reader,
            config,
            buffer: Vec::new(),
            unit_start: 0,
            scan_from: 0,
            end_of_input: false,
            finished: false,
        }
    }

    pub fn config(&self) -> &ByteStreamConfig {
        &self.config
    }

    /// Returns the next unit with its start code removed, or `None` once the stream is exhausted.
    ///
    /// I/O failures and oversized units end the stream: every later call returns `Ok(None)`.
    /// Zero bytes ahead of a start code are dropped as `trailing_zero_8bits`; the final unit of the
    /// stream is returned as it stands.
    pub fn next_unit(&mut self) -> Result<Option<Vec<u8>>, DecodingError> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if let Some(prefix_at) = find_start_code_prefix(&self.buffer[self.scan_from..]) {
                let prefix_at = self.scan_from + prefix_at;
                let unit = trim_trailing_zero_bytes(&self.buffer[self.unit_start..prefix_at]);
                let unit = unit.to_vec();

                self.unit_start = prefix_at + NalUnit::START_CODE_PREFIX.len();
                self.scan_from = self.unit_start;

                // adjacent start codes delimit nothing.
                if unit.is_empty() {
                    continue;
                }
                if unit.len() > self.config.max_unit_size {
                    return Err(self.unit_too_large());
                }

                debug!("delimited NAL unit of {} bytes", unit.len());
                return Ok(Some(unit));
            }

            // the last two bytes may be the beginning of a prefix split across reads.
            self.scan_from = self
                .unit_start
                .max(self.buffer.len().saturating_sub(NalUnit::START_CODE_PREFIX.len() - 1));

            if self.end_of_input {
                let pending = &self.buffer[self.unit_start..];
                // a zero-only tail is padding; any other tail is the last unit, zero bytes included.
                let unit = match pending.iter().all(|&b| b == 0x00) {
                    true => vec![],
                    false => pending.to_vec(),
                };
                if unit.len() > self.config.max_unit_size {
                    return Err(self.unit_too_large());
                }
                self.finish();

                if unit.is_empty() {
                    return Ok(None);
                }

                debug!("delimited final NAL unit of {} bytes", unit.len());
                return Ok(Some(unit));
            }

            // bytes that belong to the current unit whatever is read next. Zero bytes at the end
            // may still be `trailing_zero_8bits`; up to `max_unit_size` of them are buffered
            // without counting against the unit.
            let pending = &self.buffer[self.unit_start..self.scan_from];
            if trim_trailing_zero_bytes(pending).len() > self.config.max_unit_size
                || pending.len() > self.config.max_unit_size.saturating_mul(2)
            {
                return Err(self.unit_too_large());
            }

            if let Err(err) = self.fill() {
                self.finish();
                return Err(err.into());
            }
        }
    }

    /// Like `next_unit`, with the NAL unit header parsed.
    ///
    /// A unit with an invalid header is reported as an error but does not end the stream; the next
    /// call resumes at the following start code.
    pub fn next_nal_unit(&mut self) -> Result<Option<NalUnit>, DecodingError> {
        let Some(unit) = self.next_unit()? else {
            return Ok(None);
        };

        Ok(Some(NalUnit::parse(&unit)?))
    }

    fn fill(&mut self) -> std::io::Result<()> {
        if self.unit_start > 0 {
            self.buffer.drain(..self.unit_start);
            self.scan_from -= self.unit_start;
            self.unit_start = 0;
        }

        let filled = self.buffer.len();
        self.buffer.resize(filled + self.config.read_chunk_size, 0);

        let read = loop {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(read) => break read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buffer.truncate(filled);
                    return Err(err);
                }
            }
        };

        self.buffer.truncate(filled + read);
        if read == 0 {
            self.end_of_input = true;
        }

        trace!("read {read} bytes, {} bytes buffered", self.buffer.len());
        Ok(())
    }

    fn unit_too_large(&mut self) -> DecodingError {
        self.finish();
        FormatError::UnitTooLarge {
            max_unit_size: self.config.max_unit_size,
        }
        .into()
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffer = Vec::new();
        self.unit_start = 0;
        self.scan_from = 0;
    }
}

impl<R: Read> Iterator for ByteStream<R> {
    type Item = Result<NalUnit, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_nal_unit().transpose()
    }
}

/// Index of the first `0x000001` in `data`.
fn find_start_code_prefix(data: &[u8]) -> Option<usize> {
    data.windows(NalUnit::START_CODE_PREFIX.len())
        .position(|w| w == NalUnit::START_CODE_PREFIX)
}

/// Drops the `zero_byte` of a four byte start code and any `trailing_zero_8bits`.
fn trim_trailing_zero_bytes(unit: &[u8]) -> &[u8] {
    let end = unit.iter().rposition(|&b| b != 0x00).map_or(0, |last| last + 1);
    &unit[..end]
}
