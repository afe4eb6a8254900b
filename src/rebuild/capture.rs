use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("output stream unreadable")]
    Unreadable(#[source] io::Error),
}

/// Output collected from a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub bytes: Vec<u8>,
    /// More output followed than the cap allowed.
    pub truncated: bool,
    /// A read failed after some output had already arrived.
    pub partial: bool,
}

impl CapturedOutput {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.truncated && !self.partial
    }

    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Read `source` to end of stream, starting with `initial` bytes of buffer
/// and doubling up to `cap`.
///
/// Hitting the cap is not an error: the first `cap` bytes are returned with
/// `truncated` set. Only a failure on the very first read is an error; later
/// failures keep what was read and set `partial`.
pub fn read_bounded<R: Read + ?Sized>(
    source: &mut R,
    initial: usize,
    cap: usize,
) -> Result<CapturedOutput, CaptureError> {
    let mut capacity = initial.clamp(1, cap.max(1));
    let mut buf = vec![0u8; capacity];
    let mut filled = 0;
    let mut reads = 0usize;
    let mut output = CapturedOutput::default();

    loop {
        if filled == capacity {
            if capacity >= cap {
                match has_more(source) {
                    Ok(more) => output.truncated = more,
                    Err(e) => {
                        log::warn!("Output read failed after {} bytes: {}", filled, e);
                        output.partial = true;
                    }
                }
                break;
            }
            capacity = capacity.saturating_mul(2).min(cap);
            buf.resize(capacity, 0);
        }

        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                reads += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if reads == 0 => return Err(CaptureError::Unreadable(e)),
            Err(e) => {
                log::warn!("Output read failed after {} bytes: {}", filled, e);
                output.partial = true;
                break;
            }
        }
    }

    buf.truncate(filled);
    output.bytes = buf;
    Ok(output)
}

/// Probe for one byte past the cap. The byte is dropped.
fn has_more<R: Read + ?Sized>(source: &mut R) -> io::Result<bool> {
    let mut probe = [0u8; 1];
    loop {
        match source.read(&mut probe) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
