//! Binary format deserialization for HIRQLOG and HIRQUSR captures.
//!
//! Parses the compact binary data emitted over serial by the IRQ benchmark.
//! The serial stream may contain text output before the binary data.
//!
//! # Format (all little-endian)
//!
//! ```text
//! HIRQLOG (kernel tracepoint log):
//!   magic: b"HIRQLOG\x01" (8B), entry_count: u32, reserved: u32
//!   entry_count x { key: u32, data: u64 }
//!   magic: b"HIRQEND\x01" (8B)
//!
//! HIRQUSR (user-level runs):
//!   magic: b"HIRQUSR\x01" (8B), n_runs: u32, reserved: u32
//!   overheads: [u64; n_runs], thread: [u64; n_runs], process: [u64; n_runs]
//!   magic: b"HIRQEND\x01" (8B)
//! ```

use anyhow::{Context, Result, bail};
use irqbench_reduce::{Sample, TagId, UserRuns};

/// HIRQLOG header magic.
const HIRQLOG_MAGIC: &[u8; 8] = b"HIRQLOG\x01";
/// HIRQUSR header magic.
const HIRQUSR_MAGIC: &[u8; 8] = b"HIRQUSR\x01";
/// Footer magic shared by both formats.
const HIRQEND_MAGIC: &[u8; 8] = b"HIRQEND\x01";

/// Size of one HIRQLOG entry.
const LOG_ENTRY_SIZE: usize = 12;

/// Parse a HIRQLOG kernel tracepoint log into samples, in capture order.
pub fn parse_kernel_log(data: &[u8]) -> Result<Vec<Sample>> {
    let header_pos = find_magic(data, HIRQLOG_MAGIC)
        .ok_or_else(|| anyhow::anyhow!("HIRQLOG header magic not found in serial data"))?;
    let mut reader = Reader::new(data, header_pos + HIRQLOG_MAGIC.len());

    let entry_count = reader.read_u32("HIRQLOG header")? as usize;
    let _reserved = reader.read_u32("HIRQLOG header")?;

    if reader.remaining() < entry_count.saturating_mul(LOG_ENTRY_SIZE) {
        bail!("HIRQLOG log truncated ({entry_count} entries declared)");
    }
    let mut samples = Vec::with_capacity(entry_count);
    for index in 0..entry_count {
        let key = reader.read_u32("HIRQLOG entry key")?;
        let value = reader.read_u64("HIRQLOG entry data")?;
        let tag = u16::try_from(key)
            .with_context(|| format!("HIRQLOG entry {index} has out-of-range key {key}"))?;
        samples.push(Sample::new(TagId(tag), value));
    }

    reader.expect_magic(HIRQEND_MAGIC, "HIRQLOG footer")?;
    Ok(samples)
}

/// Parse HIRQUSR user-level runs.
pub fn parse_user_runs(data: &[u8]) -> Result<UserRuns> {
    let header_pos = find_magic(data, HIRQUSR_MAGIC)
        .ok_or_else(|| anyhow::anyhow!("HIRQUSR header magic not found in serial data"))?;
    let mut reader = Reader::new(data, header_pos + HIRQUSR_MAGIC.len());

    let n_runs = reader.read_u32("HIRQUSR header")? as usize;
    let _reserved = reader.read_u32("HIRQUSR header")?;

    if reader.remaining() < n_runs.saturating_mul(3 * 8) {
        bail!("HIRQUSR runs truncated ({n_runs} runs declared)");
    }
    let overheads = reader.read_u64_array(n_runs, "HIRQUSR overheads")?;
    let thread = reader.read_u64_array(n_runs, "HIRQUSR thread results")?;
    let process = reader.read_u64_array(n_runs, "HIRQUSR process results")?;

    reader.expect_magic(HIRQEND_MAGIC, "HIRQUSR footer")?;
    Ok(UserRuns {
        overheads,
        thread,
        process,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Find the position of a magic byte sequence in data.
fn find_magic(data: &[u8], magic: &[u8]) -> Option<usize> {
    data.windows(magic.len()).position(|w| w == magic)
}

/// Bounds-checked little-endian cursor over serial data.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let Some(bytes) = self
            .data
            .get(self.pos..)
            .and_then(|rest| rest.first_chunk::<N>())
        else {
            bail!("{what} truncated");
        };
        self.pos += N;
        Ok(*bytes)
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(what)?))
    }

    fn read_u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(what)?))
    }

    fn read_u64_array(&mut self, count: usize, what: &str) -> Result<Vec<u64>> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_u64(what)?);
        }
        Ok(values)
    }

    fn expect_magic(&mut self, magic: &[u8; 8], what: &str) -> Result<()> {
        if &self.take::<8>(what)? != magic {
            bail!("{what} magic mismatch");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a HIRQLOG capture.
    fn encode_kernel_log(entries: &[(u32, u64)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(HIRQLOG_MAGIC);
        data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // reserved
        for &(key, value) in entries {
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(HIRQEND_MAGIC);
        data
    }

    /// Encode a HIRQUSR capture.
    fn encode_user_runs(overheads: &[u64], thread: &[u64], process: &[u64]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(HIRQUSR_MAGIC);
        data.extend_from_slice(&(overheads.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // reserved
        for value in overheads.iter().chain(thread).chain(process) {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(HIRQEND_MAGIC);
        data
    }

    #[test]
    fn parse_kernel_log_after_serial_text() {
        let mut data = b"irq benchmark starting\n".to_vec();
        data.extend(encode_kernel_log(&[(1, 400), (0, 12), (2, 300)]));

        let samples = parse_kernel_log(&data).unwrap();
        assert_eq!(
            samples,
            vec![
                Sample::new(TagId(1), 400),
                Sample::new(TagId(0), 12),
                Sample::new(TagId(2), 300),
            ]
        );
    }

    #[test]
    fn parse_empty_kernel_log() {
        assert!(parse_kernel_log(&encode_kernel_log(&[])).unwrap().is_empty());
    }

    #[test]
    fn parse_kernel_log_missing_magic() {
        let err = parse_kernel_log(b"no binary data here").unwrap_err();
        assert!(err.to_string().contains("HIRQLOG header magic not found"));
    }

    #[test]
    fn parse_kernel_log_truncated() {
        let mut data = encode_kernel_log(&[(0, 1), (1, 2)]);
        data.truncate(data.len() - 8 - 4);
        assert!(parse_kernel_log(&data).is_err());
    }

    #[test]
    fn parse_kernel_log_bad_footer() {
        let mut data = encode_kernel_log(&[(0, 1)]);
        let len = data.len();
        data[len - 1] = 0xFF;
        let err = parse_kernel_log(&data).unwrap_err();
        assert!(err.to_string().contains("footer magic mismatch"));
    }

    #[test]
    fn parse_kernel_log_rejects_wide_key() {
        let data = encode_kernel_log(&[(70_000, 1)]);
        assert!(parse_kernel_log(&data).is_err());
    }

    #[test]
    fn parse_user_runs_arrays() {
        let data = encode_user_runs(&[20, 21], &[500, 510], &[1000, 1010]);
        let runs = parse_user_runs(&data).unwrap();
        assert_eq!(runs.overheads, vec![20, 21]);
        assert_eq!(runs.thread, vec![500, 510]);
        assert_eq!(runs.process, vec![1000, 1010]);
    }

    #[test]
    fn parse_user_runs_truncated() {
        let mut data = encode_user_runs(&[20, 21], &[500, 510], &[1000, 1010]);
        data.truncate(data.len() - 16);
        assert!(parse_user_runs(&data).is_err());
    }
}
