//! Raw FIF recording reader.
//!
//! 1. Load the tag directory (embedded directory, or a scan of the tag chain).
//! 2. Build the block tree and read [`MeasInfo`].
//! 3. Walk the `FIFFB_RAW_DATA` block and record one [`BufferRecord`] per data
//!    buffer, inserting zero-filled gaps for `FIFF_DATA_SKIP`.
//! 4. [`RawFif::read_channels`] decodes only the requested channels, so a
//!    376-channel MEG+EEG file does not have to be materialised in full.
//!
//! Calibration: `value[ch, t] = raw[t, ch] × cal[ch] × range[ch]`, as in MNE.
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::Array2;
use tracing::debug;

use super::constants::*;
use super::info::{read_meas_info, MeasInfo};
use super::tag::{read_i32, TagHeader};
use super::tree::{read_tree, scan_directory, try_load_directory};

/// One contiguous block of samples in the file.
#[derive(Debug, Clone)]
pub struct BufferRecord {
    /// `None` for an acquisition gap, which reads as zeros.
    pub tag:        Option<TagHeader>,
    /// First sample of the buffer in acquisition time.
    pub first_samp: u64,
    pub n_samp:     usize,
}

#[derive(Debug, Clone)]
pub struct RawFif {
    pub info:       MeasInfo,
    /// First sample index in acquisition time.
    pub first_samp: u64,
    pub n_times:    usize,
    pub path:       PathBuf,
    pub buffers:    Vec<BufferRecord>,
}

impl RawFif {
    pub fn duration_secs(&self) -> f64 {
        self.n_times as f64 / self.info.sfreq
    }

    /// Read the calibrated data of the channels in `picks` as `[picks.len(), n_times]`.
    ///
    /// Rows follow the order of `picks`.
    pub fn read_channels(&self, picks: &[usize]) -> Result<Array2<f64>> {
        let n_chan = self.info.n_chan;
        if let Some(&bad) = picks.iter().find(|&&p| p >= n_chan) {
            bail!("channel index {bad} out of range ({n_chan} channels)");
        }
        let cals: Vec<f64> = picks.iter().map(|&p| self.info.chs[p].calibration()).collect();
        let mut out = Array2::<f64>::zeros((picks.len(), self.n_times));

        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);
        let mut offset = 0_usize;

        for buf in &self.buffers {
            if let Some(tag) = &buf.tag {
                let bytes = read_buffer_bytes(&mut reader, tag)?;
                let bps = bytes_per_sample(tag.ftype)
                    .ok_or_else(|| anyhow!("unsupported buffer type {}", tag.ftype))?;
                for t in 0..buf.n_samp {
                    let frame = &bytes[t * n_chan * bps..(t + 1) * n_chan * bps];
                    for (row, (&ch, &cal)) in picks.iter().zip(&cals).enumerate() {
                        out[[row, offset + t]] = decode_sample(tag.ftype, &frame[ch * bps..(ch + 1) * bps]) * cal;
                    }
                }
            }
            offset += buf.n_samp;
        }
        debug_assert_eq!(offset, self.n_times);
        Ok(out)
    }
}

/// Open a FIF file and index its data buffers without reading samples.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawFif> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let directory = match try_load_directory(&mut reader)? {
        Some(d) => d,
        None    => scan_directory(&mut reader)?,
    };
    let tree = read_tree(&mut reader, &directory)?;
    let info = read_meas_info(&mut reader, &tree)?;
    if info.n_chan == 0 {
        bail!("{} declares zero channels", path.display());
    }

    let raw_node = tree
        .find_block(FIFFB_MEAS)
        .and_then(|meas| {
            meas.find_block(FIFFB_RAW_DATA)
                .or_else(|| meas.find_block(FIFFB_CONTINUOUS_DATA))
        })
        .ok_or_else(|| anyhow!("no raw-data block in {}", path.display()))?;

    let mut next_samp: u64 = match raw_node.tags(FIFF_FIRST_SAMPLE).next() {
        Some(tag) => read_i32(&mut reader, tag)?.max(0) as u64,
        None => 0,
    };
    let mut leading_skip = 0_usize;
    let mut pending_skip = 0_usize;
    let mut buffers: Vec<BufferRecord> = Vec::new();

    for ent in &raw_node.entries {
        match ent.kind {
            FIFF_DATA_SKIP => {
                let n = read_i32(&mut reader, ent)?.max(0) as usize;
                if buffers.is_empty() {
                    leading_skip += n;
                } else {
                    pending_skip += n;
                }
            }
            FIFF_DATA_BUFFER => {
                let bps = bytes_per_sample(ent.ftype)
                    .ok_or_else(|| anyhow!("unsupported buffer type {}", ent.ftype))?;
                let n_samp = ent.payload_len() / (bps * info.n_chan);

                // A skip before the first buffer only shifts the start time.
                if leading_skip > 0 {
                    next_samp += (leading_skip * n_samp) as u64;
                    leading_skip = 0;
                }
                if pending_skip > 0 {
                    let gap = pending_skip * n_samp;
                    buffers.push(BufferRecord { tag: None, first_samp: next_samp, n_samp: gap });
                    next_samp += gap as u64;
                    pending_skip = 0;
                }
                buffers.push(BufferRecord { tag: Some(*ent), first_samp: next_samp, n_samp });
                next_samp += n_samp as u64;
            }
            _ => {}
        }
    }

    let Some(first) = buffers.first() else {
        bail!("no FIFF_DATA_BUFFER tags in raw-data block of {}", path.display());
    };
    let first_samp = first.first_samp;
    let n_times = (next_samp - first_samp) as usize;
    debug!(
        path = %path.display(),
        n_chan = info.n_chan,
        sfreq = info.sfreq,
        n_times,
        n_buffers = buffers.len(),
        "indexed raw FIF"
    );

    Ok(RawFif { info, first_samp, n_times, path: path.to_path_buf(), buffers })
}

fn read_buffer_bytes<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<u8>> {
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to buffer data @ {:#x}", tag.data_pos()))?;
    let mut bytes = vec![0u8; tag.payload_len()];
    reader.read_exact(&mut bytes)
        .with_context(|| format!("read data buffer @ {:#x}", tag.pos))?;
    Ok(bytes)
}

/// Decode one big-endian sample; `raw.len()` equals `bytes_per_sample(ftype)`.
fn decode_sample(ftype: u32, raw: &[u8]) -> f64 {
    match ftype {
        FIFFT_FLOAT  => f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
        FIFFT_INT    => i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
        FIFFT_DOUBLE => {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[..8]);
            f64::from_be_bytes(b)
        }
        _ => i16::from_be_bytes([raw[0], raw[1]]) as f64,
    }
}
