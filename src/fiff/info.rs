//! Measurement info (MNE's `Info`) restricted to what channel picking and
//! filtering need: channel descriptors, sampling rate, bad channels and the
//! online filter / line-frequency annotations.
use std::io::{Read, Seek};
use anyhow::{anyhow, bail, Result};

use super::constants::*;
use super::tag::{read_f32, read_i32, read_raw_bytes, read_string};
use super::tree::Node;

/// Coarse channel type derived from the FIFF kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Meg,
    Eeg,
    Stim,
    Eog,
    Emg,
    Ecg,
    Misc,
    Other(i32),
}

impl ChannelKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            FIFFV_MEG_CH  => ChannelKind::Meg,
            FIFFV_EEG_CH  => ChannelKind::Eeg,
            FIFFV_STIM_CH => ChannelKind::Stim,
            FIFFV_EOG_CH  => ChannelKind::Eog,
            FIFFV_EMG_CH  => ChannelKind::Emg,
            FIFFV_ECG_CH  => ChannelKind::Ecg,
            FIFFV_MISC_CH => ChannelKind::Misc,
            other         => ChannelKind::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ChannelKind::Meg      => FIFFV_MEG_CH,
            ChannelKind::Eeg      => FIFFV_EEG_CH,
            ChannelKind::Stim     => FIFFV_STIM_CH,
            ChannelKind::Eog      => FIFFV_EOG_CH,
            ChannelKind::Emg      => FIFFV_EMG_CH,
            ChannelKind::Ecg      => FIFFV_ECG_CH,
            ChannelKind::Misc     => FIFFV_MISC_CH,
            ChannelKind::Other(c) => c,
        }
    }
}

/// Channel descriptor parsed from a `FIFFT_CH_INFO_STRUCT` payload.
///
/// ```text
///  0  scanno     i32      24  loc       12 × f32
///  4  logno      i32      72  unit      i32
///  8  kind       i32      76  unit_mul  i32
/// 12  range      f32      80  ch_name   16 × u8 (NUL-padded Latin-1)
/// 16  cal        f32      ── 96 bytes
/// 20  coil_type  i32
/// ```
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub kind:  ChannelKind,
    pub range: f32,
    pub cal:   f32,
    /// `[x, y, z, ...]` in metres.
    pub loc:   [f32; 12],
    pub name:  String,
}

/// Size of the on-disk channel descriptor.
pub const CH_INFO_LEN: usize = 96;

impl ChannelInfo {
    /// Factor turning a raw buffer value into physical units: `cal × range`.
    #[inline]
    pub fn calibration(&self) -> f64 {
        self.cal as f64 * self.range as f64
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < CH_INFO_LEN {
            bail!("ch_info payload too short: {} bytes (need {CH_INFO_LEN})", raw.len());
        }
        let word = |off: usize| [raw[off], raw[off + 1], raw[off + 2], raw[off + 3]];
        let mut loc = [0f32; 12];
        for (i, v) in loc.iter_mut().enumerate() {
            *v = f32::from_be_bytes(word(24 + 4 * i));
        }
        let name_bytes = &raw[80..96];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
        Ok(ChannelInfo {
            kind:  ChannelKind::from_code(i32::from_be_bytes(word(8))),
            range: f32::from_be_bytes(word(12)),
            cal:   f32::from_be_bytes(word(16)),
            loc,
            name:  name_bytes[..end].iter().map(|&b| char::from(b)).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MeasInfo {
    pub n_chan:    usize,
    pub sfreq:     f64,
    pub lowpass:   Option<f64>,
    pub highpass:  Option<f64>,
    pub line_freq: Option<f64>,
    pub chs:       Vec<ChannelInfo>,
    pub bads:      Vec<String>,
}

impl MeasInfo {
    pub fn cals(&self) -> Vec<f64> {
        self.chs.iter().map(ChannelInfo::calibration).collect()
    }

    pub fn ch_names(&self) -> Vec<&str> {
        self.chs.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_bad(&self, name: &str) -> bool {
        self.bads.iter().any(|b| b == name)
    }
}

/// Read `MeasInfo` from the `FIFFB_MEAS_INFO` block.
pub fn read_meas_info<R: Read + Seek>(reader: &mut R, tree: &Node) -> Result<MeasInfo> {
    let info_node = tree
        .find_block(FIFFB_MEAS)
        .and_then(|meas| meas.find_block(FIFFB_MEAS_INFO))
        .ok_or_else(|| anyhow!("FIFFB_MEAS_INFO block not found"))?;

    let mut n_chan = None::<usize>;
    let mut sfreq = None::<f64>;
    let mut lowpass = None;
    let mut highpass = None;
    let mut line_freq = None;
    let mut chs = Vec::new();
    let mut bads = Vec::new();

    // NaN marks "not set" for the optional frequency annotations.
    let finite = |v: f32| v.is_finite().then_some(v as f64);

    for ent in &info_node.entries {
        match ent.kind {
            FIFF_NCHAN     => n_chan = Some(read_i32(reader, ent)?.max(0) as usize),
            FIFF_SFREQ     => sfreq = Some(read_f32(reader, ent)? as f64),
            FIFF_LOWPASS   => lowpass = finite(read_f32(reader, ent)?),
            FIFF_HIGHPASS  => highpass = finite(read_f32(reader, ent)?),
            FIFF_LINE_FREQ => line_freq = finite(read_f32(reader, ent)?),
            FIFF_CH_INFO   => chs.push(ChannelInfo::from_bytes(&read_raw_bytes(reader, ent)?)?),
            FIFF_BAD_CHS   => {
                bads = read_string(reader, ent)?
                    .split(':')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
    }

    let n_chan = n_chan.ok_or_else(|| anyhow!("FIFF_NCHAN not found"))?;
    let sfreq = sfreq.ok_or_else(|| anyhow!("FIFF_SFREQ not found"))?;
    if sfreq <= 0.0 {
        bail!("non-positive sampling rate {sfreq}");
    }
    if chs.len() != n_chan {
        bail!("expected {n_chan} ch_info structs, got {}", chs.len());
    }
    Ok(MeasInfo { n_chan, sfreq, lowpass, highpass, line_freq, chs, bads })
}
