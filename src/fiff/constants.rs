//! FIFF format constants.
//!
//! Only the subset needed to pull continuous EEG and trigger channels out of a
//! raw `.fif` recording is defined here. Names follow
//! [`mne/_fiff/constants.py`][mne-src] so the reader can be cross-checked
//! against MNE.
//!
//! Every piece of data in a FIF file is wrapped in a **tag** (a 16-byte
//! header followed by a payload). Tags are grouped into **blocks** by
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` sentinels, forming a tree.
//!
//! [mne-src]: https://github.com/mne-tools/mne-python/blob/main/mne/_fiff/constants.py

// ── Block kinds ───────────────────────────────────────────────────────────

/// Measurement block, the top-level container for one recording.
pub const FIFFB_MEAS:            i32 = 100;
/// Channel metadata, sfreq, bad channels.
pub const FIFFB_MEAS_INFO:       i32 = 101;
/// Raw (continuous) data block.
pub const FIFFB_RAW_DATA:        i32 = 102;
/// Alias for raw data written by some acquisition systems.
pub const FIFFB_CONTINUOUS_DATA: i32 = 112;

// ── Tag kinds: structure ──────────────────────────────────────────────────

/// First tag of every FIF file.
pub const FIFF_FILE_ID:         i32 = 100;
/// Second tag; payload is the byte offset of the embedded tag directory.
pub const FIFF_DIR_POINTER:     i32 = 101;
/// Opens a block; payload is the block kind.
pub const FIFF_BLOCK_START:     i32 = 104;
/// Closes the innermost open block.
pub const FIFF_BLOCK_END:       i32 = 105;

// ── Tag kinds: measurement info ───────────────────────────────────────────

pub const FIFF_NCHAN:           i32 = 200;
/// Sampling frequency in Hz, stored as f32.
pub const FIFF_SFREQ:           i32 = 201;
/// One per channel, see [`super::info::ChannelInfo`].
pub const FIFF_CH_INFO:         i32 = 203;
/// Index of the first sample in acquisition time.
pub const FIFF_FIRST_SAMPLE:    i32 = 208;
/// Online lowpass in Hz (may be NaN).
pub const FIFF_LOWPASS:         i32 = 219;
/// Colon-separated list of bad channel names.
pub const FIFF_BAD_CHS:         i32 = 220;
/// Online highpass in Hz (may be NaN).
pub const FIFF_HIGHPASS:        i32 = 223;
/// Power-line frequency in Hz.
pub const FIFF_LINE_FREQ:       i32 = 235;

// ── Tag kinds: data ───────────────────────────────────────────────────────

/// One buffer of interleaved `[n_samp, n_chan]` big-endian samples.
pub const FIFF_DATA_BUFFER:     i32 = 300;
/// Skip `n` whole buffers (acquisition gap).
pub const FIFF_DATA_SKIP:       i32 = 301;

// ── Payload types ─────────────────────────────────────────────────────────

pub const FIFFT_SHORT:            u32 = 2;
pub const FIFFT_INT:              u32 = 3;
pub const FIFFT_FLOAT:            u32 = 4;
pub const FIFFT_DOUBLE:           u32 = 5;
/// Latin-1 string, not NUL-terminated.
pub const FIFFT_STRING:           u32 = 10;
/// 16-bit DAU packed sample; same wire width as `FIFFT_SHORT`.
pub const FIFFT_DAU_PACK16:       u32 = 16;
pub const FIFFT_CH_INFO_STRUCT:   u32 = 30;
pub const FIFFT_ID_STRUCT:        u32 = 31;
/// 16 bytes per entry.
pub const FIFFT_DIR_ENTRY_STRUCT: u32 = 32;

// ── `next` sentinels ──────────────────────────────────────────────────────

/// Next tag follows immediately at `pos + 16 + size`.
pub const FIFFV_NEXT_SEQ:  i32 = 0;
/// No next tag.
pub const FIFFV_NEXT_NONE: i32 = -1;

// ── Channel kind codes ────────────────────────────────────────────────────

pub const FIFFV_MEG_CH:  i32 = 1;
pub const FIFFV_EEG_CH:  i32 = 2;
pub const FIFFV_STIM_CH: i32 = 3;
pub const FIFFV_EOG_CH:  i32 = 202;
pub const FIFFV_EMG_CH:  i32 = 302;
pub const FIFFV_ECG_CH:  i32 = 402;
pub const FIFFV_MISC_CH: i32 = 502;

/// Bytes occupied by one sample of a data-buffer payload type.
///
/// ```
/// use eeg_entropy::fiff::constants::{bytes_per_sample, FIFFT_FLOAT, FIFFT_SHORT};
/// assert_eq!(bytes_per_sample(FIFFT_FLOAT), Some(4));
/// assert_eq!(bytes_per_sample(FIFFT_SHORT), Some(2));
/// assert_eq!(bytes_per_sample(99), None);
/// ```
pub fn bytes_per_sample(tag_type: u32) -> Option<usize> {
    match tag_type {
        FIFFT_SHORT | FIFFT_DAU_PACK16 => Some(2),
        FIFFT_INT | FIFFT_FLOAT        => Some(4),
        FIFFT_DOUBLE                   => Some(8),
        _                              => None,
    }
}
