//! FIFF (`.fif`) reader for raw MEG/EEG recordings written by MNE-Python and
//! Elekta/Neuromag systems.
//!
//! ```no_run
//! use eeg_entropy::fiff::open_raw;
//!
//! let raw = open_raw("sample_audvis_raw.fif").unwrap();
//! println!("{} channels @ {} Hz", raw.info.n_chan, raw.info.sfreq);
//! let eeg = raw.read_channels(&[0, 1, 2]).unwrap(); // [3, n_times] f64
//! ```
pub mod constants;
pub mod info;
pub mod raw;
pub mod tag;
pub mod tree;

pub use info::{ChannelInfo, ChannelKind, MeasInfo, read_meas_info};
pub use raw::{open_raw, BufferRecord, RawFif};
pub use tag::{read_tag_header, TagHeader};
pub use tree::{read_tree, scan_directory, try_load_directory, Node};
