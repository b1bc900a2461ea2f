/// Shared helpers: synthetic signals, synthetic epochs and a minimal FIF writer.
use eeg_entropy::epoch::{from_arrays, Epochs};
use eeg_entropy::events::{Event, StimulusKind};
use eeg_entropy::fiff::constants::*;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::Path;

#[allow(unused)]
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[allow(unused)]
/// Uniform white noise in `[-amp, amp)`.
pub fn white_noise(rng: &mut StdRng, n: usize, amp: f64) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(-amp..amp)).collect()
}

#[allow(unused)]
/// Slow sine with a random phase plus a tiny jitter: highly regular.
pub fn regular_signal(rng: &mut StdRng, n: usize, freq: f64, sfreq: f64, jitter: f64) -> Vec<f64> {
    let phase = rng.gen_range(0.0..2.0 * PI);
    (0..n)
        .map(|i| (2.0 * PI * freq * i as f64 / sfreq + phase).sin() + rng.gen_range(-jitter..jitter))
        .collect()
}

#[allow(unused)]
/// Epochs whose rest window (`t < 0`) is white noise and whose task window
/// (onset included) is a 5 Hz sine with 1e-3 jitter.
///
/// `sfreq` 1000 Hz, window −0.2 … 0.5 s: 200 rest and 500 task samples.
pub fn rest_task_epochs(n_epochs: usize, n_channels: usize, seed: u64) -> Epochs {
    let sfreq = 1000.0;
    let start = -200_i64;
    let n_rest = 200;
    let n_task = 501;
    let mut r = rng(seed);

    let epochs: Vec<Array2<f64>> = (0..n_epochs)
        .map(|_| {
            let mut ep = Array2::<f64>::zeros((n_channels, n_rest + n_task));
            for ch in 0..n_channels {
                let mut row = white_noise(&mut r, n_rest, 1.0);
                row.extend(regular_signal(&mut r, n_task, 5.0, sfreq, 1e-3));
                ep.row_mut(ch).assign(&ndarray::Array1::from(row));
            }
            ep
        })
        .collect();
    let events = (0..n_epochs)
        .map(|e| Event { sample: 1000 * (e + 1), kind: StimulusKind::ALL[e % 4] })
        .collect();
    let names = (1..=n_channels).map(|c| format!("EEG {c:03}")).collect();
    from_arrays(epochs, events, names, sfreq, start).unwrap()
}

#[allow(unused)]
/// Channel description for [`write_fif`].
pub struct FifChannel {
    pub name: &'static str,
    pub kind: i32,
    pub cal:  f32,
}

fn tag(out: &mut Vec<u8>, kind: i32, ftype: u32, payload: &[u8]) {
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&ftype.to_be_bytes());
    out.extend_from_slice(&(payload.len() as i32).to_be_bytes());
    out.extend_from_slice(&FIFFV_NEXT_SEQ.to_be_bytes());
    out.extend_from_slice(payload);
}

fn ch_info(ch: &FifChannel, logno: i32) -> Vec<u8> {
    let mut b = vec![0u8; 96];
    b[0..4].copy_from_slice(&logno.to_be_bytes());
    b[4..8].copy_from_slice(&logno.to_be_bytes());
    b[8..12].copy_from_slice(&ch.kind.to_be_bytes());
    b[12..16].copy_from_slice(&1_f32.to_be_bytes());
    b[16..20].copy_from_slice(&ch.cal.to_be_bytes());
    let name = ch.name.as_bytes();
    b[80..80 + name.len()].copy_from_slice(name);
    b
}

#[allow(unused)]
/// Write a raw FIF file holding `data` (`[C, T]`, physical units) as float
/// buffers of `buffer_len` samples. Tags are chained sequentially and the
/// file has no embedded directory.
pub fn write_fif(
    path: &Path,
    sfreq: f32,
    channels: &[FifChannel],
    data: &Array2<f64>,
    bads: &[&str],
    first_samp: i32,
    buffer_len: usize,
) {
    assert_eq!(channels.len(), data.nrows());
    let mut out = Vec::new();

    tag(&mut out, FIFF_FILE_ID, FIFFT_ID_STRUCT, &[0u8; 20]);
    tag(&mut out, FIFF_DIR_POINTER, FIFFT_INT, &(-1_i32).to_be_bytes());
    tag(&mut out, FIFF_BLOCK_START, FIFFT_INT, &FIFFB_MEAS.to_be_bytes());

    tag(&mut out, FIFF_BLOCK_START, FIFFT_INT, &FIFFB_MEAS_INFO.to_be_bytes());
    tag(&mut out, FIFF_NCHAN, FIFFT_INT, &(channels.len() as i32).to_be_bytes());
    tag(&mut out, FIFF_SFREQ, FIFFT_FLOAT, &sfreq.to_be_bytes());
    tag(&mut out, FIFF_LINE_FREQ, FIFFT_FLOAT, &60_f32.to_be_bytes());
    if !bads.is_empty() {
        tag(&mut out, FIFF_BAD_CHS, FIFFT_STRING, bads.join(":").as_bytes());
    }
    for (i, ch) in channels.iter().enumerate() {
        tag(&mut out, FIFF_CH_INFO, FIFFT_CH_INFO_STRUCT, &ch_info(ch, i as i32 + 1));
    }
    tag(&mut out, FIFF_BLOCK_END, FIFFT_INT, &FIFFB_MEAS_INFO.to_be_bytes());

    tag(&mut out, FIFF_BLOCK_START, FIFFT_INT, &FIFFB_RAW_DATA.to_be_bytes());
    tag(&mut out, FIFF_FIRST_SAMPLE, FIFFT_INT, &first_samp.to_be_bytes());
    let n_t = data.ncols();
    let mut t0 = 0;
    while t0 < n_t {
        let t1 = (t0 + buffer_len).min(n_t);
        let mut payload = Vec::with_capacity((t1 - t0) * channels.len() * 4);
        for t in t0..t1 {
            for (c, ch) in channels.iter().enumerate() {
                let raw = (data[[c, t]] / ch.cal as f64) as f32;
                payload.extend_from_slice(&raw.to_be_bytes());
            }
        }
        tag(&mut out, FIFF_DATA_BUFFER, FIFFT_FLOAT, &payload);
        t0 = t1;
    }
    tag(&mut out, FIFF_BLOCK_END, FIFFT_INT, &FIFFB_RAW_DATA.to_be_bytes());
    tag(&mut out, FIFF_BLOCK_END, FIFFT_INT, &FIFFB_MEAS.to_be_bytes());

    // Terminate the chain at the last tag.
    let last = out.len() - 16 - 4;
    out[last + 12..last + 16].copy_from_slice(&FIFFV_NEXT_NONE.to_be_bytes());

    std::fs::write(path, out).unwrap();
}
