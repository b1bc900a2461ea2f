//! Locating the MNE sample recording on disk, downloading it when missing.
//!
//! Candidates, in order: an explicit path, then the sample-data folder under
//! `$MNE_DATASETS_SAMPLE_PATH`, `$MNE_DATA`, `$HOME/mne_data`, `./data` and
//! `./mne_data`. The first existing file wins. When none exists the dataset
//! archive is fetched from [`SAMPLE_DATA_URL`] and unpacked into
//! [`download_root`].
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Location of the raw recording inside a dataset root.
pub const SAMPLE_RELATIVE_PATH: &str = "MNE-sample-data/MEG/sample/sample_audvis_raw.fif";

/// Archive of the sample dataset.
pub const SAMPLE_DATA_URL: &str = "https://osf.io/86qa2/download?version=6";

/// Connect and read timeout of the download unless the caller picks one.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("sample recording not found; looked in:{}", list(.tried))]
    NotFound { tried: Vec<PathBuf> },

    #[error("download of {url} failed: {source}")]
    Download {
        url:    String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("could not unpack the sample archive into {}: {source}", .dest.display())]
    Unpack {
        dest:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive unpacked into {} but {} is missing", .dest.display(), .expected.display())]
    Incomplete { dest: PathBuf, expected: PathBuf },
}

fn list(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| format!("\n  {}", p.display())).collect()
}

impl AcquisitionError {
    /// Steps the user can take to make the recording available.
    pub fn hints(&self) -> Vec<String> {
        let manual = vec![
            format!("download the MNE sample dataset from {SAMPLE_DATA_URL} and extract it"),
            "set MNE_DATASETS_SAMPLE_PATH (or MNE_DATA) to the folder containing MNE-sample-data".to_string(),
            "or pass the recording directly with --fif <PATH>".to_string(),
        ];
        let mut hints = match self {
            AcquisitionError::NotFound { .. } => vec![
                "run without --no-download to fetch the dataset automatically".to_string(),
            ],
            AcquisitionError::Download { .. } => vec![
                "check the network connection or proxy settings".to_string(),
                "retry with a longer --download-timeout".to_string(),
            ],
            AcquisitionError::Unpack { dest, .. } | AcquisitionError::Incomplete { dest, .. } => vec![
                format!("check free space and write permission in {}", dest.display()),
                format!("remove a partial {} and retry", dest.join("MNE-sample-data").display()),
            ],
        };
        hints.extend(manual);
        hints
    }
}

/// Candidate paths, using `var` to read environment variables.
pub fn candidate_paths<F>(explicit: Option<&Path>, var: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut roots: Vec<PathBuf> = Vec::new();
    for key in ["MNE_DATASETS_SAMPLE_PATH", "MNE_DATA"] {
        if let Some(v) = var(key).filter(|v| !v.is_empty()) {
            roots.push(PathBuf::from(v));
        }
    }
    if let Some(home) = var("HOME").filter(|v| !v.is_empty()) {
        roots.push(Path::new(&home).join("mne_data"));
    }
    roots.push(PathBuf::from("data"));
    roots.push(PathBuf::from("mne_data"));

    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(roots.into_iter().map(|r| r.join(SAMPLE_RELATIVE_PATH)))
        .collect()
}

/// Dataset root a download is unpacked into: the first configured root, else
/// `./mne_data`.
pub fn download_root<F>(var: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let configured = ["MNE_DATASETS_SAMPLE_PATH", "MNE_DATA"]
        .into_iter()
        .find_map(|key| var(key).filter(|v| !v.is_empty()).map(PathBuf::from));
    configured
        .or_else(|| var("HOME").filter(|v| !v.is_empty()).map(|h| Path::new(&h).join("mne_data")))
        .unwrap_or_else(|| PathBuf::from("mne_data"))
}

/// First candidate that is an existing file.
pub fn locate_in(candidates: Vec<PathBuf>) -> Result<PathBuf, AcquisitionError> {
    for path in &candidates {
        debug!(path = %path.display(), "probing");
        if path.is_file() {
            info!(path = %path.display(), "found sample recording");
            return Ok(path.clone());
        }
    }
    Err(AcquisitionError::NotFound { tried: candidates })
}

/// Locate `sample_audvis_raw.fif` on disk using the process environment.
pub fn locate_local(explicit: Option<&Path>) -> Result<PathBuf, AcquisitionError> {
    locate_in(candidate_paths(explicit, |k| std::env::var(k).ok()))
}

/// Locate `sample_audvis_raw.fif`, downloading the dataset into
/// [`download_root`] when no local copy exists.
pub fn locate_sample_data(explicit: Option<&Path>, timeout: Duration) -> Result<PathBuf, AcquisitionError> {
    match locate_local(explicit) {
        Ok(path) => Ok(path),
        Err(err) => {
            warn!("{err}");
            download_sample_data(&download_root(|k| std::env::var(k).ok()), timeout)
        }
    }
}

/// Fetch the sample archive and unpack it into `dest`; returns the path of the
/// raw recording inside it.
pub fn download_sample_data(dest: &Path, timeout: Duration) -> Result<PathBuf, AcquisitionError> {
    fetch(SAMPLE_DATA_URL, dest, timeout)
}

fn fetch(url: &str, dest: &Path, timeout: Duration) -> Result<PathBuf, AcquisitionError> {
    info!(url, dest = %dest.display(), timeout_secs = timeout.as_secs(), "downloading sample dataset");
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .build();
    let response = agent
        .get(url)
        .call()
        .map_err(|source| AcquisitionError::Download { url: url.to_string(), source: Box::new(source) })?;
    let path = unpack_archive(response.into_reader(), dest)?;
    info!(path = %path.display(), "sample dataset unpacked");
    Ok(path)
}

/// Unpack a gzip-compressed tar stream into `dest` and check that it held
/// the raw recording.
pub fn unpack_archive<R: Read>(reader: R, dest: &Path) -> Result<PathBuf, AcquisitionError> {
    let unpack_err = |source| AcquisitionError::Unpack { dest: dest.to_path_buf(), source };
    std::fs::create_dir_all(dest).map_err(unpack_err)?;
    tar::Archive::new(GzDecoder::new(reader)).unpack(dest).map_err(unpack_err)?;

    let expected = dest.join(SAMPLE_RELATIVE_PATH);
    if expected.is_file() {
        Ok(expected)
    } else {
        Err(AcquisitionError::Incomplete { dest: dest.to_path_buf(), expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    /// In-memory `.tar.gz` holding `files`.
    fn archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn search_order() {
        let paths = candidate_paths(
            Some(Path::new("/x/raw.fif")),
            env(&[("MNE_DATA", "/mne"), ("HOME", "/home/u"), ("MNE_DATASETS_SAMPLE_PATH", "/s")]),
        );
        let expected: Vec<PathBuf> = vec![
            PathBuf::from("/x/raw.fif"),
            Path::new("/s").join(SAMPLE_RELATIVE_PATH),
            Path::new("/mne").join(SAMPLE_RELATIVE_PATH),
            Path::new("/home/u/mne_data").join(SAMPLE_RELATIVE_PATH),
            Path::new("data").join(SAMPLE_RELATIVE_PATH),
            Path::new("mne_data").join(SAMPLE_RELATIVE_PATH),
        ];
        assert_eq!(paths, expected);
    }

    #[test]
    fn unset_variables_are_skipped() {
        let paths = candidate_paths(None, env(&[("MNE_DATA", "")]));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn download_goes_to_the_first_configured_root() {
        assert_eq!(
            download_root(env(&[("MNE_DATA", "/mne"), ("MNE_DATASETS_SAMPLE_PATH", "/s")])),
            PathBuf::from("/s")
        );
        assert_eq!(download_root(env(&[("MNE_DATA", "/mne"), ("HOME", "/h")])), PathBuf::from("/mne"));
        assert_eq!(download_root(env(&[("MNE_DATA", ""), ("HOME", "/h")])), PathBuf::from("/h/mne_data"));
        assert_eq!(download_root(env(&[])), PathBuf::from("mne_data"));
        // a download lands where the search looks
        let root = download_root(env(&[("HOME", "/h")]));
        assert!(candidate_paths(None, env(&[("HOME", "/h")])).contains(&root.join(SAMPLE_RELATIVE_PATH)));
    }

    #[test]
    fn finds_existing_file_and_reports_misses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let target = dir.path().join(SAMPLE_RELATIVE_PATH);
        let missing = candidate_paths(None, env(&[("MNE_DATA", &root)]));

        let err = locate_in(missing.clone()).unwrap_err();
        let AcquisitionError::NotFound { tried } = &err else { panic!("{err:?}") };
        assert_eq!(tried, &missing);
        assert!(err.to_string().contains(&target.display().to_string()));
        assert!(!err.hints().is_empty());

        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"").unwrap();
        assert_eq!(locate_in(missing).unwrap(), target);
    }

    #[test]
    fn unpacks_the_recording() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mne_data");
        let gz = archive(&[
            (SAMPLE_RELATIVE_PATH, &b"fif bytes"[..]),
            ("MNE-sample-data/version.txt", &b"0.8"[..]),
        ]);

        let path = unpack_archive(&gz[..], &dest).unwrap();
        assert_eq!(path, dest.join(SAMPLE_RELATIVE_PATH));
        assert_eq!(std::fs::read(&path).unwrap(), b"fif bytes");
        let root = dest.to_str().unwrap().to_string();
        assert_eq!(locate_in(candidate_paths(None, env(&[("MNE_DATA", &root)]))).unwrap(), path);
    }

    #[test]
    fn archive_without_the_recording_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let gz = archive(&[("MNE-sample-data/version.txt", &b"0.8"[..])]);
        let err = unpack_archive(&gz[..], dir.path()).unwrap_err();
        assert!(matches!(&err, AcquisitionError::Incomplete { expected, .. }
            if *expected == dir.path().join(SAMPLE_RELATIVE_PATH)));
    }

    #[test]
    fn corrupt_archive_is_an_unpack_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_archive(&b"not gzip at all"[..], dir.path()).unwrap_err();
        assert!(matches!(err, AcquisitionError::Unpack { .. }));
        assert!(err.hints().iter().any(|h| h.contains("write permission")));
    }

    #[test]
    fn failed_request_maps_to_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fetch("not-a-url", dir.path(), Duration::from_secs(1)).unwrap_err();
        let AcquisitionError::Download { url, .. } = &err else { panic!("{err:?}") };
        assert_eq!(url, "not-a-url");
        assert!(err.to_string().starts_with("download of not-a-url failed"));
        assert!(err.hints().iter().any(|h| h.contains("--download-timeout")));
        assert!(err.hints().iter().any(|h| h.contains(SAMPLE_DATA_URL)));
        assert!(!dir.path().join("MNE-sample-data").exists());
    }
}
