use std::path::Path;

use anyhow::{Context, Result};

use cadenza_types::ClipInfo;

/// Read sample count and rate from a WAV header. Sample data is not decoded.
pub fn probe_wav(path: &Path) -> Result<ClipInfo> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    let clip = ClipInfo::new(u64::from(reader.duration()), spec.sample_rate)
        .with_context(|| format!("WAV file {} has no playable audio", path.display()))?;
    Ok(clip)
}
