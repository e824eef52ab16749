use crate::foundation::error::ParticleVideoResult;
use crate::trajectory::particle::parse_particle_line;
use anyhow::Context as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Scan the whole log and return the largest particle speed, or `0.0` with no particle lines.
///
/// This is a separate pass over the file so the color scale is fixed before the first frame is
/// drawn. It ignores block structure: any line containing a comma is a particle line.
#[tracing::instrument(level = "debug")]
pub fn scan_max_speed(path: &Path) -> ParticleVideoResult<f64> {
    let file = File::open(path)
        .with_context(|| format!("failed to open simulation log '{}'", path.display()))?;
    let max = scan_max_speed_from(BufReader::new(file))?;
    tracing::info!(max_speed = max, path = %path.display(), "computed max speed");
    Ok(max)
}

/// [`scan_max_speed`] over an already-open reader.
pub fn scan_max_speed_from(reader: impl BufRead) -> ParticleVideoResult<f64> {
    let mut max_speed = 0.0f64;
    for (i, line) in reader.lines().enumerate() {
        let line_no = i as u64 + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let trimmed = line.trim();
        if !trimmed.contains(',') {
            continue;
        }
        let p = parse_particle_line(line_no, trimmed)?;
        max_speed = max_speed.max(p.speed);
    }
    Ok(max_speed)
}
