use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};
use crate::trajectory::particle::{Frame, Particle, is_timestamp_line, parse_particle_line};
use anyhow::Context as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Lazy, single-pass stream of [`Frame`]s from a simulation log.
///
/// A timestamp line opens a block; the particle lines that follow belong to it. A block is emitted
/// when the next timestamp arrives or the input ends, and only if it holds at least one particle.
/// Blank lines are ignored. Restart by opening the file again.
///
/// The first error ends the stream.
pub struct FrameReader<R> {
    lines: std::io::Lines<R>,
    source: PathBuf,
    line_no: u64,
    current_time: Option<f64>,
    particles: Vec<Particle>,
    done: bool,
}

impl FrameReader<BufReader<File>> {
    /// Open `path` for streaming.
    pub fn open(path: &Path) -> ParticleVideoResult<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open simulation log '{}'", path.display()))?;
        Ok(Self::with_source(BufReader::new(file), path))
    }
}

impl<R: BufRead> FrameReader<R> {
    /// Stream frames from an already-open reader.
    pub fn from_reader(reader: R) -> Self {
        Self::with_source(reader, Path::new("<reader>"))
    }

    fn with_source(reader: R, source: &Path) -> Self {
        Self {
            lines: reader.lines(),
            source: source.to_path_buf(),
            line_no: 0,
            current_time: None,
            particles: Vec::new(),
            done: false,
        }
    }

    fn next_frame(&mut self) -> ParticleVideoResult<Option<Frame>> {
        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = line.with_context(|| {
                format!(
                    "failed to read line {} of '{}'",
                    self.line_no,
                    self.source.display()
                )
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if is_timestamp_line(trimmed) {
                let time: f64 = trimmed.parse().map_err(|_| {
                    ParticleVideoError::parse(self.line_no, trimmed, "invalid timestamp")
                })?;
                let flushed = self.take_block();
                self.current_time = Some(time);
                if flushed.is_some() {
                    return Ok(flushed);
                }
                continue;
            }

            if self.current_time.is_none() {
                return Err(ParticleVideoError::parse(
                    self.line_no,
                    trimmed,
                    "particle line before the first timestamp",
                ));
            }
            self.particles.push(parse_particle_line(self.line_no, trimmed)?);
        }

        let last = self.take_block();
        self.current_time = None;
        Ok(last)
    }

    fn take_block(&mut self) -> Option<Frame> {
        let time = self.current_time?;
        if self.particles.is_empty() {
            return None;
        }
        Some(Frame {
            time,
            particles: std::mem::take(&mut self.particles),
        })
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = ParticleVideoResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/reader.rs"]
mod tests;
