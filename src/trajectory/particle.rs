use crate::foundation::error::{ParticleVideoError, ParticleVideoResult};

/// One particle sample within a timestep.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Particle {
    /// Position, simulation units.
    pub x: f64,
    /// Position, simulation units.
    pub y: f64,
    /// Velocity, simulation units per second.
    pub vx: f64,
    /// Velocity, simulation units per second.
    pub vy: f64,
    /// Radius, simulation units.
    pub r: f64,
    /// `sqrt(vx² + vy²)`, computed at construction.
    pub speed: f64,
}

impl Particle {
    /// Build a particle and derive its speed.
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, r: f64) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            r,
            speed: vx.hypot(vy),
        }
    }
}

/// One recorded timestep: its time and the particles in file order.
///
/// Particle order is only meaningful as a display id.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Frame {
    /// Simulation time of the timestep.
    pub time: f64,
    /// Particles in the order they appear in the log.
    pub particles: Vec<Particle>,
}

const PARTICLE_FIELDS: usize = 5;

/// Parse an `x,y,vx,vy,r` line. `line` is already trimmed.
pub(crate) fn parse_particle_line(line_no: u64, line: &str) -> ParticleVideoResult<Particle> {
    let mut vals = [0.0f64; PARTICLE_FIELDS];
    let mut n = 0usize;
    for field in line.split(',') {
        if n == PARTICLE_FIELDS {
            return Err(field_count_error(line_no, line));
        }
        let field = field.trim();
        let v: f64 = field.parse().map_err(|_| {
            ParticleVideoError::parse(line_no, line, format!("field '{field}' is not a number"))
        })?;
        if !v.is_finite() {
            return Err(ParticleVideoError::parse(
                line_no,
                line,
                format!("field '{field}' is not finite"),
            ));
        }
        vals[n] = v;
        n += 1;
    }
    if n != PARTICLE_FIELDS {
        return Err(field_count_error(line_no, line));
    }

    let [x, y, vx, vy, r] = vals;
    Ok(Particle::new(x, y, vx, vy, r))
}

fn field_count_error(line_no: u64, line: &str) -> ParticleVideoError {
    ParticleVideoError::parse(
        line_no,
        line,
        format!(
            "expected {PARTICLE_FIELDS} comma-separated fields (x,y,vx,vy,r), got {}",
            line.split(',').count()
        ),
    )
}

/// Timestamp lines are a bare number: optional sign, digits, optional `.digits`.
pub(crate) fn is_timestamp_line(line: &str) -> bool {
    let body = line.strip_prefix(['+', '-']).unwrap_or(line);
    let (int, frac) = match body.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.is_none_or(all_digits)
}
