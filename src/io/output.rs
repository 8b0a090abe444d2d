use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::physics::BodySet;

// ---------------------------------------------------------------------------
// Per-tick state table, CSV
// ---------------------------------------------------------------------------

/// Rate-gated CSV writer for the full body-set state.
///
/// One row per body per emitted tick; ticks arriving before the next
/// scheduled output time are dropped.
pub struct StateWriter<W: Write> {
    wr: csv::Writer<W>,
    rate_s: f64,
    next_t: f64,
}

impl StateWriter<File> {
    pub fn create(path: impl AsRef<Path>, rate_s: f64) -> Result<Self, csv::Error> {
        Self::from_writer(File::create(path)?, rate_s)
    }
}

impl<W: Write> StateWriter<W> {
    pub fn from_writer(w: W, rate_s: f64) -> Result<Self, csv::Error> {
        let mut wr = csv::Writer::from_writer(w);
        wr.write_record([
            "Time", "EntityID", "EntityName", "X", "Y", "Z", "VX", "VY", "VZ",
        ])?;
        Ok(Self { wr, rate_s, next_t: 0.0 })
    }

    /// Emit a snapshot if `t` has reached the next output time.
    pub fn tick(&mut self, t: f64, set: &BodySet) -> Result<(), csv::Error> {
        if t + 1e-9 < self.next_t {
            return Ok(());
        }
        self.next_t = t + self.rate_s;

        for (i, (body, name)) in set.bodies.iter().zip(&set.names).enumerate() {
            self.wr.write_record([
                t.to_string(),
                i.to_string(),
                name.clone(),
                body.pos.x.to_string(),
                body.pos.y.to_string(),
                body.pos.z.to_string(),
                body.vel.x.to_string(),
                body.vel.y.to_string(),
                body.vel.z.to_string(),
            ])?;
        }
        self.wr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::MU_EARTH;
    use crate::physics::Body;
    use nalgebra::Vector3;

    fn small_set() -> BodySet {
        let mut set = BodySet::new(MU_EARTH);
        set.add(Body::fixed(Vector3::new(7000.0, 0.0, 0.0)), "Alpha");
        set.add(Body::fixed(Vector3::new(0.0, 8000.0, 0.0)), "Beta");
        set
    }

    fn lines(buf: &[u8]) -> Vec<String> {
        String::from_utf8(buf.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn header_matches_schema() {
        let mut buf = Vec::new();
        {
            let mut w = StateWriter::from_writer(&mut buf, 1.0).unwrap();
            w.tick(0.0, &small_set()).unwrap();
        }
        let lines = lines(&buf);
        assert_eq!(lines[0], "Time,EntityID,EntityName,X,Y,Z,VX,VY,VZ");
        assert!(lines[1].starts_with("0,0,Alpha,7000,"));
        assert!(lines[2].starts_with("0,1,Beta,"));
    }

    #[test]
    fn rate_gating_drops_intermediate_ticks() {
        let mut buf = Vec::new();
        {
            let set = small_set();
            let mut w = StateWriter::from_writer(&mut buf, 10.0).unwrap();
            for i in 0..=20 {
                w.tick(f64::from(i), &set).unwrap();
            }
        }
        // header + 3 emitted snapshots (t = 0, 10, 20) * 2 bodies
        assert_eq!(lines(&buf).len(), 1 + 3 * 2);
    }
}
