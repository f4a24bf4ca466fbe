//! Receiver trace output.
//!
//! One CSV file for all receivers: a time column followed by one column
//! per receiver and component, flushed at the end of the run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::source::LocalizedReceiver;

pub fn write_traces<P: AsRef<Path>>(
    path: P,
    receivers: &[LocalizedReceiver],
    dt: f64,
    components: usize,
) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    write!(w, "time")?;
    for rec in receivers {
        if components == 1 {
            write!(w, ",{}", rec.receiver.name)?;
        } else {
            for c in 0..components {
                write!(w, ",{}:{}", rec.receiver.name, ["x", "y", "z"][c])?;
            }
        }
    }
    writeln!(w)?;

    let num_samples = receivers
        .iter()
        .map(|r| r.trace.len() / components)
        .min()
        .unwrap_or(0);
    for s in 0..num_samples {
        write!(w, "{:.9e}", (s + 1) as f64 * dt)?;
        for rec in receivers {
            for c in 0..components {
                write!(w, ",{:.9e}", rec.trace[s * components + c])?;
            }
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Receiver;

    #[test]
    fn test_trace_file_layout() {
        let recs = vec![LocalizedReceiver {
            receiver: Receiver {
                name: "rec0".into(),
                location: [0.0, 0.0, 0.0],
            },
            element: 0,
            xi: vec![0.0, 0.0],
            interp: vec![],
            trace: vec![0.0, 0.5, 1.0],
        }];
        let dir = std::env::temp_dir().join("semwave-trace-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("traces.csv");
        write_traces(&path, &recs, 0.1, 1).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "time,rec0");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("2.0"));
    }
}
