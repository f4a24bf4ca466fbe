//! Point sources, source time functions, and receivers.
//!
//! Sources and receivers are given in physical coordinates. At
//! initialization each is offered to every element with `finalize =
//! false` to count candidate owners; the element with the smallest
//! ordinal wins ties on shared boundaries and computes the reference
//! coordinates with its inverse map. Objects that land outside the mesh
//! are dropped with a warning.

use log::warn;

use crate::element::Element;
use crate::error::EngineError;

/// Time dependence of a point source.
#[derive(Clone, Debug)]
pub enum SourceTimeFunction {
    /// Ricker wavelet A (1 − 2π²ν²τ̂²) exp(−π²ν²τ̂²), τ̂ = t − delay.
    Ricker {
        amplitude: f64,
        center_freq: f64,
        time_delay: f64,
    },
    /// Tabulated samples with linear interpolation, zero outside the
    /// tabulated range.
    File {
        sample_interval: f64,
        samples: Vec<f64>,
    },
}

impl SourceTimeFunction {
    pub fn fire(&self, t: f64) -> f64 {
        match self {
            SourceTimeFunction::Ricker {
                amplitude,
                center_freq,
                time_delay,
            } => {
                let pi_nu = std::f64::consts::PI * center_freq;
                let arg = pi_nu * pi_nu * (t - time_delay) * (t - time_delay);
                amplitude * (1.0 - 2.0 * arg) * (-arg).exp()
            }
            SourceTimeFunction::File {
                sample_interval,
                samples,
            } => {
                if t < 0.0 || samples.is_empty() {
                    return 0.0;
                }
                let pos = t / sample_interval;
                let i = pos.floor() as usize;
                if i + 1 >= samples.len() {
                    return 0.0;
                }
                let frac = pos - i as f64;
                samples[i] * (1.0 - frac) + samples[i + 1] * frac
            }
        }
    }
}

/// A point source before localization.
#[derive(Clone, Debug)]
pub struct Source {
    pub name: String,
    pub location: [f64; 3],
    pub num_components: usize,
    /// Force direction; length `num_components`. Not renormalized.
    pub direction: Vec<f64>,
    pub stf: SourceTimeFunction,
}

/// A source bound to its owning element.
pub struct LocalizedSource {
    pub source: Source,
    pub element: usize,
    pub xi: Vec<f64>,
}

/// A receiver before localization.
#[derive(Clone, Debug)]
pub struct Receiver {
    pub name: String,
    pub location: [f64; 3],
}

/// A receiver bound to its owning element, with its recorded trace.
pub struct LocalizedReceiver {
    pub receiver: Receiver,
    pub element: usize,
    pub xi: Vec<f64>,
    /// Cached interpolation row ℓ(ξ_rec), tensor order.
    pub interp: Vec<f64>,
    pub trace: Vec<f64>,
}

/// Two-pass localization: count owners without taking ownership, then
/// finalize on the smallest-ordinal owner.
fn find_owner(elements: &[Element], x: &[f64; 3]) -> Option<usize> {
    elements.iter().find(|el| el.contains(x)).map(|el| el.index)
}

pub fn localize_sources(sources: Vec<Source>, elements: &[Element]) -> Vec<LocalizedSource> {
    let mut out = Vec::with_capacity(sources.len());
    for source in sources {
        match find_owner(elements, &source.location) {
            Some(owner) => {
                let xi = elements[owner]
                    .inverse_map(&source.location)
                    .expect("owner contains the source");
                out.push(LocalizedSource {
                    source,
                    element: owner,
                    xi,
                });
            }
            None => {
                let err = EngineError::Localization {
                    kind: "source",
                    name: source.name.clone(),
                };
                warn!("{err}; dropping it");
            }
        }
    }
    out
}

pub fn localize_receivers(
    receivers: Vec<Receiver>,
    elements: &[Element],
) -> Vec<LocalizedReceiver> {
    let mut out = Vec::with_capacity(receivers.len());
    for receiver in receivers {
        match find_owner(elements, &receiver.location) {
            Some(owner) => {
                let el = &elements[owner];
                let xi = el
                    .inverse_map(&receiver.location)
                    .expect("owner contains the receiver");
                let interp = el.tables.interp(&xi);
                out.push(LocalizedReceiver {
                    receiver,
                    element: owner,
                    xi,
                    interp,
                    trace: Vec::new(),
                });
            }
            None => {
                let err = EngineError::Localization {
                    kind: "receiver",
                    name: receiver.name.clone(),
                };
                warn!("{err}; dropping it");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ricker_peak_and_decay() {
        let stf = SourceTimeFunction::Ricker {
            amplitude: 2.5,
            center_freq: 10.0,
            time_delay: 0.1,
        };
        // Peak value A at t = delay.
        assert!((stf.fire(0.1) - 2.5).abs() < 1e-14);
        // Below 1e-6 A outside delay ± 3/ν.
        for t in [0.1 - 0.31, 0.1 + 0.31, -1.0, 2.0] {
            assert!(stf.fire(t).abs() < 1e-6 * 2.5, "t = {}: {}", t, stf.fire(t));
        }
    }

    #[test]
    fn test_ricker_symmetry() {
        let stf = SourceTimeFunction::Ricker {
            amplitude: 1.0,
            center_freq: 4.0,
            time_delay: 0.5,
        };
        for dt in [0.01, 0.05, 0.12] {
            assert!((stf.fire(0.5 - dt) - stf.fire(0.5 + dt)).abs() < 1e-13);
        }
    }

    #[test]
    fn test_file_source_interpolation() {
        let stf = SourceTimeFunction::File {
            sample_interval: 0.5,
            samples: vec![0.0, 1.0, 0.0],
        };
        assert_eq!(stf.fire(0.25), 0.5);
        assert_eq!(stf.fire(0.5), 1.0);
        assert_eq!(stf.fire(0.75), 0.5);
        // Zero outside the tabulated range.
        assert_eq!(stf.fire(-0.1), 0.0);
        assert_eq!(stf.fire(5.0), 0.0);
    }

    #[test]
    fn test_localization_drops_outside_points() {
        use crate::reference::{Shape, Tables};
        let tables = Tables::new(Shape::Quad, 2).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let elements = vec![Element::new(0, tables, vtx).unwrap()];
        let inside = Source {
            name: "s0".into(),
            location: [0.5, 0.5, 0.0],
            num_components: 1,
            direction: vec![1.0],
            stf: SourceTimeFunction::Ricker {
                amplitude: 1.0,
                center_freq: 1.0,
                time_delay: 0.0,
            },
        };
        let mut outside = inside.clone();
        outside.name = "s1".into();
        outside.location = [5.0, 5.0, 0.0];
        let localized = localize_sources(vec![inside, outside], &elements);
        assert_eq!(localized.len(), 1);
        assert_eq!(localized[0].element, 0);
        assert!((localized[0].xi[0]).abs() < 1e-10);
        assert!((localized[0].xi[1]).abs() < 1e-10);
    }
}
