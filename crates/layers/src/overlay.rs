use std::f64::consts::TAU;
use std::time::Duration;

use forecast::{DisasterKind, ForecastSnapshot, Horizon};
use serde::Serialize;

use crate::projector::{RenderPrimitive, project_feature};
use crate::satellites::SatelliteMarker;
use crate::symbology::StyleTable;

/// Angular speed of the first horizon group, in radians per second. Group `i`
/// turns at `(i + 1)` times this rate.
pub const HORIZON_SPIN_RATE: f64 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisasterLayer {
    pub disaster: DisasterKind,
    pub primitives: Vec<RenderPrimitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonGroup {
    pub horizon: Horizon,
    pub index: usize,
    pub rotation_rad: f64,
    pub layers: Vec<DisasterLayer>,
}

impl HorizonGroup {
    pub fn layer(&self, disaster: DisasterKind) -> Option<&DisasterLayer> {
        self.layers.iter().find(|l| l.disaster == disaster)
    }

    pub fn primitive_count(&self) -> usize {
        self.layers.iter().map(|l| l.primitives.len()).sum()
    }
}

/// Everything drawn over the globe for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub cycle: u64,
    pub groups: Vec<HorizonGroup>,
    pub satellites: Vec<SatelliteMarker>,
}

impl OverlayFrame {
    pub fn primitive_count(&self) -> usize {
        self.groups.iter().map(HorizonGroup::primitive_count).sum()
    }
}

/// Turns the latest forecast snapshot into per-horizon primitive groups.
///
/// Primitives are in the globe frame; each group carries the rotation a
/// renderer applies about the polar axis. See [`OverlayRenderer::render_rotated`]
/// for primitives with the rotation already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRenderer {
    styles: StyleTable,
    horizons: Vec<Horizon>,
}

impl OverlayRenderer {
    pub fn new(styles: StyleTable, horizons: Vec<Horizon>) -> Self {
        Self { styles, horizons }
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn render(&self, snapshot: &ForecastSnapshot, elapsed: Duration) -> OverlayFrame {
        let groups = self
            .horizons
            .iter()
            .enumerate()
            .map(|(index, &horizon)| HorizonGroup {
                horizon,
                index,
                rotation_rad: horizon_rotation(index, elapsed),
                layers: DisasterKind::ALL
                    .into_iter()
                    .map(|disaster| {
                        let style = self.styles.get(disaster);
                        DisasterLayer {
                            disaster,
                            primitives: snapshot
                                .features(disaster, horizon)
                                .iter()
                                .flat_map(|f| project_feature(f, style, index))
                                .collect(),
                        }
                    })
                    .collect(),
            })
            .collect();

        OverlayFrame {
            cycle: snapshot.cycle,
            groups,
            satellites: Vec::new(),
        }
    }

    pub fn render_rotated(&self, snapshot: &ForecastSnapshot, elapsed: Duration) -> OverlayFrame {
        let mut frame = self.render(snapshot, elapsed);
        for group in &mut frame.groups {
            let angle = group.rotation_rad;
            for layer in &mut group.layers {
                for p in &mut layer.primitives {
                    *p = p.rotated_y(angle);
                }
            }
            group.rotation_rad = 0.0;
        }
        frame
    }
}

/// Rotation of horizon group `index` after `elapsed`, in `[0, 2pi)`.
pub fn horizon_rotation(index: usize, elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * HORIZON_SPIN_RATE * (index + 1) as f64).rem_euclid(TAU)
}
