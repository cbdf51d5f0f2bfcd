use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::disaster::{DisasterKind, Horizon, RequestKey};
use crate::geojson::Feature;

/// Complete forecast results of one poll cycle.
///
/// Built once from a finished grid and never edited afterwards; a new cycle
/// replaces the whole value. Ordered maps keep serialization and iteration
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    /// Publication sequence number; `0` until published by a cache.
    #[serde(default)]
    pub cycle: u64,
    pub forecasts: BTreeMap<DisasterKind, BTreeMap<Horizon, Vec<Feature>>>,
}

impl ForecastSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from resolved grid cells. Later duplicates win.
    pub fn from_cells(cells: impl IntoIterator<Item = (RequestKey, Vec<Feature>)>) -> Self {
        let mut forecasts: BTreeMap<DisasterKind, BTreeMap<Horizon, Vec<Feature>>> =
            BTreeMap::new();
        for (key, features) in cells {
            forecasts
                .entry(key.disaster)
                .or_default()
                .insert(key.horizon, features);
        }
        Self {
            cycle: 0,
            forecasts,
        }
    }

    /// Features for one cell; empty when the cell is absent.
    pub fn features(&self, disaster: DisasterKind, horizon: Horizon) -> &[Feature] {
        self.forecasts
            .get(&disaster)
            .and_then(|by_horizon| by_horizon.get(&horizon))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, key: RequestKey) -> bool {
        self.forecasts
            .get(&key.disaster)
            .is_some_and(|by_horizon| by_horizon.contains_key(&key.horizon))
    }

    pub fn keys(&self) -> impl Iterator<Item = RequestKey> + '_ {
        self.forecasts.iter().flat_map(|(disaster, by_horizon)| {
            by_horizon
                .keys()
                .map(move |horizon| RequestKey::new(*disaster, *horizon))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.forecasts.values().map(BTreeMap::len).sum()
    }

    pub fn feature_count(&self) -> usize {
        self.forecasts
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ForecastSnapshot;
    use crate::disaster::{DisasterKind, Horizon, RequestKey};
    use crate::geojson::{Feature, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(kind: DisasterKind, hours: u32) -> RequestKey {
        RequestKey::new(kind, Horizon::new(hours).expect("horizon"))
    }

    #[test]
    fn indexes_cells_by_kind_and_horizon() {
        let snap = ForecastSnapshot::from_cells([
            (
                key(DisasterKind::Fires, 6),
                vec![Feature::new(Geometry::point(1.0, 2.0))],
            ),
            (key(DisasterKind::Floods, 12), vec![]),
        ]);

        assert_eq!(snap.cell_count(), 2);
        assert_eq!(snap.feature_count(), 1);
        assert!(snap.contains(key(DisasterKind::Floods, 12)));
        assert!(!snap.contains(key(DisasterKind::Floods, 6)));
        assert_eq!(
            snap.features(DisasterKind::Fires, Horizon::new(6).expect("h")).len(),
            1
        );
        assert!(
            snap.features(DisasterKind::Landslides, Horizon::new(6).expect("h"))
                .is_empty()
        );
        assert_eq!(
            snap.keys().collect::<Vec<_>>(),
            vec![key(DisasterKind::Fires, 6), key(DisasterKind::Floods, 12)]
        );
    }

    #[test]
    fn serializes_as_nested_maps() {
        let snap = ForecastSnapshot::from_cells([(key(DisasterKind::Landslides, 24), vec![])]);
        assert_eq!(
            serde_json::to_value(&snap).expect("serialize"),
            json!({ "cycle": 0, "forecasts": { "landslides": { "24": [] } } })
        );

        let back: ForecastSnapshot =
            serde_json::from_value(serde_json::to_value(&snap).expect("serialize"))
                .expect("deserialize");
        assert_eq!(back, snap);
    }
}
