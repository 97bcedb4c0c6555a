use crate::domain::PriceField;
use serde::{Deserialize, Serialize};

/// A single named feature slot. The engine only knows how to derive these
/// kinds; anything else in a schema is rejected at forecast time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Value of a price field `offset` rows back.
    Lag { field: PriceField, offset: usize },
    /// Previous row's traded volume.
    VolumeLag,
    /// Simple moving average of a price field over the trailing `window` rows.
    MovingAverage { field: PriceField, window: usize },
    /// One-period difference of a price field.
    Change { field: PriceField },
}

impl FeatureKind {
    /// Column name matching the historical CSV layout (`Close_t-1`,
    /// `Volume_t-1`, `Close_MA_5`, `Close_Change`, ...).
    pub fn name(&self) -> String {
        match self {
            FeatureKind::Lag { field, offset } => format!("{}_t-{}", field, offset),
            FeatureKind::VolumeLag => "Volume_t-1".to_string(),
            FeatureKind::MovingAverage { field, window } => format!("{}_MA_{}", field, window),
            FeatureKind::Change { field } => format!("{}_Change", field),
        }
    }

    /// First row index at which this feature is defined.
    /// A window-`w` moving average needs `w` prior rows, a lag-`o` needs `o`.
    pub fn min_index(&self) -> usize {
        match self {
            FeatureKind::Lag { offset, .. } => *offset,
            FeatureKind::VolumeLag => 1,
            FeatureKind::MovingAverage { window, .. } => *window,
            FeatureKind::Change { .. } => 1,
        }
    }
}

/// Ordered feature layout, fixed at training time and carried alongside the
/// trained model. Column positions are load-bearing: the scaler and the
/// regressor treat vectors positionally, so the same schema must produce
/// every vector the model ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    target: PriceField,
    slots: Vec<FeatureKind>,
}

impl FeatureSchema {
    /// Canonical 7-slot layout for a target `T`:
    /// `[T_t-1, T_t-2, T_t-3, Volume_t-1, T_MA_5, T_MA_10, T_Change]`.
    pub fn canonical(target: PriceField) -> Self {
        let slots = vec![
            FeatureKind::Lag { field: target, offset: 1 },
            FeatureKind::Lag { field: target, offset: 2 },
            FeatureKind::Lag { field: target, offset: 3 },
            FeatureKind::VolumeLag,
            FeatureKind::MovingAverage { field: target, window: 5 },
            FeatureKind::MovingAverage { field: target, window: 10 },
            FeatureKind::Change { field: target },
        ];
        Self { target, slots }
    }

    pub fn target(&self) -> PriceField {
        self.target
    }

    pub fn slots(&self) -> &[FeatureKind] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First row index at which every slot is defined. Rows before this are
    /// dropped when building the dataset.
    pub fn max_lookback(&self) -> usize {
        self.slots.iter().map(FeatureKind::min_index).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_is_fixed() {
        let schema = FeatureSchema::canonical(PriceField::Close);
        let names: Vec<String> = schema.slots().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "Close_t-1",
                "Close_t-2",
                "Close_t-3",
                "Volume_t-1",
                "Close_MA_5",
                "Close_MA_10",
                "Close_Change",
            ]
        );
    }

    #[test]
    fn test_canonical_length() {
        let schema = FeatureSchema::canonical(PriceField::High);
        assert_eq!(schema.len(), 7);
        assert!(!schema.is_empty());
        assert_eq!(schema.target(), PriceField::High);
    }

    #[test]
    fn test_max_lookback_is_ma10() {
        let schema = FeatureSchema::canonical(PriceField::Close);
        // The 10-period MA is the widest undefined window.
        assert_eq!(schema.max_lookback(), 10);
    }

    #[test]
    fn test_min_index_per_kind() {
        let lag3 = FeatureKind::Lag { field: PriceField::Close, offset: 3 };
        assert_eq!(lag3.min_index(), 3);
        assert_eq!(FeatureKind::VolumeLag.min_index(), 1);
        let ma5 = FeatureKind::MovingAverage { field: PriceField::Close, window: 5 };
        assert_eq!(ma5.min_index(), 5);
        let chg = FeatureKind::Change { field: PriceField::Close };
        assert_eq!(chg.min_index(), 1);
    }

    #[test]
    fn test_names_follow_target() {
        let schema = FeatureSchema::canonical(PriceField::Open);
        assert_eq!(schema.slots()[0].name(), "Open_t-1");
        assert_eq!(schema.slots()[4].name(), "Open_MA_5");
        assert_eq!(schema.slots()[6].name(), "Open_Change");
        // Volume lag does not depend on the target
        assert_eq!(schema.slots()[3].name(), "Volume_t-1");
    }

    #[test]
    fn test_schema_equality() {
        let a = FeatureSchema::canonical(PriceField::Close);
        let b = FeatureSchema::canonical(PriceField::Close);
        let c = FeatureSchema::canonical(PriceField::Low);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
