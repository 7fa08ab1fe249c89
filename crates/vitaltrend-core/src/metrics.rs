use serde::Serialize;

#[derive(Debug, Clone)]
pub struct MetricDef {
    pub key: &'static str,
    /// Top-level dataset keys holding this metric's records, in precedence order.
    pub dataset_keys: &'static [&'static str],
    pub display_name: &'static str,
    pub default_unit: &'static str,
}

macro_rules! define_metrics {
    ( $( $variant:ident = $index:expr => { key: $key:expr, dataset_keys: $keys:expr, display_name: $name:expr, default_unit: $unit:expr } ),+ $(,)? ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(usize)]
        pub enum MetricKind {
            $( $variant = $index ),+
        }

        impl MetricKind {
            pub const COUNT: usize = [ $( $index ),+ ].len();
            pub const ALL: [MetricKind; Self::COUNT] = [ $( MetricKind::$variant ),+ ];

            pub fn data(&self) -> &'static MetricDef {
                &METRICS[*self as usize]
            }

            pub fn as_str(&self) -> &'static str {
                self.data().key
            }

            pub fn dataset_keys(&self) -> &'static [&'static str] {
                self.data().dataset_keys
            }

            pub fn display_name(&self) -> &'static str {
                self.data().display_name
            }

            pub fn default_unit(&self) -> &'static str {
                self.data().default_unit
            }

            pub fn iter() -> impl Iterator<Item = MetricKind> {
                Self::ALL.iter().copied()
            }

            /// Accepts the canonical key or any dataset key alias.
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(s: &str) -> Option<MetricKind> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|m| m.as_str() == s || m.dataset_keys().contains(&s))
            }
        }

        pub const METRICS: [MetricDef; MetricKind::COUNT] = [
            $( MetricDef {
                key: $key,
                dataset_keys: $keys,
                display_name: $name,
                default_unit: $unit,
            } ),+
        ];

        const _: () = {
            let mut i = 0;
            $(
                assert!($index == i, "MetricKind indices must be sequential");
                i += 1;
                let _ = i;
            )+
        };
    };
}

define_metrics!(
    Weight = 0 => {
        key: "weight",
        dataset_keys: &["weights", "weight"],
        display_name: "Weight",
        default_unit: "kg"
    },
    HeartRate = 1 => {
        key: "heart_rate",
        dataset_keys: &["heartRates", "heart_rate"],
        display_name: "Heart Rate",
        default_unit: "bpm"
    },
    Activity = 2 => {
        key: "activity",
        dataset_keys: &["activities", "activity"],
        display_name: "Activity",
        default_unit: "steps"
    },
    Sleep = 3 => {
        key: "sleep",
        dataset_keys: &["sleeps", "sleep"],
        display_name: "Sleep",
        default_unit: "hours"
    },
);

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
