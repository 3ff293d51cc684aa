// Mapping of raw label strings onto fixed ordinal levels

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::core::constants::{FALLBACK_LEVEL, NO_LABEL_LEVEL, NULL_SENTINEL};
use crate::core::error::{Result, WfbError};

// Resolution is total: unknown strings land on `Other`, absent, empty and
// "null" values go through the `null` entry, or `No_Label` without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorizer {
    levels: Vec<String>,
    mapper: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    /// A present value that missed the lookup table
    pub unmapped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    pub v: usize,
    pub label: String,
}

impl Categorizer {
    pub fn new<L, K, V>(levels: L, mapper: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        let mapper: HashMap<String, String> = mapper
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        for (i, level) in levels.iter().enumerate() {
            if levels[..i].contains(level) {
                return Err(WfbError::InvalidCategorizer(format!(
                    "duplicate level '{}'",
                    level
                )));
            }
        }

        for (raw, level) in &mapper {
            if !levels.contains(level) && level != FALLBACK_LEVEL && level != NO_LABEL_LEVEL {
                return Err(WfbError::InvalidCategorizer(format!(
                    "'{}' maps to unknown level '{}'",
                    raw, level
                )));
            }
        }

        append_fallbacks(&mut levels);
        Ok(Self { levels, mapper })
    }

    /// CEBAF C100 zones, north and south linac plus the injector.
    pub fn zone() -> Self {
        let zones = [
            "2L26", "2L25", "2L24", "2L23", "2L22", "1L26", "1L25", "1L24", "1L23", "1L22",
            "1L07", "0L04",
        ];
        Self::builtin(zones, zones.iter().map(|z| (*z, *z)))
    }

    pub fn cavity() -> Self {
        Self::builtin(
            ["Multi", "1", "2", "3", "4", "5", "6", "7", "8", "Other", "No_Label"],
            [
                ("Multi", "Multi"),
                ("multiple", "Multi"),
                ("0", "Multi"),
                ("1", "1"),
                ("2", "2"),
                ("3", "3"),
                ("4", "4"),
                ("5", "5"),
                ("6", "6"),
                ("7", "7"),
                ("8", "8"),
                ("Other", "Other"),
                ("null", "No_Label"),
                ("No_Label", "No_Label"),
            ],
        )
    }

    pub fn fault_type() -> Self {
        Self::builtin(
            [
                "Single_Cav",
                "Multi_Cav",
                "Quench",
                "E_Quench",
                "Quench_3ms",
                "Quench_100ms",
                "Microphonics",
                "Controls_Fault",
                "Other",
                "No_Label",
            ],
            [
                ("Single_Cav", "Single_Cav"),
                ("Single Cav Turn off", "Single_Cav"),
                ("Single Cavity Turn off", "Single_Cav"),
                ("Single Cavity Turn Off", "Single_Cav"),
                ("Multi_Cav", "Multi_Cav"),
                ("Multi Cav turn Off", "Multi_Cav"),
                ("Multi Cav Turn off", "Multi_Cav"),
                ("Multi Cav turn off", "Multi_Cav"),
                ("Multi Cavity turn Off", "Multi_Cav"),
                ("Multi Cavity Turn off", "Multi_Cav"),
                ("Multi Cavity Turn Off", "Multi_Cav"),
                ("Quench", "Quench"),
                ("E_Quench", "E_Quench"),
                ("Quench_3ms", "Quench_3ms"),
                ("Quench_100ms", "Quench_100ms"),
                ("Microphonics", "Microphonics"),
                ("Controls Fault", "Controls_Fault"),
                ("Controls_Fault", "Controls_Fault"),
                ("Other", "Other"),
                ("null", "No_Label"),
                ("No_Label", "No_Label"),
            ],
        )
    }

    // Built-in tables are checked by the tests below
    fn builtin<const N: usize>(
        levels: [&str; N],
        mapper: impl IntoIterator<Item = (&'static str, &'static str)>,
    ) -> Self {
        let mut levels: Vec<String> = levels.iter().map(|l| l.to_string()).collect();
        append_fallbacks(&mut levels);
        Self {
            levels,
            mapper: mapper
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn lookup(&self, raw: Option<&str>) -> (&str, bool) {
        match raw {
            None | Some("") | Some(NULL_SENTINEL) => (
                self.mapper
                    .get(NULL_SENTINEL)
                    .map(String::as_str)
                    .unwrap_or(NO_LABEL_LEVEL),
                false,
            ),
            Some(value) => match self.mapper.get(value) {
                Some(level) => (level.as_str(), false),
                None => (FALLBACK_LEVEL, true),
            },
        }
    }

    pub fn name(&self, raw: Option<&str>) -> &str {
        self.lookup(raw).0
    }

    pub fn resolve(&self, raw: Option<&str>) -> Resolution {
        let (name, unmapped) = self.lookup(raw);
        let index = self
            .levels
            .iter()
            .position(|l| l == name)
            // Both fallback levels are guaranteed present on construction
            .unwrap_or(self.levels.len() - 1);
        Resolution { index, unmapped }
    }

    pub fn numeric_value(&self, raw: Option<&str>) -> usize {
        self.resolve(raw).index
    }

    pub fn ticker(&self) -> Vec<Tick> {
        self.levels
            .iter()
            .enumerate()
            .map(|(v, label)| Tick {
                v,
                label: label.clone(),
            })
            .collect()
    }
}

fn append_fallbacks(levels: &mut Vec<String>) {
    for required in [FALLBACK_LEVEL, NO_LABEL_LEVEL] {
        if !levels.iter().any(|l| l == required) {
            levels.push(required.to_string());
        }
    }
}

// Counts present values that fell back to `Other`. Empty and "null" values
// resolve through the sentinel and are not tallied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnmappedLabels {
    counts: BTreeMap<String, usize>,
}

impl UnmappedLabels {
    pub fn resolve(&mut self, categorizer: &Categorizer, raw: Option<&str>) -> usize {
        let resolution = categorizer.resolve(raw);
        if resolution.unmapped {
            let value = raw.unwrap_or_default();
            let count = self.counts.entry(value.to_string()).or_insert(0);
            if *count == 0 {
                warn!("Unmapped label '{}' counted as {}", value, FALLBACK_LEVEL);
            }
            *count += 1;
        }
        resolution.index
    }

    pub fn get(&self, raw: &str) -> usize {
        self.counts.get(raw).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn merge(&mut self, other: UnmappedLabels) {
        for (raw, count) in other.counts {
            *self.counts.entry(raw).or_insert(0) += count;
        }
    }
}
