//! Region codes, grid emission factors, and the solar-irradiance region
//! type used to compensate dynamic difficulty.

use std::collections::HashMap;

/// Solar region tier controlling the difficulty compensation multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionType {
    /// Tibetan plateau codes: `CN-XZ`, `CN-QH`.
    TypeI,
    /// `CN-XJ`, `CN-GS`, `CN-NM`.
    TypeII,
    /// Everything else.
    TypeIII,
}

impl RegionType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "CN-XZ" | "CN-QH" => RegionType::TypeI,
            "CN-XJ" | "CN-GS" | "CN-NM" => RegionType::TypeII,
            _ => RegionType::TypeIII,
        }
    }

    /// Difficulty compensation multiplier.
    pub fn compensation(self) -> f64 {
        match self {
            RegionType::TypeI => 0.9,
            RegionType::TypeII => 1.0,
            RegionType::TypeIII => 1.2,
        }
    }
}

/// Region code to name to grid emission factor table, bit-exact for
/// compatibility.
#[derive(Debug, Clone)]
pub struct GridFactorTable {
    factors: HashMap<&'static str, (&'static str, f64)>,
}

impl GridFactorTable {
    pub fn new() -> Self {
        let mut factors = HashMap::new();
        factors.insert("CN-HB", ("华北", 0.920));
        factors.insert("CN-NE", ("东北", 0.776));
        factors.insert("CN-EC", ("华东", 0.681));
        factors.insert("CN-SC", ("华南", 0.587));
        factors.insert("CN-NW", ("西北", 0.724));
        factors.insert("CN-SW", ("西南", 0.628));
        Self { factors }
    }

    /// Grid emission factor in kgCO₂/kWh, or `None` if the region code has
    /// no known factor.
    pub fn factor(&self, region_code: &str) -> Option<f64> {
        self.factors.get(region_code).map(|(_, f)| *f)
    }

    pub fn name(&self, region_code: &str) -> Option<&'static str> {
        self.factors.get(region_code).map(|(n, _)| *n)
    }
}

impl Default for GridFactorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a free-text `location_tag` to a region code via a fixed
/// substring-match table, first match wins, default `CN-EC`.
pub fn resolve_region_code(location_tag: &str) -> &'static str {
    const HB: &[&str] = &["北京", "天津", "河北", "山西", "山东", "内蒙古"];
    const EC: &[&str] = &["上海", "江苏", "浙江", "安徽"];
    const SC: &[&str] = &["广东", "广西", "福建", "海南"];
    const XZ: &[&str] = &["西藏", "青海"];

    if HB.iter().any(|s| location_tag.contains(s)) {
        "CN-HB"
    } else if EC.iter().any(|s| location_tag.contains(s)) {
        "CN-EC"
    } else if SC.iter().any(|s| location_tag.contains(s)) {
        "CN-SC"
    } else if XZ.iter().any(|s| location_tag.contains(s)) {
        "CN-XZ"
    } else {
        "CN-EC"
    }
}
