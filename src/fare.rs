use serde::{Deserialize, Serialize};

/// Distance based fare in rupiah: a flat per-km rate with a minimum charge.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FareTable {
    pub base_idr: u64,
    pub per_km_idr: f64,
}

impl Default for FareTable {
    fn default() -> FareTable {
        FareTable { base_idr: 7000, per_km_idr: 7000.0 }
    }
}

impl FareTable {
    pub fn estimate(&self, distance_km: f64) -> u64 {
        let metered = (distance_km.max(0.0) * self.per_km_idr).round() as u64;
        metered.max(self.base_idr)
    }
}

pub fn estimate_fare(distance_km: f64) -> u64 {
    FareTable::default().estimate(distance_km)
}

/// Formats an amount the way the order screens show it, e.g. `Rp 25.000`.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {}", grouped)
}
