//! StockBar — one cleaned daily row of an instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The numeric columns every emitted row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Open,
    Close,
    High,
    Low,
    ChangePct,
    Volume,
    TurnoverRate,
    Pe,
    Pb,
}

impl NumericField {
    pub const COUNT: usize = 9;

    pub const ALL: [NumericField; Self::COUNT] = [
        NumericField::Open,
        NumericField::Close,
        NumericField::High,
        NumericField::Low,
        NumericField::ChangePct,
        NumericField::Volume,
        NumericField::TurnoverRate,
        NumericField::Pe,
        NumericField::Pb,
    ];

    /// Canonical (normalized) CSV column name.
    pub fn column_name(self) -> &'static str {
        match self {
            NumericField::Open => "open",
            NumericField::Close => "close",
            NumericField::High => "high",
            NumericField::Low => "low",
            NumericField::ChangePct => "change_pct",
            NumericField::Volume => "volume",
            NumericField::TurnoverRate => "turnover_rate",
            NumericField::Pe => "pe",
            NumericField::Pb => "pb",
        }
    }

    /// Look up a field by its normalized column name.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }

    /// Position of this field in [`NumericField::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Coerce a raw cell to a finite number.
///
/// Missing, empty, unparseable and non-finite values all become `0.0`.
pub fn clean_numeric(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .map(clean_value)
        .unwrap_or(0.0)
}

/// Coerce an already-parsed value: non-finite becomes `0.0`.
pub fn clean_value(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Daily row as emitted to callers. `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub change_pct: f64,
    pub volume: f64,
    pub turnover_rate: f64,
    pub pe: f64,
    pub pb: f64,
}

impl StockBar {
    /// Build a row from raw text cells indexed by [`NumericField::index`].
    pub fn from_cells(date: NaiveDate, cells: &[Option<String>; NumericField::COUNT]) -> Self {
        let mut bar = Self::zeroed(date);
        for field in NumericField::ALL {
            bar.set(field, clean_numeric(cells[field.index()].as_deref()));
        }
        bar
    }

    /// A row with every numeric field at zero.
    pub fn zeroed(date: NaiveDate) -> Self {
        Self {
            date,
            open: 0.0,
            close: 0.0,
            high: 0.0,
            low: 0.0,
            change_pct: 0.0,
            volume: 0.0,
            turnover_rate: 0.0,
            pe: 0.0,
            pb: 0.0,
        }
    }

    pub fn get(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Open => self.open,
            NumericField::Close => self.close,
            NumericField::High => self.high,
            NumericField::Low => self.low,
            NumericField::ChangePct => self.change_pct,
            NumericField::Volume => self.volume,
            NumericField::TurnoverRate => self.turnover_rate,
            NumericField::Pe => self.pe,
            NumericField::Pb => self.pb,
        }
    }

    pub fn set(&mut self, field: NumericField, value: f64) {
        let slot = match field {
            NumericField::Open => &mut self.open,
            NumericField::Close => &mut self.close,
            NumericField::High => &mut self.high,
            NumericField::Low => &mut self.low,
            NumericField::ChangePct => &mut self.change_pct,
            NumericField::Volume => &mut self.volume,
            NumericField::TurnoverRate => &mut self.turnover_rate,
            NumericField::Pe => &mut self.pe,
            NumericField::Pb => &mut self.pb,
        };
        *slot = value;
    }

    /// Re-apply numeric coercion. A no-op on rows built by [`StockBar::from_cells`].
    pub fn sanitized(&self) -> Self {
        let mut bar = self.clone();
        for field in NumericField::ALL {
            bar.set(field, clean_value(self.get(field)));
        }
        bar
    }

    /// True if every numeric field is finite.
    pub fn is_clean(&self) -> bool {
        NumericField::ALL.iter().all(|f| self.get(*f).is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: [Option<&str>; NumericField::COUNT]) -> [Option<String>; NumericField::COUNT] {
        values.map(|v| v.map(String::from))
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 4).unwrap()
    }

    #[test]
    fn field_indices_follow_all_order() {
        for (i, field) in NumericField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(NumericField::from_column(field.column_name()), Some(*field));
        }
        assert_eq!(NumericField::from_column("date"), None);
    }

    #[test]
    fn clean_numeric_coerces_garbage_to_zero() {
        assert_eq!(clean_numeric(Some(" 12.5 ")), 12.5);
        assert_eq!(clean_numeric(Some("-3")), -3.0);
        assert_eq!(clean_numeric(Some("")), 0.0);
        assert_eq!(clean_numeric(Some("--")), 0.0);
        assert_eq!(clean_numeric(Some("NaN")), 0.0);
        assert_eq!(clean_numeric(Some("inf")), 0.0);
        assert_eq!(clean_numeric(None), 0.0);
    }

    #[test]
    fn from_cells_fills_every_field() {
        let bar = StockBar::from_cells(
            day(),
            &cells([
                Some("10.0"),
                Some("10.5"),
                Some("11"),
                Some("9.8"),
                Some("5.0"),
                Some("120000"),
                Some("1.2"),
                None,
                Some("bad"),
            ]),
        );
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.close, 10.5);
        assert_eq!(bar.high, 11.0);
        assert_eq!(bar.low, 9.8);
        assert_eq!(bar.change_pct, 5.0);
        assert_eq!(bar.volume, 120_000.0);
        assert_eq!(bar.turnover_rate, 1.2);
        assert_eq!(bar.pe, 0.0);
        assert_eq!(bar.pb, 0.0);
        assert!(bar.is_clean());
    }

    #[test]
    fn sanitize_is_idempotent() {
        let bar = StockBar::from_cells(day(), &cells([Some("1.5"); NumericField::COUNT]));
        assert_eq!(bar.sanitized(), bar);
        assert_eq!(bar.sanitized().sanitized(), bar);
    }

    #[test]
    fn sanitize_clears_non_finite_values() {
        let mut bar = StockBar::zeroed(day());
        bar.pe = f64::NAN;
        bar.volume = f64::INFINITY;
        assert!(!bar.is_clean());
        let clean = bar.sanitized();
        assert!(clean.is_clean());
        assert_eq!(clean.pe, 0.0);
        assert_eq!(clean.volume, 0.0);
    }

    #[test]
    fn date_serializes_as_iso_day() {
        let bar = StockBar::zeroed(day());
        let json = serde_json::to_value(&bar).unwrap();
        assert_eq!(json["date"], "2019-03-04");
        assert_eq!(json["pe"], 0.0);
        let back: StockBar = serde_json::from_value(json).unwrap();
        assert_eq!(back, bar);
    }
}
