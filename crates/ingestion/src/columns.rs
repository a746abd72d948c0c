//! Header normalization.
//!
//! Maps the header spellings seen across exchange downloads and broker
//! exports onto the canonical field names.

use delivery_core::Field;

/// Known header spellings (after normalization) and the field they name.
static SYNONYMS: &[(&str, Field)] = &[
    ("symbol", Field::Symbol),
    ("date", Field::Date),
    ("qty_traded", Field::TradedQty),
    ("total_traded_quantity", Field::TradedQty),
    ("traded_qty", Field::TradedQty),
    ("deliverable_qty", Field::DeliverableQty),
    ("delivered_qty", Field::DeliverableQty),
    ("delivery_percentage", Field::DeliveryPct),
    ("delivery_percent", Field::DeliveryPct),
    ("%_dly_qt_to_traded_qty", Field::DeliveryPct),
    ("delivery_pct", Field::DeliveryPct),
    ("closeprice", Field::Close),
    ("close_price", Field::Close),
    ("closing_price", Field::Close),
    ("close", Field::Close),
    ("open_price", Field::Open),
    ("open", Field::Open),
];

/// Trim, lowercase and replace spaces with underscores.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Field named by a raw header, if it is a known spelling.
pub fn lookup_field(raw: &str) -> Option<Field> {
    let key = normalize_header(raw);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|&(_, field)| field)
}

/// Canonical column name for a raw header. Unknown headers come back
/// normalized but otherwise unchanged.
pub fn canonical_name(raw: &str) -> String {
    match lookup_field(raw) {
        Some(field) => field.as_str().to_string(),
        None => normalize_header(raw),
    }
}

/// Column positions of the canonical fields in a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub symbol: Option<usize>,
    pub date: Option<usize>,
    pub traded_qty: Option<usize>,
    pub deliverable_qty: Option<usize>,
    pub delivery_pct: Option<usize>,
    pub open: Option<usize>,
    pub close: Option<usize>,
}

impl ColumnMap {
    /// Resolve a header row. The first column naming a field wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = lookup_field(header.as_ref()) {
                let slot = map.slot_mut(field);
                if slot.is_none() {
                    *slot = Some(idx);
                }
            }
        }
        map
    }

    /// Column index of a field.
    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Symbol => self.symbol,
            Field::Date => self.date,
            Field::TradedQty => self.traded_qty,
            Field::DeliverableQty => self.deliverable_qty,
            Field::DeliveryPct => self.delivery_pct,
            Field::Open => self.open,
            Field::Close => self.close,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Symbol => &mut self.symbol,
            Field::Date => &mut self.date,
            Field::TradedQty => &mut self.traded_qty,
            Field::DeliverableQty => &mut self.deliverable_qty,
            Field::DeliveryPct => &mut self.delivery_pct,
            Field::Open => &mut self.open,
            Field::Close => &mut self.close,
        }
    }

    /// Required fields with no matching column, in schema order.
    pub fn missing_required(&self) -> Vec<Field> {
        Field::REQUIRED
            .iter()
            .copied()
            .filter(|&field| self.get(field).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Traded Qty "), "traded_qty");
        assert_eq!(normalize_header("% Dly Qt to Traded Qty"), "%_dly_qt_to_traded_qty");
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(canonical_name("Total Traded Quantity"), "traded_qty");
        assert_eq!(canonical_name("QTY TRADED"), "traded_qty");
        assert_eq!(canonical_name("Delivered Qty"), "deliverable_qty");
        assert_eq!(canonical_name("% Dly Qt to Traded Qty"), "delivery_pct");
        assert_eq!(canonical_name("Delivery Percentage"), "delivery_pct");
        assert_eq!(canonical_name("ClosePrice"), "close");
        assert_eq!(canonical_name("Closing Price"), "close");
        assert_eq!(canonical_name("Open Price"), "open");
        assert_eq!(canonical_name(" Symbol"), "symbol");
    }

    #[test]
    fn test_unknown_header_passes_through() {
        assert_eq!(canonical_name("Series"), "series");
        assert_eq!(canonical_name("No. of Trades"), "no._of_trades");
        assert!(lookup_field("Series").is_none());
    }

    #[test]
    fn test_column_map() {
        let headers = [
            "Symbol",
            "Series",
            "Date",
            "Close Price",
            "Total Traded Quantity",
            "Deliverable Qty",
            "% Dly Qt to Traded Qty",
        ];
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(map.symbol, Some(0));
        assert_eq!(map.date, Some(2));
        assert_eq!(map.close, Some(3));
        assert_eq!(map.traded_qty, Some(4));
        assert_eq!(map.delivery_pct, Some(6));
        assert_eq!(map.open, None);
        assert!(map.missing_required().is_empty());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let map = ColumnMap::from_headers(&["close", "Close Price"]);
        assert_eq!(map.close, Some(0));
    }

    #[test]
    fn test_missing_required() {
        let map = ColumnMap::from_headers(&["Symbol", "Date", "Traded Qty", "Delivery %"]);
        assert_eq!(
            map.missing_required(),
            vec![Field::DeliverableQty, Field::DeliveryPct]
        );
    }
}
