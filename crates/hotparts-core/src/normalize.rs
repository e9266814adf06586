//! Record normalizer: one raw sheet in, canonical records out.
//!
//! Pipeline:
//!   RawSheet + Provenance
//!     └─ ColumnMap::resolve()   → column index per role (or SchemaError)
//!          └─ Records iterator  → clean_* per cell → DemandRecord / SupplyRecord
//!
//! Column roles are declared as data in [`DEMAND_ROLES`] and
//! [`SUPPLY_ROLES`]. New header variants are added there, not in code.

use chrono::NaiveDate;
use rust_decimal::{
  Decimal, RoundingStrategy,
  prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
  error::SchemaError,
  record::{DemandRecord, RecordKind, SupplyRecord, normalize_mpn},
  sheet::{Cell, Provenance, RawSheet},
};

/// Multiplier applied to every raw supply price at ingestion (12% markup).
pub const SUPPLY_MARKUP: Decimal = Decimal::from_parts(112, 0, 0, false, 2);

/// Decimal places kept after the markup.
pub const PRICE_SCALE: u32 = 2;

// ─── Role tables ─────────────────────────────────────────────────────────────

/// What a column means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Part,
  Quantity,
  Price,
  Manufacturer,
  ProductClass,
  Description,
}

/// One priority tier for finding a column. Comparisons ignore case and
/// surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
  /// The label equals this text.
  Exact(&'static str),
  /// The label contains any of these substrings. The first column (in
  /// column order) that does wins the tier.
  ContainsAny(&'static [&'static str]),
}

impl Matcher {
  pub fn matches(&self, label: &str) -> bool {
    let label = label.trim().to_lowercase();
    match self {
      Self::Exact(want) => label == want.to_lowercase(),
      Self::ContainsAny(needles) => {
        needles.iter().any(|n| label.contains(&n.to_lowercase()))
      }
    }
  }
}

/// Tiers for one role, tried in order until one finds an unclaimed column.
#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
  pub role:  Role,
  pub tiers: &'static [Matcher],
}

const PART_TIERS: &[Matcher] = &[Matcher::ContainsAny(&["mpn"])];

const MANUFACTURER_TIERS: &[Matcher] = &[
  Matcher::Exact("MFG"),
  Matcher::Exact("Manufacturer"),
  Matcher::ContainsAny(&["manufacturer", "mfg", "mfr"]),
];

/// Column roles for demand ("hot parts") sheets.
pub const DEMAND_ROLES: &[RoleRule] = &[
  RoleRule { role: Role::Part, tiers: PART_TIERS },
  RoleRule {
    role:  Role::Quantity,
    tiers: &[
      Matcher::Exact("Reqs Count"),
      Matcher::ContainsAny(&["reqs"]),
      Matcher::Exact("QTY"),
      Matcher::Exact("Stock QTY"),
      Matcher::ContainsAny(&["qty", "quantity", "stock"]),
    ],
  },
  RoleRule { role: Role::Manufacturer, tiers: MANUFACTURER_TIERS },
  RoleRule {
    role:  Role::ProductClass,
    tiers: &[
      Matcher::ContainsAny(&["product class", "productclass"]),
      Matcher::Exact("Class"),
    ],
  },
  RoleRule {
    role:  Role::Description,
    tiers: &[Matcher::ContainsAny(&["description"]), Matcher::Exact("Desc")],
  },
];

/// Column roles for supply ("excess inventory") sheets.
pub const SUPPLY_ROLES: &[RoleRule] = &[
  RoleRule { role: Role::Part, tiers: PART_TIERS },
  RoleRule {
    role:  Role::Quantity,
    tiers: &[
      Matcher::Exact("QTY"),
      Matcher::Exact("Stock QTY"),
      Matcher::ContainsAny(&["qty", "quantity", "stock"]),
    ],
  },
  RoleRule {
    role:  Role::Price,
    tiers: &[
      Matcher::Exact("Price"),
      Matcher::ContainsAny(&["price", "target", "cost"]),
    ],
  },
  RoleRule { role: Role::Manufacturer, tiers: MANUFACTURER_TIERS },
];

// ─── Column resolution ───────────────────────────────────────────────────────

/// Column index per role for one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
  pub part:          Option<usize>,
  pub quantity:      Option<usize>,
  pub price:         Option<usize>,
  pub manufacturer:  Option<usize>,
  pub product_class: Option<usize>,
  pub description:   Option<usize>,
}

impl ColumnMap {
  /// Resolve `rules` against `headers` in rule order. A column claimed by an
  /// earlier role is never reused by a later one.
  pub fn resolve(headers: &[String], rules: &[RoleRule]) -> Self {
    let mut map = Self::default();
    let mut claimed = vec![false; headers.len()];

    for rule in rules {
      let found = rule.tiers.iter().find_map(|tier| {
        headers
          .iter()
          .enumerate()
          .find(|(i, label)| !claimed[*i] && tier.matches(label))
          .map(|(i, _)| i)
      });
      if let Some(i) = found {
        claimed[i] = true;
        map.set(rule.role, i);
      }
    }

    map
  }

  fn set(&mut self, role: Role, column: usize) {
    let slot = match role {
      Role::Part => &mut self.part,
      Role::Quantity => &mut self.quantity,
      Role::Price => &mut self.price,
      Role::Manufacturer => &mut self.manufacturer,
      Role::ProductClass => &mut self.product_class,
      Role::Description => &mut self.description,
    };
    *slot = Some(column);
  }
}

// ─── Value cleaning ──────────────────────────────────────────────────────────

/// Part identifier: trimmed and upper-cased; empty becomes `None`.
pub fn clean_mpn(cell: &Cell) -> Option<String> {
  let text = cell.as_text()?;
  let mpn = normalize_mpn(&text);
  (!mpn.is_empty()).then_some(mpn)
}

/// Free text: trimmed; empty becomes `None`.
pub fn clean_text(cell: &Cell) -> Option<String> {
  let text = cell.as_text()?;
  let trimmed = text.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Quantity: thousands separators and whitespace removed, then an integer
/// parse. Decimal values are truncated; negative or non-numeric values
/// become `None`.
pub fn clean_quantity(cell: &Cell) -> Option<u64> {
  match cell {
    Cell::Empty => None,
    Cell::Number(n) => {
      (n.is_finite() && *n >= 0.0).then(|| n.trunc()).and_then(|n| n.to_u64())
    }
    Cell::Text(s) => {
      let digits: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
      if digits.is_empty() {
        return None;
      }
      if let Ok(n) = digits.parse::<u64>() {
        return Some(n);
      }
      let value: Decimal = digits.parse().ok()?;
      if value.is_sign_negative() {
        return None;
      }
      value.trunc().to_u64()
    }
  }
}

fn is_currency_symbol(c: char) -> bool { matches!(c, '$' | '€' | '£' | '¥') }

/// Raw price: currency symbols, thousands separators and whitespace removed,
/// then a decimal parse. Negative or unparsable values become `None`; an
/// absent price is never turned into zero.
pub fn clean_price(cell: &Cell) -> Option<Decimal> {
  let value = match cell {
    Cell::Empty => return None,
    Cell::Number(n) if n.is_finite() => Decimal::from_f64(*n)?,
    Cell::Number(_) => return None,
    Cell::Text(s) => {
      let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !is_currency_symbol(*c))
        .collect();
      if cleaned.is_empty() {
        return None;
      }
      cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?
    }
  };
  (!value.is_sign_negative()).then_some(value)
}

/// Apply the supply markup and round to [`PRICE_SCALE`] places.
pub fn apply_markup(price: Decimal) -> Decimal {
  (price * SUPPLY_MARKUP)
    .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

// ─── Period labels ───────────────────────────────────────────────────────────

/// Find the first `YYYY.MM.DD` token in `s` that is a real calendar date.
pub fn period_token(s: &str) -> Option<&str> {
  let bytes = s.as_bytes();
  if bytes.len() < 10 {
    return None;
  }
  (0..=bytes.len() - 10).find_map(|i| {
    let w = &bytes[i..i + 10];
    let shaped = w.iter().enumerate().all(|(j, b)| match j {
      4 | 7 => *b == b'.',
      _ => b.is_ascii_digit(),
    });
    if !shaped {
      return None;
    }
    let token = &s[i..i + 10];
    NaiveDate::parse_from_str(token, "%Y.%m.%d").ok().map(|_| token)
  })
}

/// The period a demand sheet describes: the sheet name when it carries a
/// date, otherwise the document name.
pub fn resolve_period(provenance: &Provenance) -> Option<String> {
  period_token(&provenance.sheet)
    .or_else(|| period_token(&provenance.document))
    .map(str::to_owned)
}

// ─── Records iterator ────────────────────────────────────────────────────────

type BuildFn<R> = fn(&RowContext<'_>, usize) -> Option<R>;

struct RowContext<'a> {
  sheet:      &'a RawSheet,
  provenance: &'a Provenance,
  columns:    ColumnMap,
  part:       usize,
  period:     String,
}

impl RowContext<'_> {
  fn cell(&self, row: usize, column: Option<usize>) -> Option<&Cell> {
    column.map(|c| self.sheet.cell(row, c))
  }

  fn is_blank(&self, row: usize) -> bool {
    self
      .sheet
      .rows
      .get(row)
      .is_none_or(|cells| cells.iter().all(Cell::is_empty))
  }

  /// The cleaned part identifier, or an empty string for a row that has
  /// data but no usable MPN. The merge rejects the latter as invalid.
  fn mpn(&self, row: usize) -> String {
    clean_mpn(self.sheet.cell(row, self.part)).unwrap_or_default()
  }
}

/// Lazy, restartable sequence of records from one sheet. Blank rows are
/// dropped; every other row yields a record, even when its part identifier
/// is empty.
pub struct Records<'a, R> {
  ctx:   RowContext<'a>,
  row:   usize,
  build: BuildFn<R>,
}

impl<R> Records<'_, R> {
  /// Rewind to the first row.
  pub fn restart(&mut self) { self.row = 0; }
}

impl<R> Iterator for Records<'_, R> {
  type Item = R;

  fn next(&mut self) -> Option<R> {
    while self.row < self.ctx.sheet.rows.len() {
      let row = self.row;
      self.row += 1;
      if let Some(record) = (self.build)(&self.ctx, row) {
        return Some(record);
      }
    }
    None
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.ctx.sheet.rows.len().saturating_sub(self.row)))
  }
}

fn build_demand(ctx: &RowContext<'_>, row: usize) -> Option<DemandRecord> {
  if ctx.is_blank(row) {
    return None;
  }
  Some(DemandRecord {
    mpn: ctx.mpn(row),
    period: ctx.period.clone(),
    reqs_count: ctx.cell(row, ctx.columns.quantity).and_then(clean_quantity),
    manufacturer: ctx.cell(row, ctx.columns.manufacturer).and_then(clean_text),
    product_class: ctx.cell(row, ctx.columns.product_class).and_then(clean_text),
    description: ctx.cell(row, ctx.columns.description).and_then(clean_text),
    source: ctx.provenance.document.clone(),
  })
}

fn build_supply(ctx: &RowContext<'_>, row: usize) -> Option<SupplyRecord> {
  if ctx.is_blank(row) {
    return None;
  }
  Some(SupplyRecord {
    mpn: ctx.mpn(row),
    document: ctx.provenance.document.clone(),
    quantity: ctx.cell(row, ctx.columns.quantity).and_then(clean_quantity),
    price: ctx
      .cell(row, ctx.columns.price)
      .and_then(clean_price)
      .map(apply_markup),
    manufacturer: ctx.cell(row, ctx.columns.manufacturer).and_then(clean_text),
    sheet: ctx.provenance.sheet.clone(),
  })
}

fn part_column(
  columns: &ColumnMap,
  provenance: &Provenance,
) -> Result<usize, SchemaError> {
  columns.part.ok_or_else(|| SchemaError::MissingPartColumn {
    document: provenance.document.clone(),
    sheet:    provenance.sheet.clone(),
  })
}

/// Normalize a demand sheet. Fails if the sheet has no MPN column or no
/// period can be derived from the sheet or document name.
pub fn normalize_demand<'a>(
  sheet: &'a RawSheet,
  provenance: &'a Provenance,
) -> Result<Records<'a, DemandRecord>, SchemaError> {
  let columns = ColumnMap::resolve(&sheet.headers, DEMAND_ROLES);
  let part = part_column(&columns, provenance)?;
  let period =
    resolve_period(provenance).ok_or_else(|| SchemaError::MissingPeriod {
      document: provenance.document.clone(),
      sheet:    provenance.sheet.clone(),
    })?;

  tracing::debug!(
    document = %provenance.document,
    sheet = %provenance.sheet,
    %period,
    ?columns,
    "resolved demand columns"
  );

  Ok(Records {
    ctx: RowContext { sheet, provenance, columns, part, period },
    row: 0,
    build: build_demand,
  })
}

/// Normalize a supply sheet. Fails if the sheet has no MPN column.
pub fn normalize_supply<'a>(
  sheet: &'a RawSheet,
  provenance: &'a Provenance,
) -> Result<Records<'a, SupplyRecord>, SchemaError> {
  let columns = ColumnMap::resolve(&sheet.headers, SUPPLY_ROLES);
  let part = part_column(&columns, provenance)?;

  tracing::debug!(
    document = %provenance.document,
    sheet = %provenance.sheet,
    ?columns,
    "resolved supply columns"
  );

  Ok(Records {
    ctx: RowContext { sheet, provenance, columns, part, period: String::new() },
    row: 0,
    build: build_supply,
  })
}

/// Records of either kind, as produced by [`normalize`].
pub enum Normalized<'a> {
  Demand(Records<'a, DemandRecord>),
  Supply(Records<'a, SupplyRecord>),
}

/// Normalize `sheet` as the declared `kind`.
pub fn normalize<'a>(
  sheet: &'a RawSheet,
  kind: RecordKind,
  provenance: &'a Provenance,
) -> Result<Normalized<'a>, SchemaError> {
  match kind {
    RecordKind::Demand => normalize_demand(sheet, provenance).map(Normalized::Demand),
    RecordKind::Supply => normalize_supply(sheet, provenance).map(Normalized::Supply),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
  }

  fn dec(s: &str) -> Decimal { s.parse().unwrap() }

  #[test]
  fn quantity_strips_separators_and_whitespace() {
    assert_eq!(clean_quantity(&Cell::from(" 2,643")), Some(2643));
    assert_eq!(clean_quantity(&Cell::from("1,000")), Some(1000));
    assert_eq!(clean_quantity(&Cell::from("1 898")), Some(1898));
    assert_eq!(clean_quantity(&Cell::Number(42.0)), Some(42));
    assert_eq!(clean_quantity(&Cell::Number(12.7)), Some(12));
    assert_eq!(clean_quantity(&Cell::from("12.0")), Some(12));
  }

  #[test]
  fn quantity_residue_is_null_not_error() {
    assert_eq!(clean_quantity(&Cell::from("call")), None);
    assert_eq!(clean_quantity(&Cell::from("")), None);
    assert_eq!(clean_quantity(&Cell::Empty), None);
    assert_eq!(clean_quantity(&Cell::from("-5")), None);
    assert_eq!(clean_quantity(&Cell::Number(-1.0)), None);
  }

  #[test]
  fn supply_price_gets_markup() {
    let raw = clean_price(&Cell::from("1.00")).unwrap();
    assert_eq!(apply_markup(raw), dec("1.12"));

    let raw = clean_price(&Cell::from("$2.50")).unwrap();
    assert_eq!(apply_markup(raw), dec("2.80"));

    let raw = clean_price(&Cell::from(" $1,250.00 ")).unwrap();
    assert_eq!(apply_markup(raw), dec("1400.00"));

    let raw = clean_price(&Cell::Number(10.0)).unwrap();
    assert_eq!(apply_markup(raw), dec("11.20"));
  }

  #[test]
  fn markup_rounds_to_cents() {
    // 0.125 * 1.12 = 0.14
    assert_eq!(apply_markup(dec("0.125")), dec("0.14"));
    // 0.3125 * 1.12 = 0.35
    assert_eq!(apply_markup(dec("0.3125")), dec("0.35"));
    assert_eq!(apply_markup(dec("0.3125")).scale(), 2);
  }

  #[test]
  fn missing_or_bad_price_is_null_not_zero() {
    assert_eq!(clean_price(&Cell::Empty), None);
    assert_eq!(clean_price(&Cell::from("  ")), None);
    assert_eq!(clean_price(&Cell::from("TBD")), None);
    assert_eq!(clean_price(&Cell::from("-3.00")), None);
    assert_eq!(clean_price(&Cell::from("0")), Some(Decimal::ZERO));
  }

  #[test]
  fn part_id_is_trimmed_and_upper_cased() {
    assert_eq!(clean_mpn(&Cell::from("  abc123 ")), Some("ABC123".into()));
    assert_eq!(clean_mpn(&Cell::from("   ")), None);
    assert_eq!(clean_mpn(&Cell::Number(74.0)), Some("74".into()));
  }

  #[test]
  fn quantity_prefers_exact_qty_over_stock_qty() {
    let map = ColumnMap::resolve(
      &headers(&["MPN", "Stock QTY", "QTY", "Price"]),
      SUPPLY_ROLES,
    );
    assert_eq!(map.part, Some(0));
    assert_eq!(map.quantity, Some(2));
    assert_eq!(map.price, Some(3));
  }

  #[test]
  fn quantity_falls_back_to_first_keyword_column() {
    let map = ColumnMap::resolve(
      &headers(&["Part MPN", "In Stock", "Available Quantity"]),
      SUPPLY_ROLES,
    );
    assert_eq!(map.quantity, Some(1));
  }

  #[test]
  fn price_prefers_exact_price_then_keywords() {
    let map = ColumnMap::resolve(
      &headers(&["mpn", "Unit Cost", "Target"]),
      SUPPLY_ROLES,
    );
    assert_eq!(map.price, Some(1));

    let map = ColumnMap::resolve(
      &headers(&["mpn", "Target Price", "price"]),
      SUPPLY_ROLES,
    );
    assert_eq!(map.price, Some(2));
  }

  #[test]
  fn demand_roles_resolve_hot_parts_headers() {
    let map = ColumnMap::resolve(
      &headers(&["MFG", "MPN", "Product Class", "Description", "Reqs Count"]),
      DEMAND_ROLES,
    );
    assert_eq!(map.part, Some(1));
    assert_eq!(map.quantity, Some(4));
    assert_eq!(map.manufacturer, Some(0));
    assert_eq!(map.product_class, Some(2));
    assert_eq!(map.description, Some(3));
    assert_eq!(map.price, None);
  }

  #[test]
  fn claimed_column_is_not_reused() {
    // "MPN Qty Note" is the part column; quantity must not grab it.
    let map =
      ColumnMap::resolve(&headers(&["MPN Qty Note", "Qty"]), SUPPLY_ROLES);
    assert_eq!(map.part, Some(0));
    assert_eq!(map.quantity, Some(1));
  }

  #[test]
  fn sheet_without_mpn_is_schema_error() {
    let sheet = RawSheet::new("Summary", headers(&["Part", "Qty"]))
      .with_row(["A", "1"]);
    let prov = Provenance::new("excess.xlsx", "Summary");
    let err = normalize_supply(&sheet, &prov).err().unwrap();
    assert!(matches!(err, SchemaError::MissingPartColumn { .. }));
  }

  #[test]
  fn period_comes_from_sheet_then_document() {
    let prov = Provenance::new("Weekly Hot Parts List 2025.07.07.xlsx", "2025.06.30");
    assert_eq!(resolve_period(&prov).as_deref(), Some("2025.06.30"));

    let prov = Provenance::new("Weekly Hot Parts List 2025.07.07.xlsx", "Pivot");
    assert_eq!(resolve_period(&prov).as_deref(), Some("2025.07.07"));

    let prov = Provenance::new("hot parts.xlsx", "Sheet1");
    assert_eq!(resolve_period(&prov), None);
  }

  #[test]
  fn period_token_rejects_impossible_dates() {
    assert_eq!(period_token("list 2025.13.40 and 2025.02.03"), Some("2025.02.03"));
    assert_eq!(period_token("2025.7.7"), None);
    assert_eq!(period_token("ü2025.07.07"), Some("2025.07.07"));
  }

  #[test]
  fn demand_without_period_is_schema_error() {
    let sheet = RawSheet::new("Sheet1", headers(&["MPN"])).with_row(["A"]);
    let prov = Provenance::new("hot.xlsx", "Sheet1");
    let err = normalize_demand(&sheet, &prov).err().unwrap();
    assert!(matches!(err, SchemaError::MissingPeriod { .. }));
  }

  #[test]
  fn demand_rows_become_records() {
    let sheet = RawSheet::new(
      "2025.06.30",
      headers(&["MPN", "Reqs Count", "MFG", "Product Class", "Description"]),
    )
    .with_row(vec![
      Cell::from(" abc123 "),
      Cell::Number(5.0),
      Cell::from("TI"),
      Cell::from("Analog"),
      Cell::from("Op amp"),
    ])
    .with_row(vec![Cell::Empty, Cell::Number(3.0)])
    .with_row(vec![Cell::from("XYZ"), Cell::from("n/a")]);
    let prov = Provenance::new("Weekly Hot Parts List 2025.07.07.xlsx", "2025.06.30");

    let records: Vec<_> = normalize_demand(&sheet, &prov).unwrap().collect();
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.mpn, "ABC123");
    assert_eq!(first.period, "2025.06.30");
    assert_eq!(first.reqs_count, Some(5));
    assert_eq!(first.manufacturer.as_deref(), Some("TI"));
    assert_eq!(first.product_class.as_deref(), Some("Analog"));
    assert_eq!(first.description.as_deref(), Some("Op amp"));
    assert_eq!(first.source, "Weekly Hot Parts List 2025.07.07.xlsx");

    // Kept so the merge can count it as invalid.
    assert_eq!(records[1].mpn, "");
    assert_eq!(records[1].reqs_count, Some(3));

    let second = &records[2];
    assert_eq!(second.mpn, "XYZ");
    assert_eq!(second.reqs_count, None);
    assert_eq!(second.manufacturer, None);
  }

  #[test]
  fn supply_rows_become_records_with_markup() {
    let sheet = RawSheet::new("Raw Data", headers(&["MPN", "QTY", "Price", "Mfr"]))
      .with_row(["ABC123", "1,898", "$1.00", "Acme"])
      .with_row(["DEF456", " 2,643", "", ""]);
    let prov = Provenance::new("X.xlsx", "Raw Data");

    let records: Vec<_> = normalize_supply(&sheet, &prov).unwrap().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].quantity, Some(1898));
    assert_eq!(records[0].price, Some(dec("1.12")));
    assert_eq!(records[0].manufacturer.as_deref(), Some("Acme"));
    assert_eq!(records[0].document, "X.xlsx");
    assert_eq!(records[0].sheet, "Raw Data");
    assert_eq!(records[1].quantity, Some(2643));
    assert_eq!(records[1].price, None);
  }

  #[test]
  fn normalization_is_restartable() {
    let sheet = RawSheet::new("Raw", headers(&["MPN", "QTY"]))
      .with_row(["A", "1"])
      .with_row(["B", "2"]);
    let prov = Provenance::new("X.xlsx", "Raw");

    let mut records = normalize_supply(&sheet, &prov).unwrap();
    let first: Vec<_> = records.by_ref().collect();
    records.restart();
    let second: Vec<_> = records.collect();
    assert_eq!(first, second);

    let again: Vec<_> = normalize_supply(&sheet, &prov).unwrap().collect();
    assert_eq!(first, again);
  }

  #[test]
  fn blank_rows_are_dropped_but_partless_rows_are_kept() {
    let sheet = RawSheet::new("Raw", headers(&["MPN", "QTY", "Price"]))
      .with_row(["ABC", "5", "1.00"])
      .with_row(vec![Cell::Empty, Cell::Empty, Cell::Empty])
      .with_row(["   ", "7", "2.00"])
      .with_row(Vec::<Cell>::new());
    let prov = Provenance::new("X.xlsx", "Raw");

    let records: Vec<_> = normalize_supply(&sheet, &prov).unwrap().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].mpn, "ABC");
    assert_eq!(records[1].mpn, "");
    assert_eq!(records[1].quantity, Some(7));
    assert_eq!(records[1].price, Some(dec("2.24")));
  }

  #[test]
  fn normalize_dispatches_on_declared_kind() {
    let sheet = RawSheet::new("2025.06.30", headers(&["MPN", "QTY"])).with_row(["A", "4"]);
    let prov = Provenance::new("hot.xlsx", "2025.06.30");

    let Normalized::Demand(demand) = normalize(&sheet, RecordKind::Demand, &prov).unwrap()
    else {
      panic!("expected demand records");
    };
    let demand: Vec<_> = demand.collect();
    assert_eq!(demand[0].reqs_count, Some(4));
    assert_eq!(demand[0].period, "2025.06.30");

    let Normalized::Supply(supply) = normalize(&sheet, RecordKind::Supply, &prov).unwrap()
    else {
      panic!("expected supply records");
    };
    assert_eq!(supply.count(), 1);
  }

  #[test]
  fn short_rows_are_padded() {
    let sheet = RawSheet::new("Raw", headers(&["MPN", "QTY", "Price"]))
      .with_row(["A"]);
    let prov = Provenance::new("X.xlsx", "Raw");
    let records: Vec<_> = normalize_supply(&sheet, &prov).unwrap().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].quantity, None);
    assert_eq!(records[0].price, None);
  }
}
