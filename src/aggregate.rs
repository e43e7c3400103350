// Frame aggregation: the operations every view is built from.
//
// All functions take a frame and return a new one; nothing here mutates the
// loader's cached frames. An empty input always yields an empty output
// rather than an error, so degraded datasets flow through untouched.
use crate::error::InsightResult;
use crate::frame::{Frame, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How a measure column is folded per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agg {
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Descending,
    Ascending,
}

/// Zero-denominator policy for derived ratios.
///
/// `AddOne` shifts the denominator by one (the engagement-rate and
/// policy-value formulas); `ZeroIfZero` maps anything over a zero
/// denominator to 0.0. Either way the result is finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroGuard {
    AddOne,
    ZeroIfZero,
}

pub fn filter_eq(frame: &Frame, column: &str, value: &Value) -> InsightResult<Frame> {
    let mut out = Frame::new(frame.columns().to_vec());
    if frame.is_empty() {
        return Ok(out);
    }
    let idx = frame.require_column(column)?;
    for row in frame.rows() {
        if &row[idx] == value {
            out.push_row(row.clone())?;
        }
    }
    Ok(out)
}

/// Group rows by the `keys` tuple and fold each `(measure, agg)` pair.
///
/// The output has one row per distinct key tuple, key columns first and
/// measures under their original names, ordered ascending by key. Non-numeric
/// measure cells contribute nothing: a sum ignores them and a mean divides by
/// the numeric count only (0.0 when a group has none).
pub fn group_by(
    frame: &Frame,
    keys: &[&str],
    measures: &[(&str, Agg)],
) -> InsightResult<Frame> {
    let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    columns.extend(measures.iter().map(|(m, _)| m.to_string()));
    let mut out = Frame::new(columns);
    if frame.is_empty() {
        return Ok(out);
    }

    let key_idx: Vec<usize> = keys
        .iter()
        .map(|k| frame.require_column(k))
        .collect::<InsightResult<_>>()?;
    let measure_idx: Vec<usize> = measures
        .iter()
        .map(|(m, _)| frame.require_column(m))
        .collect::<InsightResult<_>>()?;

    #[derive(Default, Clone)]
    struct Acc {
        sum: f64,
        count: usize,
    }

    let mut groups: HashMap<Vec<GroupKey>, (Vec<Value>, Vec<Acc>)> = HashMap::new();
    for row in frame.rows() {
        let hash_key: Vec<GroupKey> = key_idx.iter().map(|&i| GroupKey::of(&row[i])).collect();
        let entry = groups.entry(hash_key).or_insert_with(|| {
            let cells = key_idx.iter().map(|&i| row[i].clone()).collect();
            (cells, vec![Acc::default(); measure_idx.len()])
        });
        for (acc, &i) in entry.1.iter_mut().zip(&measure_idx) {
            if let Some(v) = row[i].as_f64() {
                acc.sum += v;
                acc.count += 1;
            }
        }
    }

    let mut grouped: Vec<(Vec<Value>, Vec<Acc>)> = groups.into_values().collect();
    grouped.sort_by(|a, b| cmp_cell_tuples(&a.0, &b.0));

    for (key_cells, accs) in grouped {
        let mut row = key_cells;
        for (acc, (_, agg)) in accs.iter().zip(measures) {
            let value = match agg {
                Agg::Sum => acc.sum,
                Agg::Mean => {
                    if acc.count == 0 {
                        0.0
                    } else {
                        acc.sum / acc.count as f64
                    }
                }
            };
            row.push(Value::Float(value));
        }
        out.push_row(row)?;
    }
    Ok(out)
}

/// Stable sort by `by` and keep the first `n` rows; ties keep their original
/// order, and `n` past the row count keeps everything.
pub fn top_n(frame: &Frame, by: &str, n: usize, order: SortOrder) -> InsightResult<Frame> {
    let mut out = Frame::new(frame.columns().to_vec());
    if frame.is_empty() {
        return Ok(out);
    }
    let idx = frame.require_column(by)?;
    let mut rows: Vec<Vec<Value>> = frame.rows().to_vec();
    // Non-numeric cells rank as zero.
    let measure = |row: &Vec<Value>| row[idx].as_f64().unwrap_or(0.0);
    match order {
        SortOrder::Descending => {
            rows.sort_by(|a, b| measure(b).partial_cmp(&measure(a)).unwrap_or(Ordering::Equal))
        }
        SortOrder::Ascending => {
            rows.sort_by(|a, b| measure(a).partial_cmp(&measure(b)).unwrap_or(Ordering::Equal))
        }
    }
    rows.truncate(n);
    for row in rows {
        out.push_row(row)?;
    }
    Ok(out)
}

/// Derive `alias = numerator / denominator` with the chosen zero guard.
pub fn ratio_column(
    frame: &Frame,
    numerator: &str,
    denominator: &str,
    alias: &str,
    guard: ZeroGuard,
) -> InsightResult<Frame> {
    let mut out = frame.clone();
    if frame.is_empty() {
        out.add_column(alias, Vec::new())?;
        return Ok(out);
    }
    let num = frame.column_f64(numerator)?;
    let den = frame.column_f64(denominator)?;
    let values: Vec<Value> = num
        .iter()
        .zip(&den)
        .map(|(&n, &d)| {
            let mut ratio = match guard {
                ZeroGuard::AddOne => n / (d + 1.0),
                ZeroGuard::ZeroIfZero => {
                    if d == 0.0 {
                        0.0
                    } else {
                        n / d
                    }
                }
            };
            if !ratio.is_finite() {
                ratio = 0.0;
            }
            Value::Float(ratio)
        })
        .collect();
    out.add_column(alias, values)?;
    Ok(out)
}

pub fn scale_column(
    frame: &Frame,
    source: &str,
    divisor: f64,
    alias: &str,
) -> InsightResult<Frame> {
    let mut out = frame.clone();
    if frame.is_empty() {
        out.add_column(alias, Vec::new())?;
        return Ok(out);
    }
    let values: Vec<Value> = frame
        .column_f64(source)?
        .into_iter()
        .map(|v| {
            let scaled = v / divisor;
            Value::Float(if scaled.is_finite() { scaled } else { 0.0 })
        })
        .collect();
    out.add_column(alias, values)?;
    Ok(out)
}

/// Hashable stand-in for a key cell; floats hash by bit pattern.
#[derive(PartialEq, Eq, Hash, Clone)]
enum GroupKey {
    Null,
    Int(i64),
    Bits(u64),
    Str(String),
}

impl GroupKey {
    fn of(v: &Value) -> Self {
        match v {
            Value::Null => GroupKey::Null,
            Value::Int(i) => GroupKey::Int(*i),
            Value::Float(f) => GroupKey::Bits(f.to_bits()),
            Value::Str(s) => GroupKey::Str(s.clone()),
        }
    }
}

fn cmp_cell_tuples(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = cmp_cells(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

// Null sorts first, numbers next (ints and floats compare numerically),
// text last.
fn cmp_cells(a: &Value, b: &Value) -> Ordering {
    use Value::*;
    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Int(x), Int(y)) => x.cmp(y),
        (Int(x), Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Float(x), Int(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Float(x), Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Int(_) | Float(_), Str(_)) => Ordering::Less,
        (Str(_), Int(_) | Float(_)) => Ordering::Greater,
        (Str(x), Str(y)) => x.cmp(y),
    }
}
