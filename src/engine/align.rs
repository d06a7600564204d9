use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{PricePoint, PriceSeries, RawSeries};

/// Inner-join two raw close series on date.
///
/// Dates present in only one input are dropped, as are dates where either
/// close is non-finite. Nothing is forward-filled. Both inputs are ordered
/// maps, so the output is strictly ascending with no duplicate dates.
pub fn align_series(series_a: &RawSeries, series_b: &RawSeries) -> Result<PriceSeries> {
    if series_a.is_empty() {
        return Err(AppError::EmptyData("series A has no observations".to_string()));
    }
    if series_b.is_empty() {
        return Err(AppError::EmptyData("series B has no observations".to_string()));
    }

    let points: Vec<PricePoint> = series_a
        .iter()
        .filter_map(|(date, &close_a)| {
            let close_b = *series_b.get(date)?;
            (close_a.is_finite() && close_b.is_finite()).then_some(PricePoint {
                date: *date,
                close_a,
                close_b,
            })
        })
        .collect();

    debug!(
        rows_a = series_a.len(),
        rows_b = series_b.len(),
        aligned = points.len(),
        "aligned price series"
    );

    if points.is_empty() {
        return Err(AppError::EmptyData(
            "series A and B share no dates with valid closes".to_string(),
        ));
    }

    Ok(PriceSeries::from_sorted(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn raw(entries: &[(u32, f64)]) -> RawSeries {
        entries.iter().map(|&(d, p)| (day(d), p)).collect()
    }

    #[test]
    fn keeps_only_shared_dates() {
        let a = raw(&[(1, 80.0), (2, 81.0), (3, 82.0), (5, 83.0)]);
        let b = raw(&[(1, 75.0), (2, 76.0), (4, 77.0), (5, 78.0)]);

        let series = align_series(&a, &b).unwrap();
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(5)]);

        let last = series.points()[2];
        assert_eq!(last.close_a, 83.0);
        assert_eq!(last.close_b, 78.0);
    }

    #[test]
    fn non_finite_closes_are_dropped_not_filled() {
        let a = raw(&[(1, 80.0), (2, f64::NAN), (3, 82.0)]);
        let b = raw(&[(1, 75.0), (2, 76.0), (3, f64::INFINITY)]);

        let series = align_series(&a, &b).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), Some(day(1)));
    }

    #[test]
    fn no_overlap_is_empty_data() {
        let a = raw(&[(1, 80.0), (3, 82.0)]);
        let b = raw(&[(2, 75.0), (4, 77.0)]);
        assert!(matches!(align_series(&a, &b), Err(AppError::EmptyData(_))));
    }

    #[test]
    fn empty_input_is_empty_data() {
        let a = raw(&[(1, 80.0)]);
        let b = RawSeries::new();
        assert!(matches!(align_series(&a, &b), Err(AppError::EmptyData(_))));
        assert!(matches!(align_series(&b, &a), Err(AppError::EmptyData(_))));
    }
}
