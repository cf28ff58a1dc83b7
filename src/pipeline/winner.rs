//! Winner selector: the lowest `monto_total` wins.
//!
//! Ties go to the record that appears first in `postores`. Records are
//! validated upstream to carry a finite total; `f64::total_cmp` keeps the
//! comparison total even if that ever stopped holding.

use crate::record::BidderRecord;
use std::cmp::Ordering;

/// Index of the winning record, or `None` when there are no bidders.
pub fn select_winner(postores: &[BidderRecord]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, record) in postores.iter().enumerate() {
        let total = record.monto_total;
        if !total.is_finite() {
            continue;
        }
        match best {
            Some((_, best_total)) if total.total_cmp(&best_total) != Ordering::Less => {}
            _ => best = Some((i, total)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(archivo: &str, total: f64) -> BidderRecord {
        BidderRecord {
            archivo: archivo.into(),
            empresa: archivo.to_uppercase(),
            ruc: String::new(),
            fecha: String::new(),
            items: vec![],
            monto_total: total,
        }
    }

    #[test]
    fn empty_has_no_winner() {
        assert_eq!(select_winner(&[]), None);
    }

    #[test]
    fn picks_global_minimum() {
        let postores = vec![
            record("cotizacion001.html", 745.0),
            record("cotizacion002.html", 790.0),
            record("cotizacion003.html", 680.0),
        ];
        assert_eq!(select_winner(&postores), Some(2));
    }

    #[test]
    fn tie_goes_to_first_in_order() {
        let postores = vec![
            record("a.html", 900.0),
            record("b.html", 500.0),
            record("c.html", 500.0),
        ];
        for _ in 0..3 {
            assert_eq!(select_winner(&postores), Some(1));
        }
    }

    #[test]
    fn single_record_wins() {
        assert_eq!(select_winner(&[record("a.html", 0.0)]), Some(0));
    }

    #[test]
    fn non_finite_total_never_wins() {
        let postores = vec![record("nan.html", f64::NAN), record("b.html", 10.0)];
        assert_eq!(select_winner(&postores), Some(1));
        assert_eq!(select_winner(&[record("nan.html", f64::NAN)]), None);
    }

    #[test]
    fn every_permutation_finds_minimum() {
        let totals = [745.0, 790.0, 680.0, 1200.5];
        let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];
        for order in orders {
            let postores: Vec<_> = order
                .iter()
                .map(|&i| record(&format!("c{i}.html"), totals[i]))
                .collect();
            let w = select_winner(&postores).unwrap();
            assert_eq!(postores[w].monto_total, 680.0);
        }
    }
}
