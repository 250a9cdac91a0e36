//! Scan pricing.
//!
//! Both functions are pure: the same inputs always produce the same outputs, and nothing is
//! validated or clamped. Rejecting an empty selection is the wizard's job, not pricing's.
//! Amounts entering the system are held to [`MAX_AMOUNT_UNITS`] by [`check_amount`], so the
//! saturating arithmetic below never actually saturates for accepted input.

use crate::catalog::{ScanId, ScanOption};
use crate::category::Category;
use crate::constants::MAX_AMOUNT_UNITS;
use crate::error::{IntakeError, IntakeResult};
use crate::record::currency;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Result of pricing a scan selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Charges {
    /// Sum of catalog charges before any category waiver.
    pub gross_amount: Decimal,
    /// Amount the patient owes for the scans: zero for fee-exempt categories, otherwise
    /// `gross_amount`.
    pub total_amount: Decimal,
    pub total_minutes: u32,
}

/// Prices the selected scans for a patient category.
///
/// Selected ids that are not in `catalog` contribute nothing.
pub fn compute_charges(
    selected_ids: &BTreeSet<ScanId>,
    catalog: &[ScanOption],
    category: &Category,
) -> Charges {
    let (gross_amount, total_minutes) = catalog
        .iter()
        .filter(|scan| selected_ids.contains(&scan.id))
        .fold((Decimal::ZERO, 0u32), |(amount, minutes), scan| {
            (
                amount.saturating_add(scan.charge),
                minutes.saturating_add(scan.estimated_minutes),
            )
        });

    let total_amount = if category.is_fee_exempt {
        Decimal::ZERO
    } else {
        gross_amount
    };

    Charges {
        gross_amount,
        total_amount,
        total_minutes,
    }
}

/// `total - received - discount`. Negative results are returned as-is.
pub fn compute_due(
    total_amount: Decimal,
    received_amount: Decimal,
    discount_amount: Decimal,
) -> Decimal {
    total_amount
        .saturating_sub(received_amount)
        .saturating_sub(discount_amount)
}

/// Settled once the due amount, rounded to currency, is zero or below.
pub fn is_settled(due_amount: Decimal) -> bool {
    currency(due_amount) <= Decimal::ZERO
}

/// # Errors
///
/// Returns [`IntakeError::InvalidInput`] when `amount` is larger in magnitude than
/// [`MAX_AMOUNT_UNITS`].
pub fn check_amount(what: &str, amount: Decimal) -> IntakeResult<Decimal> {
    if amount.abs() > Decimal::from(MAX_AMOUNT_UNITS) {
        return Err(IntakeError::InvalidInput(format!(
            "{what} is out of range (got {amount})"
        )));
    }
    Ok(amount)
}
