//! Line resolution and totals.

use serde::Serialize;

use super::error::QuoteError;
use super::types::{NewQuoteLine, ProductDefaults, QuoteLineDraft};
use crate::catalog::{MAX_BPS, normalize_optional, validate_price, validate_rate_bps};

/// Net and rounded VAT for one line.
///
/// VAT is `net * bps / 10000` rounded half-up to the cent; negative nets do
/// not occur because quantity and price are validated first.
pub fn line_amounts(
    quantity: i64,
    unit_price_cents: i64,
    vat_rate_bps: i32,
) -> Result<(i64, i64), QuoteError> {
    let net = quantity
        .checked_mul(unit_price_cents)
        .ok_or(QuoteError::Overflow)?;
    let scaled = i128::from(net) * i128::from(vat_rate_bps);
    let half = i128::from(MAX_BPS) / 2;
    let vat = (scaled + half) / i128::from(MAX_BPS);
    let vat = i64::try_from(vat).map_err(|_| QuoteError::Overflow)?;
    Ok((net, vat))
}

/// Combine a requested line with its product's catalog values.
///
/// Explicit values on the line win over the product's.
pub fn resolve_line(
    position: i32,
    line: &NewQuoteLine,
    product: Option<&ProductDefaults>,
) -> Result<QuoteLineDraft, QuoteError> {
    if line.quantity <= 0 {
        return Err(QuoteError::InvalidQuantity {
            position,
            quantity: line.quantity,
        });
    }
    if product.is_some_and(|p| !p.is_active) {
        return Err(QuoteError::InactiveProduct(position));
    }

    let description = normalize_optional("description", line.description.as_deref(), 2000)?
        .or_else(|| product.map(|p| p.name.clone()))
        .ok_or(QuoteError::MissingDescription(position))?;
    let unit_price_cents = line
        .unit_price_cents
        .or_else(|| product.map(|p| p.unit_price_cents))
        .ok_or(QuoteError::MissingPrice(position))?;
    let unit_price_cents = validate_price("unitPriceCents", unit_price_cents)?;
    let vat_rate_bps = line
        .vat_rate_bps
        .or_else(|| product.map(|p| p.vat_rate_bps))
        .ok_or(QuoteError::MissingVatRate(position))?;
    let vat_rate_bps = validate_rate_bps(vat_rate_bps)?;

    let (net_cents, vat_cents) = line_amounts(line.quantity, unit_price_cents, vat_rate_bps)?;

    Ok(QuoteLineDraft {
        position,
        product_id: line.product_id,
        description,
        quantity: line.quantity,
        unit_price_cents,
        vat_rate_bps,
        net_cents,
        vat_cents,
    })
}

/// Quote-level amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    /// Sum of line nets.
    pub subtotal_cents: i64,
    /// Sum of rounded line VAT.
    pub vat_cents: i64,
    /// Subtotal plus VAT.
    pub total_cents: i64,
}

impl QuoteTotals {
    /// Sum resolved lines.
    pub fn from_lines(lines: &[QuoteLineDraft]) -> Result<Self, QuoteError> {
        let mut subtotal: i64 = 0;
        let mut vat: i64 = 0;
        for line in lines {
            subtotal = subtotal
                .checked_add(line.net_cents)
                .ok_or(QuoteError::Overflow)?;
            vat = vat.checked_add(line.vat_cents).ok_or(QuoteError::Overflow)?;
        }
        Ok(Self {
            subtotal_cents: subtotal,
            vat_cents: vat,
            total_cents: subtotal.checked_add(vat).ok_or(QuoteError::Overflow)?,
        })
    }
}
