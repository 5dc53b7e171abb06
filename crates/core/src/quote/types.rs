//! Quote entities and inputs.

use chrono::{DateTime, NaiveDate, Utc};
use fieldline_shared::types::{OrganizationId, ProductId, QuoteId, QuoteLineId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::QuoteError;
use crate::catalog::normalize_required;

/// Quote workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Being edited.
    #[default]
    Draft,
    /// Sent to the customer.
    Sent,
    /// Accepted by the customer.
    Accepted,
    /// Rejected by the customer.
    Rejected,
}

impl QuoteStatus {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Parse, reporting unknown values as a quote error.
    pub fn parse_input(s: &str) -> Result<Self, QuoteError> {
        Self::parse(s).ok_or_else(|| QuoteError::InvalidStatus(s.to_string()))
    }

    /// Whether the workflow allows moving from `self` to `next`.
    ///
    /// A sent quote may be re-opened as a draft; accepted and rejected are
    /// final.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent)
                | (Self::Sent, Self::Accepted | Self::Rejected | Self::Draft)
        )
    }

    /// Validate a status change.
    pub fn transition(self, next: Self) -> Result<Self, QuoteError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(QuoteError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Generate a quote number like `Q-20260314-4F1A9C`.
#[must_use]
pub fn generate_quote_number(date: NaiveDate) -> String {
    let random = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("Q-{}-{}", date.format("%Y%m%d"), &random[..6])
}

/// Catalog values a product contributes to a quote line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDefaults {
    /// Product name, used as the line description.
    pub name: String,
    /// Current unit price.
    pub unit_price_cents: i64,
    /// Rate of the product's VAT rate.
    pub vat_rate_bps: i32,
    /// Inactive products cannot be quoted.
    pub is_active: bool,
}

/// Requested quote line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteLine {
    /// Catalog product; fills in missing description, price and VAT rate.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Line text.
    #[serde(default)]
    pub description: Option<String>,
    /// Whole units.
    pub quantity: i64,
    /// Overrides the product price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    /// Overrides the product VAT rate.
    #[serde(default)]
    pub vat_rate_bps: Option<i32>,
}

/// Fully resolved line, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteLineDraft {
    /// Zero-based position.
    pub position: i32,
    /// Catalog product, if any.
    pub product_id: Option<ProductId>,
    /// Line text.
    pub description: String,
    /// Whole units.
    pub quantity: i64,
    /// Net unit price.
    pub unit_price_cents: i64,
    /// VAT rate in basis points.
    pub vat_rate_bps: i32,
    /// `quantity * unit_price_cents`.
    pub net_cents: i64,
    /// Rounded VAT for this line.
    pub vat_cents: i64,
}

/// Maximum number of lines in one quote.
pub(crate) const MAX_LINES: usize = 200;

/// Requested quote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    /// Customer display name.
    pub customer_name: String,
    /// Last day the offer holds.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Lines in display order.
    pub lines: Vec<NewQuoteLine>,
}

impl NewQuote {
    /// Normalize the header fields and check the line count.
    pub fn validate_header(&self) -> Result<(String, Option<String>), QuoteError> {
        let customer = normalize_required("customerName", &self.customer_name, 200)?;
        let notes = crate::catalog::normalize_optional("notes", self.notes.as_deref(), 4000)?;
        if self.lines.is_empty() {
            return Err(QuoteError::NoLines);
        }
        if self.lines.len() > MAX_LINES {
            return Err(QuoteError::TooManyLines(MAX_LINES));
        }
        Ok((customer, notes))
    }
}

/// Quote header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Identifier.
    pub id: QuoteId,
    /// Owning tenant.
    pub organization_id: OrganizationId,
    /// Human-facing number, unique per tenant.
    pub quote_number: String,
    /// Customer display name.
    pub customer_name: String,
    /// Workflow state.
    pub status: QuoteStatus,
    /// Last day the offer holds.
    pub valid_until: Option<NaiveDate>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Sum of line nets.
    pub subtotal_cents: i64,
    /// Sum of rounded line VAT.
    pub vat_cents: i64,
    /// `subtotal_cents + vat_cents`.
    pub total_cents: i64,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Persisted quote line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    /// Identifier.
    pub id: QuoteLineId,
    /// Parent quote.
    pub quote_id: QuoteId,
    /// Catalog product, if any.
    pub product_id: Option<ProductId>,
    /// Line text.
    pub description: String,
    /// Whole units.
    pub quantity: i64,
    /// Net unit price.
    pub unit_price_cents: i64,
    /// VAT rate in basis points.
    pub vat_rate_bps: i32,
    /// Zero-based position.
    pub position: i32,
}

/// Quote with its lines in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteWithLines {
    /// Header.
    #[serde(flatten)]
    pub quote: Quote,
    /// Lines.
    pub lines: Vec<QuoteLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QuoteStatus::Draft, QuoteStatus::Sent, true)]
    #[case(QuoteStatus::Sent, QuoteStatus::Accepted, true)]
    #[case(QuoteStatus::Sent, QuoteStatus::Rejected, true)]
    #[case(QuoteStatus::Sent, QuoteStatus::Draft, true)]
    #[case(QuoteStatus::Draft, QuoteStatus::Accepted, false)]
    #[case(QuoteStatus::Draft, QuoteStatus::Draft, false)]
    #[case(QuoteStatus::Accepted, QuoteStatus::Draft, false)]
    #[case(QuoteStatus::Rejected, QuoteStatus::Sent, false)]
    fn test_transitions(#[case] from: QuoteStatus, #[case] to: QuoteStatus, #[case] ok: bool) {
        assert_eq!(from.can_transition_to(to), ok);
        assert_eq!(from.transition(to).is_ok(), ok);
    }

    #[test]
    fn test_invalid_transition_is_business_rule() {
        let err = QuoteStatus::Accepted
            .transition(QuoteStatus::Sent)
            .unwrap_err();
        let app: fieldline_shared::AppError = err.into();
        assert_eq!(app.status_code(), 422);
    }

    #[test]
    fn test_status_roundtrip() {
        for s in [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
        ] {
            assert_eq!(QuoteStatus::parse(s.as_str()), Some(s));
        }
        assert!(QuoteStatus::parse_input("Sent").is_err());
    }

    #[test]
    fn test_quote_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let number = generate_quote_number(date);
        assert_eq!(number.len(), "Q-20260314-XXXXXX".len());
        assert!(number.starts_with("Q-20260314-"));
        let tail = &number[11..];
        assert!(tail.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_validate_header() {
        let quote = NewQuote {
            customer_name: "  Acme BV ".into(),
            valid_until: None,
            notes: Some(" ".into()),
            lines: vec![],
        };
        assert_eq!(quote.validate_header().unwrap_err(), QuoteError::NoLines);

        let quote = NewQuote {
            lines: vec![NewQuoteLine {
                product_id: None,
                description: Some("Labor".into()),
                quantity: 1,
                unit_price_cents: Some(100),
                vat_rate_bps: Some(0),
            }],
            ..quote
        };
        let (customer, notes) = quote.validate_header().unwrap();
        assert_eq!(customer, "Acme BV");
        assert_eq!(notes, None);
    }
}
