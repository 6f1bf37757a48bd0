//! Field extraction and status classification for gateway callbacks.
//!
//! Gateways disagree on key spelling (`billing_id`, `billingId`, `merchant-uid`, ...) and on
//! status vocabulary (`PAID`, `approved`, `USER_CANCEL`, ...). Keys are compared after
//! [`normalize_key`]; statuses are folded into [`PaymentStatus`] by [`classify_status`].

use uuid::Uuid;

use crate::{db::models::billing::PaymentStatus, errors::Error, types::BillingId};

const BILLING_ID_KEYS: &[&str] = &[
    "billing_id",
    "billingId",
    "order_id",
    "merchant_uid",
    "merchant_order_id",
    "moid",
    "oid",
    "reference_id",
];

const STATUS_KEYS: &[&str] = &[
    "status",
    "payment_status",
    "pay_status",
    "result",
    "state",
    "transaction_status",
    "txn_status",
];

const PAYMENT_REF_KEYS: &[&str] = &["payment_ref", "payment_key", "transaction_id", "tid", "imp_uid", "txn_id", "trade_no"];

const COMPLETED_VALUES: &[&str] = &["paid", "success", "succeeded", "completed", "complete", "approved", "done"];

const FAILED_VALUES: &[&str] = &[
    "failed", "fail", "failure", "cancel", "cancelled", "canceled", "denied", "declined", "error", "expired", "rejected", "aborted",
];

const FAILED_FRAGMENTS: &[&str] = &["fail", "cancel"];
const COMPLETED_FRAGMENTS: &[&str] = &["success", "approve"];

/// Lower-case a key and drop `_`, `-`, `.` and spaces.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decoded callback fields keyed by normalized name.
///
/// Insertion order is kept and the first non-empty value for a key wins, so sources must be
/// inserted from most to least authoritative (body before query string).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the normalized key already holds a value. Blank values are ignored.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        let key = normalize_key(key);
        if self.entries.iter().any(|(existing, _)| *existing == key) {
            return;
        }
        self.entries.push((key, value));
    }

    /// Fill in keys from `other` that are still missing here.
    pub fn merge_fallback(&mut self, other: FieldMap) {
        for (key, value) in other.entries {
            if !self.entries.iter().any(|(existing, _)| *existing == key) {
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.entries.iter().find(|(existing, _)| *existing == key).map(|(_, value)| value.as_str())
    }

    /// First value found among `aliases`, in alias order.
    pub fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias)).map(str::trim)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold a gateway status string into a canonical outcome.
///
/// Exact aliases are checked before substrings, and failure substrings win over success
/// substrings, so `"success_but_cancelled"` is a failure.
pub fn classify_status(raw: &str) -> Option<PaymentStatus> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    if COMPLETED_VALUES.contains(&value.as_str()) {
        return Some(PaymentStatus::Completed);
    }
    if FAILED_VALUES.contains(&value.as_str()) {
        return Some(PaymentStatus::Failed);
    }
    if FAILED_FRAGMENTS.iter().any(|fragment| value.contains(fragment)) {
        return Some(PaymentStatus::Failed);
    }
    if COMPLETED_FRAGMENTS.iter().any(|fragment| value.contains(fragment)) {
        return Some(PaymentStatus::Completed);
    }

    None
}

/// Canonical triple handed to the billing procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCallback {
    pub billing_id: BillingId,
    pub status: PaymentStatus,
    pub payment_ref: String,
}

/// Extract the canonical triple from decoded fields.
///
/// `now_millis` seeds the synthetic `callback_<millis>` reference used when the gateway sends none.
pub fn normalize(fields: &FieldMap, now_millis: i64) -> Result<NormalizedCallback, Error> {
    let raw_billing_id = fields.first_of(BILLING_ID_KEYS).ok_or_else(|| Error::InvalidInput {
        message: "Missing billing id".to_string(),
    })?;

    let billing_id = Uuid::parse_str(raw_billing_id).map_err(|_| Error::InvalidInput {
        message: "Billing id must be a valid UUID".to_string(),
    })?;

    let raw_status = fields.first_of(STATUS_KEYS).ok_or_else(|| Error::InvalidInput {
        message: "Missing payment status".to_string(),
    })?;

    let status = classify_status(raw_status).ok_or_else(|| Error::UnrecognizedStatus {
        raw_status: raw_status.to_string(),
    })?;

    let payment_ref = fields
        .first_of(PAYMENT_REF_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| format!("callback_{now_millis}"));

    Ok(NormalizedCallback {
        billing_id,
        status,
        payment_ref,
    })
}
