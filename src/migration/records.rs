//! Preparing legacy rows for insertion.
//!
//! Each draft applies the default substitution table to one row. Preparation
//! never fails; the only way a row is rejected is by the store itself.

use super::columns::{budget as budget_cols, detail as detail_cols, patient as patient_cols};
use super::remap::LegacyId;
use crate::config::DefaultValues;
use crate::core::normalize::{
    decimal_or, flag_or, integer_or, optional_reference, optional_text, reference_or,
    round_cents, store_date, text_or, timestamp_or,
};
use crate::entities::{budget, budget_detail, patient};
use crate::source::Row;
use chrono::NaiveDateTime;
use sea_orm::Set;

/// Legacy id used when a row carries none.
fn old_id_or_zero(row: &Row, aliases: &[&str]) -> LegacyId {
    LegacyId::from_cell(row.first_present(aliases)).unwrap_or_else(|| LegacyId::new("0"))
}

/// A patient ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDraft {
    /// Legacy id of the row
    pub old_id: LegacyId,
    /// Values to insert
    pub model: patient::ActiveModel,
}

impl PatientDraft {
    /// Applies patient defaults to a legacy row.
    ///
    /// `started_at` supplies the intake date for rows without one.
    #[must_use]
    pub fn from_row(row: &Row, defaults: &DefaultValues, started_at: NaiveDateTime) -> Self {
        let old_id = old_id_or_zero(row, patient_cols::OLD_ID);
        let model = patient::ActiveModel {
            name: Set(text_or(row.get(patient_cols::NAME), "")),
            surname: Set(text_or(row.first_present(patient_cols::SURNAME), "")),
            email: Set(optional_text(row.get(patient_cols::EMAIL))),
            phone: Set(text_or(row.get(patient_cols::PHONE), "")),
            birth_date: Set(store_date(row.get(patient_cols::BIRTH_DATE))),
            sex_id: Set(optional_reference(row.get(patient_cols::SEX))),
            address: Set(optional_text(row.get(patient_cols::ADDRESS))),
            city: Set(optional_text(row.get(patient_cols::CITY))),
            clinic_id: Set(reference_or(row.get(patient_cols::CLINIC), defaults.clinic_id)),
            postal_code: Set(text_or(row.get(patient_cols::POSTAL_CODE), "0")),
            tax_id: Set(text_or(row.get(patient_cols::TAX_ID), "0")),
            referred_by: Set(optional_text(row.get(patient_cols::REFERRED_BY))),
            parent_clinic_id: Set(reference_or(
                row.get(patient_cols::PARENT_CLINIC),
                defaults.parent_clinic_id,
            )),
            registration_state_id: Set(reference_or(
                row.get(patient_cols::REGISTRATION_STATE),
                defaults.registration_state_id,
            )),
            consent_accepted: Set(flag_or(row.get(patient_cols::CONSENT), false)),
            old_id: Set(old_id.to_string()),
            intake_date: Set(store_date(row.get(patient_cols::INTAKE_DATE))
                .unwrap_or_else(|| started_at.date())),
            created_by: Set(text_or(
                row.get(patient_cols::CREATED_BY),
                &defaults.created_by,
            )),
            ..Default::default()
        };
        Self { old_id, model }
    }
}

/// A budget ready to insert once its patient is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    /// Legacy id of the row
    pub old_id: LegacyId,
    /// Legacy id of the patient the budget was issued to
    pub patient: Option<LegacyId>,
    /// Values to insert; the patient is filled in by the budget stage
    pub model: budget::ActiveModel,
}

impl BudgetDraft {
    /// Applies budget defaults to a legacy row.
    ///
    /// The patient reference is left unset; the budget stage fills it in with
    /// the patient's new id.
    #[must_use]
    pub fn from_row(row: &Row, defaults: &DefaultValues, started_at: NaiveDateTime) -> Self {
        let old_id = old_id_or_zero(row, budget_cols::OLD_ID);
        let model = budget::ActiveModel {
            parent_clinic_id: Set(reference_or(
                row.get(budget_cols::PARENT_CLINIC),
                defaults.parent_clinic_id,
            )),
            clinic_id: Set(reference_or(row.get(budget_cols::CLINIC), defaults.clinic_id)),
            date: Set(timestamp_or(row.get(budget_cols::DATE), started_at)),
            document_url: Set(text_or(row.get(budget_cols::DOCUMENT_URL), "")),
            total_amount: Set(decimal_or(row.get(budget_cols::TOTAL), 0.0)),
            paid_amount: Set(decimal_or(row.get(budget_cols::PAID), 0.0)),
            outstanding_balance: Set(decimal_or(row.get(budget_cols::OUTSTANDING), 0.0)),
            status_id: Set(reference_or(
                row.get(budget_cols::STATUS),
                defaults.budget_status_id,
            )),
            payment_type_id: Set(reference_or(
                row.get(budget_cols::PAYMENT_TYPE),
                defaults.payment_type_id,
            )),
            old_id: Set(old_id.to_string()),
            registration_state_id: Set(reference_or(
                row.get(budget_cols::REGISTRATION_STATE),
                defaults.registration_state_id,
            )),
            ..Default::default()
        };
        Self {
            old_id,
            patient: LegacyId::reference(row.get(budget_cols::PATIENT)),
            model,
        }
    }
}

/// A budget line ready to insert once its references are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct DetailDraft {
    /// Legacy id of the row
    pub old_id: LegacyId,
    /// Legacy id of the owning budget
    pub budget: Option<LegacyId>,
    /// Legacy id of the referenced treatment
    pub treatment: Option<LegacyId>,
    /// Legacy id of the referenced product
    pub product: Option<LegacyId>,
    /// Values to insert; references are filled in by the detail stage
    pub model: budget_detail::ActiveModel,
}

impl DetailDraft {
    /// Applies line defaults to a legacy row.
    ///
    /// When the export has no line total it is computed as
    /// `quantity * unit price - discount`.
    #[must_use]
    pub fn from_row(row: &Row, defaults: &DefaultValues) -> Self {
        let old_id = old_id_or_zero(row, detail_cols::OLD_ID);
        let quantity = decimal_or(row.get(detail_cols::QUANTITY), 1.0);
        let unit_price = decimal_or(row.get(detail_cols::PRICE), 0.0);
        let discount = decimal_or(row.get(detail_cols::DISCOUNT), 0.0);
        let line_total = row
            .get(detail_cols::LINE_TOTAL)
            .map_or_else(
                || round_cents(quantity.mul_add(unit_price, -discount)),
                |total| decimal_or(Some(total), 0.0),
            );

        let model = budget_detail::ActiveModel {
            line_number: Set(integer_or(row.get(detail_cols::LINE_NUMBER), 0)),
            description: Set(text_or(row.get(detail_cols::DESCRIPTION), "")),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            discount: Set(discount),
            tax_type_id: Set(reference_or(
                row.get(detail_cols::TAX_TYPE),
                defaults.tax_type_id,
            )),
            line_total: Set(line_total),
            old_id: Set(old_id.to_string()),
            ..Default::default()
        };
        Self {
            old_id,
            budget: LegacyId::reference(row.get(detail_cols::BUDGET)),
            treatment: LegacyId::reference(row.get(detail_cols::TREATMENT)),
            product: LegacyId::reference(row.get(detail_cols::PRODUCT)),
            model,
        }
    }
}
