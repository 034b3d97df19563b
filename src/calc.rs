//! Profit arithmetic for a gathering.
//!
//! `calculate` validates the required inputs, normalises the rest with the
//! permissive rules of the form (blank or unparsable optional numbers count as
//! zero) and produces a [`Calculation`]: the normalised snapshot plus the
//! derived [`CalculationResult`].

use crate::form::GatheringForm;
use crate::format::unformat_number;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("enter a title for the gathering")]
    MissingTitle,
    #[error("pick the date of the gathering")]
    MissingDate,
    #[error("the date must look like YYYY-MM-DD")]
    InvalidDate,
    #[error("enter the number of participants")]
    MissingParticipants,
    #[error("the number of participants must be a whole number of zero or more")]
    InvalidParticipants,
    #[error("enter the fee per person")]
    MissingFeePerPerson,
    #[error("the fee per person must be a whole amount of zero or more")]
    InvalidFeePerPerson,
}

/// A material line with its numbers coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialCost {
    pub name: String,
    pub unit_price: i64,
    pub quantity: i64,
}

impl MaterialCost {
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(self.quantity)
    }
}

/// Validated, normalised copy of the form at the moment it was calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatheringSnapshot {
    pub title: String,
    pub date: NaiveDate,
    pub location: String,
    pub participant_count: i64,
    pub fee_per_person: i64,
    pub materials: Vec<MaterialCost>,
    pub venue_fee: i64,
    pub platform_fee_percent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_profit: Option<i64>,
}

impl GatheringSnapshot {
    pub fn from_form(form: &GatheringForm) -> Result<Self, ValidationError> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let date = form.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate)?;

        let participant_count = required_amount(
            &form.participant_count,
            ValidationError::MissingParticipants,
            ValidationError::InvalidParticipants,
        )?;
        let fee_per_person = required_amount(
            &form.fee_per_person,
            ValidationError::MissingFeePerPerson,
            ValidationError::InvalidFeePerPerson,
        )?;

        let materials = form
            .materials
            .iter()
            .map(|line| MaterialCost {
                name: line.name.trim().to_string(),
                unit_price: coerce_amount(&line.unit_price),
                quantity: coerce_amount(&line.quantity),
            })
            .collect();

        Ok(Self {
            title: title.to_string(),
            date,
            location: form.location.trim().to_string(),
            participant_count,
            fee_per_person,
            materials,
            venue_fee: coerce_amount(&form.venue_fee),
            platform_fee_percent: coerce_percent(&form.platform_fee_percent),
            target_profit: parse_amount(&form.target_profit),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub total_revenue: i64,
    pub materials_cost: i64,
    pub platform_fee_amount: i64,
    pub venue_fee: i64,
    pub net_profit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fee_per_person: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    pub snapshot: GatheringSnapshot,
    pub result: CalculationResult,
}

pub fn calculate(form: &GatheringForm) -> Result<Calculation, ValidationError> {
    let snapshot = GatheringSnapshot::from_form(form)?;
    let result = compute(&snapshot);
    Ok(Calculation { snapshot, result })
}

pub fn compute(snapshot: &GatheringSnapshot) -> CalculationResult {
    let total_revenue = snapshot
        .participant_count
        .saturating_mul(snapshot.fee_per_person);
    let materials_cost = materials_total(&snapshot.materials);
    let platform_fee_amount = platform_fee(total_revenue, snapshot.platform_fee_percent);
    let net_profit = total_revenue
        .saturating_sub(materials_cost)
        .saturating_sub(platform_fee_amount)
        .saturating_sub(snapshot.venue_fee);

    let suggested_fee_per_person = snapshot.target_profit.and_then(|target| {
        suggested_fee(
            snapshot.fee_per_person,
            snapshot.participant_count,
            net_profit,
            target,
        )
    });

    CalculationResult {
        total_revenue,
        materials_cost,
        platform_fee_amount,
        venue_fee: snapshot.venue_fee,
        net_profit,
        suggested_fee_per_person,
    }
}

fn materials_total(materials: &[MaterialCost]) -> i64 {
    materials
        .iter()
        .fold(0i64, |sum, line| sum.saturating_add(line.line_total()))
}

/// `floor(revenue * percent / 100)`
fn platform_fee(revenue: i64, percent: Decimal) -> i64 {
    Decimal::from(revenue)
        .checked_mul(percent)
        .and_then(|gross| gross.checked_div(Decimal::ONE_HUNDRED))
        .map(|fee| saturate(fee.floor()))
        .unwrap_or(i64::MAX)
}

/// Per-person fee that closes the gap to `target`, rounded up. `None` when
/// the target is already met or there is nobody to spread the gap over.
fn suggested_fee(fee: i64, participants: i64, net_profit: i64, target: i64) -> Option<i64> {
    if net_profit >= target || participants <= 0 {
        return None;
    }
    let gap = Decimal::from(target) - Decimal::from(net_profit);
    let per_person = gap.checked_div(Decimal::from(participants))?;
    let fee = Decimal::from(fee).checked_add(per_person)?;
    Some(saturate(fee.ceil()))
}

fn saturate(value: Decimal) -> i64 {
    i64::try_from(value).unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Ungrouped integer amount, if the text holds one.
pub fn parse_amount(raw: &str) -> Option<i64> {
    unformat_number(raw).trim().parse::<i64>().ok()
}

pub fn coerce_amount(raw: &str) -> i64 {
    parse_amount(raw).unwrap_or(0)
}

pub fn coerce_percent(raw: &str) -> Decimal {
    Decimal::from_str(unformat_number(raw).trim()).unwrap_or(Decimal::ZERO)
}

fn required_amount(
    raw: &str,
    missing: ValidationError,
    invalid: ValidationError,
) -> Result<i64, ValidationError> {
    if raw.trim().is_empty() {
        return Err(missing);
    }
    match parse_amount(raw) {
        Some(value) if value >= 0 => Ok(value),
        _ => Err(invalid),
    }
}

/// Platform fee hint shown next to the percentage input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "camelCase")]
pub enum PlatformFeePreview {
    /// No percentage entered.
    None,
    /// A percentage is entered but participants or fee are not.
    NeedsInputs,
    Amount(i64),
}

/// Running totals shown while the form is being filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPreview {
    pub materials_total: i64,
    pub line_totals: Vec<i64>,
    pub platform_fee: PlatformFeePreview,
}

pub fn preview(form: &GatheringForm) -> FormPreview {
    let line_totals: Vec<i64> = form
        .materials
        .iter()
        .map(|line| coerce_amount(&line.unit_price).saturating_mul(coerce_amount(&line.quantity)))
        .collect();
    let materials_total = line_totals
        .iter()
        .fold(0i64, |sum, total| sum.saturating_add(*total));

    let platform_fee = if form.platform_fee_percent.trim().is_empty() {
        PlatformFeePreview::None
    } else {
        match (
            parse_amount(&form.participant_count),
            parse_amount(&form.fee_per_person),
        ) {
            (Some(participants), Some(fee)) => PlatformFeePreview::Amount(platform_fee(
                participants.saturating_mul(fee),
                coerce_percent(&form.platform_fee_percent),
            )),
            _ => PlatformFeePreview::NeedsInputs,
        }
    };

    FormPreview {
        materials_total,
        line_totals,
        platform_fee,
    }
}
