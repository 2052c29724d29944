//! Bill line-item arithmetic.
//!
//! ```text
//! amount          = unit × rate            (IP lines carry the amount directly)
//! discount_amount = amount × percent / 100
//! total           = amount − discount_amount
//! net             = Σamount − Σdiscount_amount + extra charges
//! ```
//!
//! An edit to one line recomputes that line only. Stored values are never rounded; rounding
//! to two places happens in [`format_money`].

use crate::constants::{
    IP_DEFAULT_DEPARTMENT, IP_DEFAULT_PARTICULAR, OP_DEFAULT_DEPARTMENT, OP_DEFAULT_PARTICULAR,
};
use crate::models::Particular;
use crate::validation::require_non_negative;
use crate::{HmsError, HmsResult};
use hms_types::Percent;
use serde::{Deserialize, Serialize};

/// Derived amounts of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineAmounts {
    pub amount: f64,
    pub discount_amount: f64,
    pub total: f64,
}

/// Applies a discount percentage to a gross amount.
pub fn compute_line(amount: f64, discount: Percent) -> LineAmounts {
    let discount_amount = discount.of(amount);
    LineAmounts {
        amount,
        discount_amount,
        total: amount - discount_amount,
    }
}

/// Formats a stored amount for display, rounded to two places.
pub fn format_money(value: f64) -> String {
    format!("₹{value:.2}")
}

/// Read access shared by OP and IP lines for bill-level aggregation.
pub trait LineItem {
    fn particular(&self) -> &str;
    fn amount(&self) -> f64;
    fn discount_amount(&self) -> f64;
    fn total(&self) -> f64;
}

/// One line of an OP bill: unit × rate with a percentage discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpLineItem {
    #[serde(deserialize_with = "crate::models::null_as_default")]
    pub particular: String,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    pub doctor: String,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    pub department: String,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    unit: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    rate: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    amount: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    discount_percent: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    discount_amount: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    total: f64,
}

impl Default for OpLineItem {
    fn default() -> Self {
        Self {
            particular: String::new(),
            doctor: String::new(),
            department: String::new(),
            unit: 1.0,
            rate: 0.0,
            amount: 0.0,
            discount_percent: 0.0,
            discount_amount: 0.0,
            total: 0.0,
        }
    }
}

impl OpLineItem {
    pub fn new(particular: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            particular: particular.into(),
            department: department.into(),
            ..Self::default()
        }
    }

    /// Builds a fully computed line.
    pub fn priced(
        particular: impl Into<String>,
        department: impl Into<String>,
        unit: f64,
        rate: f64,
        discount_percent: f64,
    ) -> HmsResult<Self> {
        let mut line = Self::new(particular, department);
        line.set_unit(unit)?;
        line.set_rate(rate)?;
        line.set_discount_percent(discount_percent)?;
        Ok(line)
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn discount_percent(&self) -> f64 {
        self.discount_percent
    }

    pub fn set_unit(&mut self, unit: f64) -> HmsResult<()> {
        require_non_negative("unit", unit)?;
        self.unit = unit;
        self.recompute();
        Ok(())
    }

    pub fn set_rate(&mut self, rate: f64) -> HmsResult<()> {
        require_non_negative("rate", rate)?;
        self.rate = rate;
        self.recompute();
        Ok(())
    }

    pub fn set_discount_percent(&mut self, percent: f64) -> HmsResult<()> {
        let percent = Percent::new(percent)?;
        self.discount_percent = percent.value();
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        // discount_percent only ever holds a validated value; stored lines are trusted as-is
        let percent = Percent::new(self.discount_percent).unwrap_or(Percent::ZERO);
        let computed = compute_line(self.unit * self.rate, percent);
        self.amount = computed.amount;
        self.discount_amount = computed.discount_amount;
        self.total = computed.total;
    }
}

impl LineItem for OpLineItem {
    fn particular(&self) -> &str {
        &self.particular
    }
    fn amount(&self) -> f64 {
        self.amount
    }
    fn discount_amount(&self) -> f64 {
        self.discount_amount
    }
    fn total(&self) -> f64 {
        self.total
    }
}

/// One line of an IP bill: an entered amount with a percentage discount.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpLineItem {
    #[serde(deserialize_with = "crate::models::null_as_default")]
    pub particular: String,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    pub department: String,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    amount: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    discount_percent: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    discount_amount: f64,
    #[serde(deserialize_with = "crate::models::null_as_default")]
    total: f64,
}

impl IpLineItem {
    pub fn new(particular: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            particular: particular.into(),
            department: department.into(),
            ..Self::default()
        }
    }

    pub fn priced(
        particular: impl Into<String>,
        department: impl Into<String>,
        amount: f64,
        discount_percent: f64,
    ) -> HmsResult<Self> {
        let mut line = Self::new(particular, department);
        line.set_amount(amount)?;
        line.set_discount_percent(discount_percent)?;
        Ok(line)
    }

    pub fn discount_percent(&self) -> f64 {
        self.discount_percent
    }

    pub fn set_amount(&mut self, amount: f64) -> HmsResult<()> {
        require_non_negative("amount", amount)?;
        self.amount = amount;
        self.recompute();
        Ok(())
    }

    pub fn set_discount_percent(&mut self, percent: f64) -> HmsResult<()> {
        let percent = Percent::new(percent)?;
        self.discount_percent = percent.value();
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        let percent = Percent::new(self.discount_percent).unwrap_or(Percent::ZERO);
        let computed = compute_line(self.amount, percent);
        self.discount_amount = computed.discount_amount;
        self.total = computed.total;
    }
}

impl LineItem for IpLineItem {
    fn particular(&self) -> &str {
        &self.particular
    }
    fn amount(&self) -> f64 {
        self.amount
    }
    fn discount_amount(&self) -> f64 {
        self.discount_amount
    }
    fn total(&self) -> f64 {
        self.total
    }
}

/// Additive tax lines of an IP bill.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Taxes {
    pub service_tax: f64,
    pub education_cess: f64,
    pub she_education_cess: f64,
}

impl Taxes {
    pub fn new(service_tax: f64, education_cess: f64, she_education_cess: f64) -> HmsResult<Self> {
        require_non_negative("service tax", service_tax)?;
        require_non_negative("education cess", education_cess)?;
        require_non_negative("SHE education cess", she_education_cess)?;
        Ok(Self {
            service_tax,
            education_cess,
            she_education_cess,
        })
    }

    pub fn sum(&self) -> f64 {
        self.service_tax + self.education_cess + self.she_education_cess
    }
}

/// Bill-level aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BillTotals {
    pub total_amount: f64,
    pub total_discount: f64,
    /// `total_amount − total_discount`, before extra charges.
    pub sub_total: f64,
    pub extra_charges: f64,
    pub net_amount: f64,
}

impl BillTotals {
    pub fn compute<L: LineItem>(lines: &[L], extra_charges: f64) -> Self {
        let total_amount: f64 = lines.iter().map(LineItem::amount).sum();
        let total_discount: f64 = lines.iter().map(LineItem::discount_amount).sum();
        let sub_total = total_amount - total_discount;
        Self {
            total_amount,
            total_discount,
            sub_total,
            extra_charges,
            net_amount: sub_total + extra_charges,
        }
    }
}

/// The ordered, never-empty line list of a bill being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct BillLines<L> {
    lines: Vec<L>,
}

impl<L: LineItem + Clone> BillLines<L> {
    /// Starts from `template`; an empty template is not a valid bill.
    pub fn from_template(template: Vec<L>) -> HmsResult<Self> {
        if template.is_empty() {
            return Err(HmsError::InvalidInput(
                "a bill needs at least one line".into(),
            ));
        }
        Ok(Self { lines: template })
    }

    /// Starts from `template`, or from a single `fallback` line when it is empty.
    pub fn with_fallback(template: Vec<L>, fallback: impl FnOnce() -> L) -> Self {
        if template.is_empty() {
            Self {
                lines: vec![fallback()],
            }
        } else {
            Self { lines: template }
        }
    }

    pub fn as_slice(&self) -> &[L] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push(&mut self, line: L) {
        self.lines.push(line);
    }

    /// Removes a line; the last remaining line is kept and `false` returned.
    pub fn remove(&mut self, index: usize) -> HmsResult<bool> {
        if index >= self.lines.len() {
            return Err(HmsError::NoSuchLine(index));
        }
        if self.lines.len() == 1 {
            return Ok(false);
        }
        self.lines.remove(index);
        Ok(true)
    }

    pub fn line_mut(&mut self, index: usize) -> HmsResult<&mut L> {
        self.lines.get_mut(index).ok_or(HmsError::NoSuchLine(index))
    }

    /// Replaces every line; falls back to `template` when `lines` is empty.
    pub fn replace(&mut self, lines: Vec<L>, template: Vec<L>) {
        self.lines = if lines.is_empty() { template } else { lines };
    }

    pub fn totals(&self, extra_charges: f64) -> BillTotals {
        BillTotals::compute(&self.lines, extra_charges)
    }
}

fn flagged_particulars(particulars: &[Particular], flag: fn(&Particular) -> bool) -> Vec<&Particular> {
    let mut picked: Vec<&Particular> = particulars.iter().filter(|p| flag(p)).collect();
    picked.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    picked
}

/// Default lines of a fresh OP bill.
///
/// Particulars flagged `default_op`, in sort order and seeded with their rate; the fixed
/// consultation line when none are flagged.
pub fn op_template(particulars: &[Particular]) -> Vec<OpLineItem> {
    let picked = flagged_particulars(particulars, |p| p.default_op);
    if picked.is_empty() {
        return vec![OpLineItem::new(OP_DEFAULT_PARTICULAR, OP_DEFAULT_DEPARTMENT)];
    }

    picked
        .into_iter()
        .map(|p| {
            let mut line = OpLineItem::new(p.name.clone(), p.department_label(OP_DEFAULT_DEPARTMENT));
            if let Some(rate) = p.rate.filter(|r| r.is_finite() && *r >= 0.0) {
                line.rate = rate;
                line.recompute();
            }
            line
        })
        .collect()
}

/// Default lines of a fresh IP bill; the fixed room-charges line when none are flagged.
pub fn ip_template(particulars: &[Particular]) -> Vec<IpLineItem> {
    let picked = flagged_particulars(particulars, |p| p.default_ip);
    if picked.is_empty() {
        return vec![IpLineItem::new(IP_DEFAULT_PARTICULAR, IP_DEFAULT_DEPARTMENT)];
    }

    picked
        .into_iter()
        .map(|p| {
            let mut line = IpLineItem::new(p.name.clone(), p.department_label(IP_DEFAULT_DEPARTMENT));
            if let Some(amount) = p.rate.filter(|r| r.is_finite() && *r >= 0.0) {
                line.amount = amount;
                line.recompute();
            }
            line
        })
        .collect()
}

/// Names on `lines` that match no known particular (case-insensitive).
///
/// An empty lookup list means nothing is known, so nothing is reported.
pub fn unknown_particulars<L: LineItem>(lines: &[L], particulars: &[Particular]) -> Vec<String> {
    if particulars.is_empty() {
        return Vec::new();
    }
    lines
        .iter()
        .map(LineItem::particular)
        .filter(|name| {
            !particulars
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(name.trim()))
        })
        .map(str::to_string)
        .collect()
}
