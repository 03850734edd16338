//! # Sale Recording
//!
//! Turns a checkout form into a [`Sale`] and the sold [`Vehicle`].
//!
//! ```text
//! profit     = (sale price + financing + insurance) - vehicle cost
//! commission = profit × salesperson commission rate
//! ```
//!
//! Both values are computed once, here, and stored on the sale. Changing a
//! salesperson's rate later never rewrites past commissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CustomerDetails, Role, Sale, User, Vehicle, VehicleStatus};
use crate::validation::{validate_amount, validate_name, validate_vin};

/// Checkout form submitted by a salesperson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub vehicle_id: String,
    pub customer: CustomerDetails,
    pub sale_price_cents: i64,
    #[serde(default)]
    pub financing_income_cents: i64,
    #[serde(default)]
    pub insurance_income_cents: i64,
}

impl NewSale {
    pub fn validate(&self) -> CoreResult<()> {
        validate_vin(&self.vehicle_id)?;
        validate_name("customer.firstName", &self.customer.first_name)?;
        validate_name("customer.lastName", &self.customer.last_name)?;
        validate_amount("salePriceCents", self.sale_price_cents)?;
        validate_amount("financingIncomeCents", self.financing_income_cents)?;
        validate_amount("insuranceIncomeCents", self.insurance_income_cents)?;
        Ok(())
    }
}

/// Profit and commission for a sale, as frozen on the record.
pub fn sale_economics(
    sale_price: Money,
    financing_income: Money,
    insurance_income: Money,
    cost_price: Money,
    seller: &User,
) -> (Money, Money) {
    let profit = sale_price + financing_income + insurance_income - cost_price;
    let commission = profit.apply_rate(seller.commission_rate());
    (profit, commission)
}

/// Records `input` as sold by `seller` at the vehicle's dealership.
///
/// The vehicle must be in stock at a dealership, and the seller must work
/// at that same dealership. Returns the new sale and the vehicle moved to
/// `Sold`; the caller persists both together.
pub fn record_sale(
    vehicle: &Vehicle,
    seller: &User,
    input: &NewSale,
    now: DateTime<Utc>,
) -> CoreResult<(Sale, Vehicle)> {
    input.validate()?;

    let dealership_id = match (vehicle.status, vehicle.dealership_id.as_deref()) {
        (VehicleStatus::InStock, Some(id)) => id.to_string(),
        _ => return Err(CoreError::invalid_vehicle_status(&vehicle.vin, vehicle.status, "sell")),
    };

    let may_sell = matches!(seller.role, Role::Salesperson | Role::DealershipAdmin)
        && seller.works_at(&dealership_id);
    if !may_sell {
        return Err(CoreError::not_authorized(
            &seller.id,
            format!("sell vehicles of dealership {}", dealership_id),
        ));
    }

    let (profit, commission) = sale_economics(
        Money::from_cents(input.sale_price_cents),
        Money::from_cents(input.financing_income_cents),
        Money::from_cents(input.insurance_income_cents),
        vehicle.cost_price(),
        seller,
    );

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        vehicle_id: vehicle.vin.clone(),
        salesperson_id: seller.id.clone(),
        dealership_id,
        customer: input.customer.clone(),
        sale_price_cents: input.sale_price_cents,
        financing_income_cents: input.financing_income_cents,
        insurance_income_cents: input.insurance_income_cents,
        profit_cents: profit.cents(),
        commission_cents: commission.cents(),
        timestamp: now,
    };

    let mut sold = vehicle.clone();
    sold.record_status(VehicleStatus::Sold, now);

    Ok((sale, sold))
}

// =============================================================================
// Unit Tests
// =============================================================================
