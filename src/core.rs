pub mod current;
pub mod fuel_adjustment;
pub mod levy;
pub mod tariff;
pub mod year_month;
