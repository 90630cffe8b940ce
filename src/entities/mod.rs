pub mod brand;
pub mod brand_financial_summary;
pub mod brand_forecast;
pub mod category;
pub mod category_financial_summary;
pub mod financial_fact;
pub mod product; // cached trailing, stock and overstock metrics live here
pub mod product_forecast;
pub mod seasonality_group;
pub mod stock_snapshot;
