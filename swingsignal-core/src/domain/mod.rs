//! Domain types shared by every stage of the pipeline.

pub mod bar;
pub mod series;

pub use bar::{Column, PriceBar};
pub use series::{PriceLookupError, PriceSeries, SeriesError, SeriesWindow};
