//! Algorithm implementations for incidence analysis
//!
//! The pipeline runs calendar normalization, imputation and clustering on
//! incidence tables; the lag scanner runs on per-capita outcome rates
//! joined with an exposure series.

pub mod calendar;
pub mod clustering;
pub mod imputation;
pub mod lag;
pub mod population;
pub mod statistics;
