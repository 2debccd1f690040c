pub mod cycle;
pub mod product;
