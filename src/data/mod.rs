//! Tabular data handling for catalog datasets.

pub mod csv;
mod table;

pub use table::{Cell, Column, Table};
