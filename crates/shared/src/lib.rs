//! Wire types and pure helpers shared by the Núcleo client surfaces.
//!
//! Field names mirror the backend's JSON contracts exactly (the API speaks
//! Portuguese); enums carry explicit `#[serde(rename)]` values. Nothing in
//! this crate performs I/O, so everything here is unit-testable.

pub mod cronograma;
pub mod empresa;
pub mod formulario;
pub mod mensagem;
pub mod page;
pub mod prospeccao;
pub mod texto;
pub mod usuario;
