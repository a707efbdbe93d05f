//! One module per screen: each owns its subcommand enum and the flows behind
//! it. Mutations never patch local state; they re-fetch whatever they touched
//! before rendering again.

pub mod cnpj;
pub mod consultores;
pub mod cronograma;
pub mod dashboard;
pub mod empresas;
pub mod formularios;
pub mod prospeccoes;
pub mod usuarios;
