//! Procedures: builder, frozen procedures and their contracts
//!
//! A [`ProcedureBuilder`] accumulates a name, schemas, middleware and an
//! error tap; `query`, `mutation` or `mock` freezes it into a
//! [`Procedure`]. The router stores procedures behind [`DynProcedure`],
//! clients only need the [`ProcedureContract`].

mod builder;
mod callable;
mod contract;
mod dyn_procedure;
mod pipeline;

pub use builder::ProcedureBuilder;
pub use callable::Procedure;
pub use contract::ProcedureContract;
pub use dyn_procedure::DynProcedure;
pub use pipeline::ErrorTap;

