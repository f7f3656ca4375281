pub mod dsl;
pub mod expand;
pub mod grammar;
pub mod mutate;
pub mod pipeline;
pub mod session;
