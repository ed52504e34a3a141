// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token + route table)
pub mod protected;
pub mod public;
