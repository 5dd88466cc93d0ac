//! `reconwarden-auth` — authentication boundary for the HTTP surface.
//!
//! Tenant identity is resolved from validated JWT claims; authorization policy
//! beyond role membership is owned by an external collaborator.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::PrincipalId;
pub use roles::Role;
