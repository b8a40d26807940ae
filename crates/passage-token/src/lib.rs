//! Bearer-token types shared across Passage services.
//!
//! Provides JWT claims, the rotating [`token::KeySet`] used to verify (and,
//! with the `issuer` feature, sign) tokens, and the [`bearer::BearerToken`]
//! extractor.

pub mod bearer;
pub mod token;
