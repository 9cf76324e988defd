//! Session token verification and claims; development token minting.

pub mod claims;
pub mod issuer;
pub mod validator;

pub use claims::SessionClaims;
pub use issuer::{IssuedToken, TokenIssuer};
pub use validator::{InvalidReason, SessionValidator, ValidatedSession, ValidationOutcome};
