pub mod claims;
pub mod errors;
pub mod signer;

pub use claims::Claims;
pub use claims::TokenType;
pub use errors::TokenError;
pub use signer::IssuedToken;
pub use signer::TokenSigner;
pub use signer::VerifiedToken;
