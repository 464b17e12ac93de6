pub mod identity;
pub mod memory;
pub mod refresh_token;

pub use identity::PostgresIdentityRepository;
pub use memory::InMemoryIdentityRepository;
pub use memory::InMemoryRefreshTokenRepository;
pub use refresh_token::PostgresRefreshTokenRepository;
