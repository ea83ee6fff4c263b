//! Authentication: credential hashing, bearer tokens, the bearer layer and
//! the operator basic-auth gate.

pub mod basic;
pub mod extractor;
pub mod layer;
pub mod password;
pub mod token;
pub mod types;

pub use basic::{constant_time_eq, BasicAuthLayer, BasicAuthMiddleware};
pub use extractor::Auth;
pub use layer::{authenticate, AuthLayer, AuthMiddleware};
pub use password::{hash_password, verify_against_decoy, verify_password, HashError};
pub use token::{TokenError, TokenService};
pub use types::{AuthFailure, AuthUser, Claims};
