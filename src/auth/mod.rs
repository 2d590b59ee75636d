//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod roles;

pub use jwt::{Claims, IssuedToken, TokenService, TOKEN_ISSUER};
pub use middleware::{extract_token, request_gate, role_gate, AuthContext, RequestGate, RoleGate};
pub use password::PasswordHasher;
pub use roles::{Role, UnknownRole};
