//! Concrete repository implementations.

pub mod permission;
pub mod role;
pub mod user;

pub use permission::PermissionRepository;
pub use role::RoleRepository;
pub use user::UserRepository;
