//! 数据模型模块
//! 用户账户、登录与患者记录

pub mod auth;
pub mod patient;
pub mod user;

pub use auth::{LoginRequest, LoginResponse};
pub use patient::{
    Gender, NewPatient, Patient, PatientListQuery, PatientPage, PatientRequest, PatientSearchQuery,
};
pub use user::{
    CreateUserRequest, NewUser, RegisterRequest, RoleRegisterRequest, User, UserListQuery,
    UserResponse,
};
