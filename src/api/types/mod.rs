//! HTTP request, response and error types

pub mod error;
pub mod json;
pub mod user;

pub use error::{ApiError, ApiErrorResponse};
pub use json::{Json, ValidatedJson};
pub use user::{
    AccessTokenResponse, LoginDto, PrincipalResponse, ProviderCallbackQuery, RefreshQuery,
    RegisterDto, UpdateUserDto, UserResponse,
};
