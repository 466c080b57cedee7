//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::SnaplinkError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证与权限错误
/// - 3000-3099: 链接与账户写入错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    BatchSizeTooLarge = 1010,
    InvalidMultipartData = 1011,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenInvalid = 2002,
    Forbidden = 2005,
    NotGuest = 2006,

    // 链接与账户写入错误 3000-3099
    /// Duplicate username or email
    Conflict = 3001,
    QuotaExceeded = 3007,
    CodeSpaceExhausted = 3008,
}

impl From<&SnaplinkError> for ErrorCode {
    fn from(err: &SnaplinkError) -> Self {
        match err {
            SnaplinkError::Unauthorized(_) => ErrorCode::AuthFailed,
            SnaplinkError::TokenInvalid(_) => ErrorCode::TokenInvalid,
            SnaplinkError::Forbidden(_) => ErrorCode::Forbidden,
            SnaplinkError::NotFound(_) => ErrorCode::NotFound,
            SnaplinkError::Conflict(_) => ErrorCode::Conflict,
            SnaplinkError::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            SnaplinkError::Validation(_) | SnaplinkError::Serialization(_) => {
                ErrorCode::BadRequest
            }
            SnaplinkError::NotGuest(_) => ErrorCode::NotGuest,
            SnaplinkError::CodeSpaceExhausted(_) => ErrorCode::CodeSpaceExhausted,
            SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::DatabaseConnection(_)
            | SnaplinkError::DatabaseOperation(_)
            | SnaplinkError::PasswordHash(_)
            | SnaplinkError::TokenIssue(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(serde_json::to_string(&ErrorCode::Conflict).unwrap(), "3001");
        assert_eq!(serde_json::to_string(&ErrorCode::QuotaExceeded).unwrap(), "3007");
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (SnaplinkError::unauthorized("x"), ErrorCode::AuthFailed),
            (SnaplinkError::token_invalid("x"), ErrorCode::TokenInvalid),
            (SnaplinkError::forbidden("x"), ErrorCode::Forbidden),
            (SnaplinkError::not_found("x"), ErrorCode::NotFound),
            (SnaplinkError::conflict("x"), ErrorCode::Conflict),
            (SnaplinkError::quota_exceeded("x"), ErrorCode::QuotaExceeded),
            (SnaplinkError::validation("x"), ErrorCode::BadRequest),
            (SnaplinkError::not_guest("x"), ErrorCode::NotGuest),
            (SnaplinkError::code_space_exhausted("x"), ErrorCode::CodeSpaceExhausted),
            (SnaplinkError::database_operation("x"), ErrorCode::InternalServerError),
        ];
        for (err, code) in cases {
            assert_eq!(ErrorCode::from(&err), code, "{}", err);
        }
    }
}
