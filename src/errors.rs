use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum SnaplinkError {
    Unauthorized(String),
    TokenInvalid(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    QuotaExceeded(String),
    Validation(String),
    NotGuest(String),
    CodeSpaceExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    PasswordHash(String),
    TokenIssue(String),
    Serialization(String),
}

impl SnaplinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::Unauthorized(_) => "E001",
            SnaplinkError::TokenInvalid(_) => "E002",
            SnaplinkError::Forbidden(_) => "E003",
            SnaplinkError::NotFound(_) => "E004",
            SnaplinkError::Conflict(_) => "E005",
            SnaplinkError::QuotaExceeded(_) => "E006",
            SnaplinkError::Validation(_) => "E007",
            SnaplinkError::NotGuest(_) => "E008",
            SnaplinkError::CodeSpaceExhausted(_) => "E009",
            SnaplinkError::DatabaseConfig(_) => "E010",
            SnaplinkError::DatabaseConnection(_) => "E011",
            SnaplinkError::DatabaseOperation(_) => "E012",
            SnaplinkError::PasswordHash(_) => "E013",
            SnaplinkError::TokenIssue(_) => "E014",
            SnaplinkError::Serialization(_) => "E015",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::Unauthorized(_) => "Unauthorized",
            SnaplinkError::TokenInvalid(_) => "Invalid Token",
            SnaplinkError::Forbidden(_) => "Forbidden",
            SnaplinkError::NotFound(_) => "Resource Not Found",
            SnaplinkError::Conflict(_) => "Conflict",
            SnaplinkError::QuotaExceeded(_) => "Quota Exceeded",
            SnaplinkError::Validation(_) => "Validation Error",
            SnaplinkError::NotGuest(_) => "Not A Guest Account",
            SnaplinkError::CodeSpaceExhausted(_) => "Code Space Exhausted",
            SnaplinkError::DatabaseConfig(_) => "Database Configuration Error",
            SnaplinkError::DatabaseConnection(_) => "Database Connection Error",
            SnaplinkError::DatabaseOperation(_) => "Database Operation Error",
            SnaplinkError::PasswordHash(_) => "Password Hash Error",
            SnaplinkError::TokenIssue(_) => "Token Issue Error",
            SnaplinkError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SnaplinkError::Unauthorized(msg)
            | SnaplinkError::TokenInvalid(msg)
            | SnaplinkError::Forbidden(msg)
            | SnaplinkError::NotFound(msg)
            | SnaplinkError::Conflict(msg)
            | SnaplinkError::QuotaExceeded(msg)
            | SnaplinkError::Validation(msg)
            | SnaplinkError::NotGuest(msg)
            | SnaplinkError::CodeSpaceExhausted(msg)
            | SnaplinkError::DatabaseConfig(msg)
            | SnaplinkError::DatabaseConnection(msg)
            | SnaplinkError::DatabaseOperation(msg)
            | SnaplinkError::PasswordHash(msg)
            | SnaplinkError::TokenIssue(msg)
            | SnaplinkError::Serialization(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            SnaplinkError::Unauthorized(_) | SnaplinkError::TokenInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            SnaplinkError::Forbidden(_) | SnaplinkError::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            SnaplinkError::NotFound(_) => StatusCode::NOT_FOUND,
            SnaplinkError::Conflict(_) => StatusCode::CONFLICT,
            SnaplinkError::Validation(_)
            | SnaplinkError::NotGuest(_)
            | SnaplinkError::Serialization(_) => StatusCode::BAD_REQUEST,
            SnaplinkError::CodeSpaceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::DatabaseConnection(_)
            | SnaplinkError::DatabaseOperation(_)
            | SnaplinkError::PasswordHash(_)
            | SnaplinkError::TokenIssue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为服务端内部错误（不向客户端暴露细节）
    pub fn is_internal(&self) -> bool {
        self.http_status().is_server_error() && !matches!(self, SnaplinkError::CodeSpaceExhausted(_))
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SnaplinkError {}

// 便捷的构造函数
impl SnaplinkError {
    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Unauthorized(msg.into())
    }

    pub fn token_invalid<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::TokenInvalid(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Conflict(msg.into())
    }

    pub fn quota_exceeded<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::QuotaExceeded(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Validation(msg.into())
    }

    pub fn not_guest<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotGuest(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::CodeSpaceExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseOperation(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::PasswordHash(msg.into())
    }

    pub fn token_issue<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::TokenIssue(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SnaplinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(e) => SnaplinkError::DatabaseConnection(e.to_string()),
            sea_orm::DbErr::ConnectionAcquire(e) => {
                SnaplinkError::DatabaseConnection(e.to_string())
            }
            other => SnaplinkError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SnaplinkError {
    fn from(err: serde_json::Error) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

/// 解码失败统一视为无效令牌；签发失败由调用方映射为 TokenIssue
impl From<jsonwebtoken::errors::Error> for SnaplinkError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                SnaplinkError::TokenInvalid("Token expired".into())
            }
            _ => SnaplinkError::TokenInvalid(format!("Invalid token: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for SnaplinkError {
    fn from(err: validator::ValidationErrors) -> Self {
        SnaplinkError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;
