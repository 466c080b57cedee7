//! API 模块常量定义

/// 会话 Cookie 名称
pub const SESSION_COOKIE_NAME: &str = "snaplink_session";

/// 管理端点密钥请求头
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// 上传文件大小上限（批量创建）
pub const MAX_BULK_UPLOAD_BYTES: usize = 1024 * 1024;
