//! URL 验证模块
//!
//! 只接受 http/https 目标地址，阻止危险协议

use url::Url;

use crate::errors::SnaplinkError;

/// 目标地址最大长度
pub const MAX_URL_LENGTH: usize = 2048;

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// 校验并规范化目标 URL（去除首尾空白）
///
/// 检查项目：非空、长度、危险协议、仅限 http/https、必须带主机名。
pub fn validate_url(url: &str) -> Result<String, SnaplinkError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(SnaplinkError::validation("URL cannot be empty"));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(SnaplinkError::validation(format!(
            "URL is longer than {} characters",
            MAX_URL_LENGTH
        )));
    }

    let url_lower = url.to_lowercase();
    if let Some(proto) = DANGEROUS_PROTOCOLS.iter().find(|p| url_lower.starts_with(**p)) {
        return Err(SnaplinkError::validation(format!(
            "Dangerous protocol blocked: {}",
            proto
        )));
    }

    let parsed =
        Url::parse(url).map_err(|e| SnaplinkError::validation(format!("Invalid URL format: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(SnaplinkError::validation(format!(
                "Invalid protocol: {}:. Only http:// and https:// are allowed",
                other
            )));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(SnaplinkError::validation("URL must include a host"));
    }

    Ok(url.to_string())
}
