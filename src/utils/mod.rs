pub mod password;
pub mod url_validator;

/// 短码字母表：A-Z a-z 0-9
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 从 62 字符字母表中均匀抽取 `length` 个字符
pub fn generate_random_code(length: usize) -> String {
    std::iter::repeat_with(|| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// 路径段是否可能是一个短码（仅字母数字）
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_has_62_unique_chars() {
        let unique: std::collections::HashSet<u8> = CODE_ALPHABET.iter().copied().collect();
        assert_eq!(CODE_ALPHABET.len(), 62);
        assert_eq!(unique.len(), 62);
    }

    #[test]
    fn test_generate_random_code_length_and_alphabet() {
        for len in [1, 7, 16] {
            let code = generate_random_code(len);
            assert_eq!(code.len(), len);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_random_code_covers_alphabet() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            seen.extend(generate_random_code(16).bytes());
        }
        // 6400 draws over 62 symbols: every symbol shows up with overwhelming probability
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn test_is_valid_short_code() {
        assert!(is_valid_short_code("aZ09xYq"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("abc-def"));
        assert!(!is_valid_short_code("favicon.ico"));
    }
}
