//! 送信元アドレスの解決

use notiflow_domain::notification::SenderRef;

/// 送信元アドレスを決定する
///
/// 優先順位:
/// 1. 送信者がメールアドレスを持つユーザーならそのアドレス
/// 2. 明示的な送信元アドレス（空文字列は未指定扱い）
/// 3. 設定の既定アドレス
pub fn resolve_from_address(
    sender: &SenderRef,
    from_address: Option<&str>,
    default_from_email: &str,
) -> String {
    sender
        .email()
        .or(from_address.filter(|address| !address.is_empty()))
        .unwrap_or(default_from_email)
        .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const DEFAULT: &str = "webmaster@localhost";

    #[rstest]
    #[case(SenderRef::user("1", "ann@example.com"), Some("from@example.com"), "ann@example.com")]
    #[case(SenderRef::user("1", "ann@example.com"), None, "ann@example.com")]
    #[case(SenderRef::user("1", ""), Some("from@example.com"), "from@example.com")]
    #[case(SenderRef::other("sample.author", "3"), Some("from@example.com"), "from@example.com")]
    #[case(SenderRef::other("sample.author", "3"), None, DEFAULT)]
    #[case(SenderRef::None, Some("from@example.com"), "from@example.com")]
    #[case(SenderRef::None, Some(""), DEFAULT)]
    #[case(SenderRef::None, None, DEFAULT)]
    fn test_送信元アドレスの優先順位(
        #[case] sender: SenderRef,
        #[case] from_address: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(resolve_from_address(&sender, from_address, DEFAULT), expected);
    }
}
