use serde::{Deserialize, Serialize};

/// One statement stream: a branch/account pair as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub branch: String,
    pub number: String,
}

impl AccountRef {
    pub fn new(branch: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            number: number.into(),
        }
    }

    /// Path id expected by the statement/balance endpoints:
    /// branch zero-filled to 4 digits, account to 12, joined with a dot.
    pub fn statement_id(&self) -> String {
        format!("{:0>4}.{:0>12}", self.branch, self.number)
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.branch, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_id_padding() {
        let acc = AccountRef::new("2271", "130137784");
        assert_eq!(acc.statement_id(), "2271.000130137784");

        let short = AccountRef::new("12", "99");
        assert_eq!(short.statement_id(), "0012.000000000099");
    }

    #[test]
    fn test_already_padded_number_is_kept() {
        let acc = AccountRef::new("2271", "000130107983");
        assert_eq!(acc.statement_id(), "2271.000130107983");
    }
}
