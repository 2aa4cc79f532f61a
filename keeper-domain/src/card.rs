//! Payment-card entities: `Card` (stored, ciphertext) and `BankCardPlaintext`
//! (never stored — validated client-side, then serialized and encrypted
//! into `Card.data`).

use serde::{Deserialize, Serialize};

use crate::error::KeeperError;

/// A card's expiry date as printed on the card: two-digit month, two-digit
/// year, formatted `MM/YY` -- modeled as its own type rather than
/// `chrono::NaiveDate` since a card expiry has no day component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardExpiry {
    /// 1-12.
    pub month: u8,
    /// Two-digit year as printed on the card (e.g. 27 for 2027).
    pub year: u8,
}

impl std::fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

impl std::str::FromStr for CardExpiry {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month_str, year_str) = s
            .split_once('/')
            .ok_or_else(|| KeeperError::Validation(format!("invalid expiry {s:?}, want MM/YY")))?;

        let month: u8 = month_str
            .parse()
            .map_err(|_| KeeperError::Validation(format!("invalid expiry month {month_str:?}")))?;
        let year: u8 = year_str
            .parse()
            .map_err(|_| KeeperError::Validation(format!("invalid expiry year {year_str:?}")))?;

        if !(1..=12).contains(&month) {
            return Err(KeeperError::Validation(format!("invalid expiry month {month}")));
        }

        Ok(Self { month, year })
    }
}

/// A stored card: `data` is the AES-GCM ciphertext (base64) of the JSON
/// encoding of `BankCardPlaintext`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// 16-digit card number, unique per user.
    pub number: String,
    /// Ciphertext (base64).
    pub data: String,
}

/// The plaintext view of a card. Never persisted or transmitted as-is;
/// only `Card.data` (its encrypted serialization) ever leaves the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankCardPlaintext {
    /// 16 ASCII digits, interior whitespace stripped.
    pub number: String,
    /// Expiry date (month/year).
    pub expiry: CardExpiry,
    /// Letters and exactly one interior space.
    pub owner: String,
    /// 3 ASCII digits.
    pub cvv: String,
}

impl BankCardPlaintext {
    /// Validate and construct from raw CLI/user input: number strips
    /// interior whitespace and must be 16 digits; owner is letters with
    /// exactly one interior space; cvv is exactly 3 digits; expiry parses
    /// as `MM/YY`.
    pub fn parse(
        number: &str,
        expiry: &str,
        owner: &str,
        cvv: &str,
    ) -> Result<Self, KeeperError> {
        let number = validate_card_number(number)?;
        let owner = validate_owner(owner)?;
        let cvv = validate_cvv(cvv)?;
        let expiry: CardExpiry = expiry.parse()?;

        Ok(Self {
            number,
            expiry,
            owner,
            cvv,
        })
    }
}

fn validate_card_number(number: &str) -> Result<String, KeeperError> {
    let mut digits = String::with_capacity(16);
    for c in number.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            return Err(KeeperError::Validation(format!(
                "card number contains non-digit, non-space character: {c:?}"
            )));
        }
    }

    if digits.len() != 16 {
        return Err(KeeperError::Validation(format!(
            "card number must have 16 digits, got {}",
            digits.len()
        )));
    }

    Ok(digits)
}

fn validate_owner(owner: &str) -> Result<String, KeeperError> {
    let mut found_space = false;

    for c in owner.chars() {
        if c.is_alphabetic() {
            continue;
        }
        if c.is_whitespace() {
            if found_space {
                return Err(KeeperError::Validation(
                    "card owner must contain exactly one space".to_string(),
                ));
            }
            found_space = true;
            continue;
        }
        return Err(KeeperError::Validation(format!(
            "card owner contains invalid character: {c:?}"
        )));
    }

    if !found_space {
        return Err(KeeperError::Validation(
            "card owner must contain a space between first and last name".to_string(),
        ));
    }

    Ok(owner.to_string())
}

fn validate_cvv(cvv: &str) -> Result<String, KeeperError> {
    if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(KeeperError::Validation(
            "cvv must be exactly 3 digits".to_string(),
        ));
    }

    Ok(cvv.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_card() {
        let card = BankCardPlaintext::parse("1234 1234 1234 1234", "09/27", "JANE DOE", "123").unwrap();
        assert_eq!(card.number, "1234123412341234");
        assert_eq!(card.owner, "JANE DOE");
        assert_eq!(card.cvv, "123");
    }

    #[test]
    fn rejects_short_number() {
        assert!(BankCardPlaintext::parse("1234", "09/27", "JANE DOE", "123").is_err());
    }

    #[test]
    fn rejects_owner_without_space() {
        assert!(BankCardPlaintext::parse("1234123412341234", "09/27", "JANEDOE", "123").is_err());
    }

    #[test]
    fn rejects_owner_with_double_space() {
        assert!(BankCardPlaintext::parse("1234123412341234", "09/27", "JANE  DOE", "123").is_err());
    }

    #[test]
    fn rejects_bad_cvv() {
        assert!(BankCardPlaintext::parse("1234123412341234", "09/27", "JANE DOE", "12").is_err());
        assert!(BankCardPlaintext::parse("1234123412341234", "09/27", "JANE DOE", "1a3").is_err());
    }

    #[test]
    fn rejects_bad_expiry() {
        assert!(BankCardPlaintext::parse("1234123412341234", "2027-09", "JANE DOE", "123").is_err());
    }
}
