use std::str::FromStr;

use serde::{de, Deserialize, Serialize};

/// The longest address accepted from the contact form.
pub const EMAIL_ADDRESS_MAX_CHARS: usize = 320;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(pub lettre::Address);

/// An address with an optional display name, e.g. `"Jo <jo@example.com>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddressWithName(pub lettre::message::Mailbox);

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer)?
                    .parse()
                    .map_err(de::Error::custom)
            }
        }
    };
}

string_serde!(EmailAddress);
string_serde!(EmailAddressWithName);

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    pub fn with_name(self, name: String) -> EmailAddressWithName {
        EmailAddressWithName(lettre::message::Mailbox {
            name: Some(name),
            email: self.0,
        })
    }
}

impl EmailAddressWithName {
    pub fn into_email_address(self) -> EmailAddress {
        EmailAddress(self.0.email)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for EmailAddressWithName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EmailAddress {
    type Err = <lettre::Address as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl FromStr for EmailAddressWithName {
    type Err = <lettre::message::Mailbox as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = <Self as FromStr>::Err;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<&str> for EmailAddressWithName {
    type Error = <Self as FromStr>::Err;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mailbox_variants() {
        let bare: EmailAddressWithName = "jo@example.com".parse().unwrap();
        assert_eq!(bare.0.name, None);

        let named: EmailAddressWithName = "Jo Dev <jo@example.com>".parse().unwrap();
        assert_eq!(named.0.name.as_deref(), Some("Jo Dev"));
        assert_eq!(named.into_email_address().as_str(), "jo@example.com");

        assert!("not an address".parse::<EmailAddress>().is_err());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let address: EmailAddressWithName =
            serde_json::from_value(serde_json::json!("Jo <jo@example.com>")).unwrap();
        let value = serde_json::to_value(&address).unwrap();
        let parsed: EmailAddressWithName = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, address);
    }
}
