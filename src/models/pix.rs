use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyType {
    Cpf,
    Email,
    Phone,
}

impl PixKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyType::Cpf => "cpf",
            PixKeyType::Email => "email",
            PixKeyType::Phone => "phone",
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixKeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpf" => Ok(PixKeyType::Cpf),
            "email" => Ok(PixKeyType::Email),
            "phone" => Ok(PixKeyType::Phone),
            other => Err(format!("Unknown PIX key type: {}", other)),
        }
    }
}
